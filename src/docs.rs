// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(title = "Sábio Forno API", description = "Gestão de padarias: custos, caixa e assinaturas"),
    paths(
        handlers::health,

        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh_token,
        handlers::auth::refresh_token_by_session,

        // --- Sub-usuários ---
        handlers::auth::create_child,
        handlers::auth::list_children,
        handlers::auth::get_child,
        handlers::auth::update_child,
        handlers::auth::delete_child,
        handlers::auth::update_child_permissions,

        // --- Unidades ---
        handlers::unidades::list_unidades,
        handlers::unidades::create_unidade,
        handlers::unidades::update_unidade,
        handlers::unidades::delete_unidade,

        // --- Caixa ---
        handlers::caixa::get_caixa,
        handlers::caixa::update_caixa,
        handlers::caixa::export_caixa_pdf,
        handlers::despesas::create_despesa,
        handlers::despesas::delete_despesa,
        handlers::despesas::despesas_mensais,
        handlers::despesas::export_despesas_pdf,
        handlers::pagamentos::create_pagamento,
        handlers::pagamentos::delete_pagamento,
        handlers::pagamentos::custos_registrados,
        handlers::pagamentos::export_custos_pdf,

        // --- Insumos e Receitas ---
        handlers::insumos::create_insumo,
        handlers::insumos::list_insumos,
        handlers::insumos::get_insumo,
        handlers::insumos::update_insumo,
        handlers::insumos::delete_insumo,
        handlers::receitas::create_receita,
        handlers::receitas::list_receitas,
        handlers::receitas::get_receita,
        handlers::receitas::update_receita,
        handlers::receitas::delete_receita,
        handlers::receitas::export_receita_pdf,

        // --- Dashboard ---
        handlers::dashboard::get_stats,
        handlers::dashboard::get_monthly_summary,

        // --- Billing ---
        handlers::billing::create_checkout_session,
        handlers::billing::stripe_webhook,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::UnidadeRef,
            models::auth::ChildUserSummary,
            models::auth::ChildUserDetail,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::CreateChildUserPayload,
            models::auth::UpdateChildUserPayload,
            models::auth::UpdatePermissionsPayload,
            models::auth::SessionRefreshPayload,
            models::auth::AuthResponse,
            models::auth::MessageResponse,

            // --- Organização ---
            models::organization::SubscriptionStatus,
            models::organization::PlanType,
            models::organization::Organization,
            models::organization::Unidade,
            models::organization::CreateUnidadePayload,
            models::organization::UpdateUnidadePayload,

            // --- Caixa ---
            models::caixa::FechamentoCaixa,
            models::caixa::FechamentoCompleto,
            models::caixa::DespesaDiaria,
            models::caixa::Pagamento,
            models::caixa::StatusPagamento,
            models::caixa::CustoRegistrado,
            models::caixa::DataFechamento,
            models::caixa::DespesaMensal,
            models::caixa::UpdateCaixaPayload,
            models::caixa::CreateDespesaPayload,
            models::caixa::CreatePagamentoPayload,

            // --- Insumos e Receitas ---
            models::insumo::Insumo,
            models::insumo::CreateInsumoPayload,
            models::insumo::UpdateInsumoPayload,
            models::receita::Receita,
            models::receita::ReceitaResumo,
            models::receita::InsumoBase,
            models::receita::InsumoCalculado,
            models::receita::ReceitaDetalhada,
            models::receita::ReceitaInsumoPayload,
            models::receita::CreateReceitaPayload,
            models::receita::UpdateReceitaPayload,

            // --- Dashboard ---
            models::dashboard::DashboardStats,
            models::dashboard::MonthlySummaryItem,

            // --- Billing ---
            models::billing::CreateCheckoutPayload,
            models::billing::CheckoutResponse,
            models::billing::WebhookAck,
        )
    ),
    tags(
        (name = "Health", description = "Verificação de disponibilidade"),
        (name = "Auth", description = "Autenticação, Registro e Sub-usuários"),
        (name = "Unidades", description = "Filiais da Organização"),
        (name = "Caixa", description = "Fechamento Diário"),
        (name = "Despesas", description = "Despesas do Caixa"),
        (name = "Pagamentos", description = "Pagamentos e Custos Registrados"),
        (name = "Insumos", description = "Ingredientes e Preços de Compra"),
        (name = "Receitas", description = "Fichas Técnicas e Precificação"),
        (name = "Dashboard", description = "Indicadores e Gráficos Gerenciais"),
        (name = "Billing", description = "Planos e Assinaturas (Stripe)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/caixa/{data}"));
        assert!(doc.paths.paths.contains_key("/billing/webhook"));
        let components = doc.components.expect("componentes");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
