//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::new(&config).await?;

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let db_pool = app_state.db_pool.clone();
    let app = build_router(app_state);

    let listener = TcpListener::bind(&config.server_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;
    tracing::info!("Servidor encerrado");
    Ok(())
}

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/billing/webhook", post(handlers::billing::stripe_webhook));

    let auth_routes = Router::new()
        .route("/refresh-token", post(handlers::auth::refresh_token))
        .route("/refresh-token/session", post(handlers::auth::refresh_token_by_session))
        .route(
            "/children",
            post(handlers::auth::create_child).get(handlers::auth::list_children),
        )
        .route(
            "/children/{id}",
            get(handlers::auth::get_child)
                .patch(handlers::auth::update_child)
                .delete(handlers::auth::delete_child),
        )
        .route(
            "/children/{id}/permissions",
            patch(handlers::auth::update_child_permissions),
        );

    let unidade_routes = Router::new()
        .route(
            "/",
            get(handlers::unidades::list_unidades).post(handlers::unidades::create_unidade),
        )
        .route(
            "/{id}",
            patch(handlers::unidades::update_unidade).delete(handlers::unidades::delete_unidade),
        );

    let caixa_routes = Router::new()
        .route(
            "/{data}",
            get(handlers::caixa::get_caixa).patch(handlers::caixa::update_caixa),
        )
        .route("/export-pdf/{data}", get(handlers::caixa::export_caixa_pdf));

    let despesa_routes = Router::new()
        .route("/", post(handlers::despesas::create_despesa))
        .route("/{id}", delete(handlers::despesas::delete_despesa))
        .route("/mensal/{ano}/{mes}", get(handlers::despesas::despesas_mensais))
        .route(
            "/mensal/{ano}/{mes}/export-pdf",
            get(handlers::despesas::export_despesas_pdf),
        );

    let pagamento_routes = Router::new()
        .route("/", post(handlers::pagamentos::create_pagamento))
        .route("/{id}", delete(handlers::pagamentos::delete_pagamento))
        .route(
            "/custos-registrados/{ano}/{mes}",
            get(handlers::pagamentos::custos_registrados),
        )
        .route(
            "/custos-registrados/{ano}/{mes}/export-pdf",
            get(handlers::pagamentos::export_custos_pdf),
        );

    let insumo_routes = Router::new()
        .route(
            "/",
            post(handlers::insumos::create_insumo).get(handlers::insumos::list_insumos),
        )
        .route(
            "/{id}",
            get(handlers::insumos::get_insumo)
                .patch(handlers::insumos::update_insumo)
                .delete(handlers::insumos::delete_insumo),
        );

    let receita_routes = Router::new()
        .route(
            "/",
            post(handlers::receitas::create_receita).get(handlers::receitas::list_receitas),
        )
        .route(
            "/{id}",
            get(handlers::receitas::get_receita)
                .patch(handlers::receitas::update_receita)
                .delete(handlers::receitas::delete_receita),
        )
        .route("/{id}/export-pdf", get(handlers::receitas::export_receita_pdf));

    let dashboard_routes = Router::new()
        .route("/stats", get(handlers::dashboard::get_stats))
        .route("/monthly-summary", get(handlers::dashboard::get_monthly_summary));

    let billing_routes = Router::new().route(
        "/create-checkout-session",
        post(handlers::billing::create_checkout_session),
    );

    // Tudo abaixo exige o Bearer
    let protected_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/unidades", unidade_routes)
        .nest("/caixa", caixa_routes)
        .nest("/despesas", despesa_routes)
        .nest("/pagamentos", pagamento_routes)
        .nest("/insumos", insumo_routes)
        .nest("/receitas", receita_routes)
        .nest("/dashboard", dashboard_routes)
        .nest("/billing", billing_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Falha ao escutar o Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Falha ao escutar o SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Sinal de desligamento recebido");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use sqlx::{postgres::PgPoolOptions, PgPool};
    use tower::ServiceExt;

    use crate::{
        db::{OrganizationRepository, UnidadeRepository, UserRepository},
        models::{
            auth::{Claims, UnidadeRef, UserRole},
            organization::SubscriptionStatus,
        },
    };

    const SECRET: &str = "segredo-de-teste";

    fn test_config() -> Config {
        Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/sabio_forno_test".into()),
            "JWT_SECRET" => Some(SECRET.into()),
            _ => None,
        })
        .unwrap()
    }

    fn app() -> Router {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        build_router(AppState::with_pool(&config, pool))
    }

    fn sign(mut claims: Claims) -> String {
        claims.iat = Utc::now().timestamp() as usize;
        claims.exp = claims.iat + 3600;
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();
        format!("Bearer {}", token)
    }

    fn bearer(role: UserRole, status: SubscriptionStatus) -> String {
        sign(crate::middleware::rbac::tests::claims(role, status))
    }

    async fn status_of(request: Request<Body>) -> StatusCode {
        app().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn health_is_public() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let request = Request::get("/insumos").body(Body::empty()).unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sub_user_cannot_create_units() {
        let request = Request::post("/unidades")
            .header(header::AUTHORIZATION, bearer(UserRole::Filho, SubscriptionStatus::Active))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"Filial"}"#))
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sub_user_is_kept_out_of_unassigned_units() {
        let request = Request::get("/caixa/2025-10-01?unidadeId=2")
            .header(header::AUTHORIZATION, bearer(UserRole::Filho, SubscriptionStatus::Active))
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn inactive_owner_is_sent_to_the_plans_page() {
        let request = Request::get("/insumos")
            .header(header::AUTHORIZATION, bearer(UserRole::Pai, SubscriptionStatus::PastDue))
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unit_routes_require_unidade_id() {
        let request = Request::get("/dashboard/stats")
            .header(header::AUTHORIZATION, bearer(UserRole::Pai, SubscriptionStatus::Active))
            .body(Body::empty())
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn webhook_without_signature_is_rejected() {
        let request = Request::post("/billing/webhook")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"id":"evt_1","type":"checkout.session.completed"}"#))
            .unwrap();
        assert_eq!(status_of(request).await, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn stale_token_cannot_reach_an_unassigned_unit(pool: PgPool) {
        let org = OrganizationRepository::new(pool.clone()).create(&pool, "Padaria Central").await.unwrap();
        let unidades = UnidadeRepository::new(pool.clone());
        let matriz = unidades.create(&pool, org.id, "Matriz").await.unwrap();
        let filial = unidades.create(&pool, org.id, "Filial").await.unwrap();

        let users = UserRepository::new(pool.clone());
        let pai = users
            .create_owner(&pool, "dono@padaria.com", "hash", "Dono", "Padaria", org.id, &["caixa".to_string()])
            .await
            .unwrap();
        let filho = users.create_child(&pai, "caixa1", "Operador", "hash").await.unwrap();
        users.grant_unidades(&pool, filho.id, org.id, &[matriz.id]).await.unwrap();

        // Token emitido quando o FILHO ainda tinha as duas unidades
        let mut claims = crate::middleware::rbac::tests::claims(UserRole::Filho, SubscriptionStatus::Active);
        claims.sub = filho.id;
        claims.org_id = org.id;
        claims.unidades_permitidas = vec![UnidadeRef::from(matriz.clone()), UnidadeRef::from(filial.clone())];
        let token = sign(claims);

        let config = test_config();
        let app = build_router(AppState::with_pool(&config, pool));

        let request = |unidade_id: i32| {
            Request::get(format!("/caixa/2025-10-20?unidadeId={unidade_id}"))
                .header(header::AUTHORIZATION, token.clone())
                .body(Body::empty())
                .unwrap()
        };

        let allowed = app.clone().oneshot(request(matriz.id)).await.unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);

        let revoked = app.oneshot(request(filial.id)).await.unwrap();
        assert_eq!(revoked.status(), StatusCode::UNAUTHORIZED);
    }
}
