// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, str::FromStr, time::Duration};

use crate::{
    db::{
        BillingRepository, CaixaRepository, DashboardRepository, InsumoRepository,
        OrganizationRepository, ReceitaRepository, UnidadeRepository, UserRepository,
    },
    services::{
        auth::AuthService,
        billing_service::BillingService,
        caixa_service::CaixaService,
        dashboard_service::DashboardService,
        document_service::{DocumentService, PdfSettings},
        insumo_service::InsumoService,
        pagamento_service::PagamentoService,
        receita_service::ReceitaService,
        stripe::{StripeClient, StripeSettings},
        unidade_service::UnidadeService,
    },
};

// Configuração lida do ambiente (.env incluso)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server_addr: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub client_url: String,
    pub stripe: StripeSettings,
    pub pdf: PdfSettings,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de qualquer fonte chave/valor.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        // Valores vazios contam como ausentes
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let required = |key: &'static str| get(key).with_context(|| format!("{} deve ser definida", key));

        fn parsed<T: FromStr>(raw: Option<String>, key: &str, default: T) -> anyhow::Result<T> {
            match raw {
                Some(v) => v
                    .parse()
                    .map_err(|_| anyhow::anyhow!("{} tem um valor inválido: '{}'", key, v)),
                None => Ok(default),
            }
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parsed(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", 5)?,
            server_addr: get("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration_hours: parsed(get("JWT_EXPIRATION_HOURS"), "JWT_EXPIRATION_HOURS", 12)?,
            client_url: get("CLIENT_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_string())
                .trim_end_matches('/')
                .to_string(),
            stripe: StripeSettings {
                api_key: get("STRIPE_API_KEY"),
                webhook_secret: get("STRIPE_WEBHOOK_SECRET"),
                pro_price_id: get("STRIPE_PRO_PRICE_ID"),
                elite_price_id: get("STRIPE_ELITE_PRICE_ID"),
                master_price_id: get("STRIPE_MASTER_PRICE_ID"),
            },
            pdf: PdfSettings {
                fonts_dir: get("PDF_FONTS_DIR").unwrap_or_else(|| "./fonts".to_string()),
                font_family: get("PDF_FONT_FAMILY").unwrap_or_else(|| "Roboto".to_string()),
            },
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub unidade_repo: UnidadeRepository,
    pub auth_service: AuthService,
    pub unidade_service: UnidadeService,
    pub insumo_service: InsumoService,
    pub receita_service: ReceitaService,
    pub caixa_service: CaixaService,
    pub pagamento_service: PagamentoService,
    pub dashboard_service: DashboardService,
    pub billing_service: BillingService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(config, db_pool))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(config: &Config, db_pool: PgPool) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let org_repo = OrganizationRepository::new(db_pool.clone());
        let unidade_repo = UnidadeRepository::new(db_pool.clone());
        let insumo_repo = InsumoRepository::new(db_pool.clone());
        let receita_repo = ReceitaRepository::new(db_pool.clone());
        let caixa_repo = CaixaRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new(db_pool.clone());
        let billing_repo = BillingRepository::new();

        let stripe = StripeClient::new(config.stripe.clone());

        let auth_service = AuthService::new(
            user_repo,
            org_repo.clone(),
            unidade_repo.clone(),
            stripe.clone(),
            config.jwt_secret.clone(),
            config.jwt_expiration_hours,
            db_pool.clone(),
        );
        let unidade_service = UnidadeService::new(unidade_repo.clone(), org_repo.clone(), db_pool.clone());
        let insumo_service = InsumoService::new(insumo_repo.clone());
        let receita_service = ReceitaService::new(receita_repo, insumo_repo, db_pool.clone());
        let caixa_service = CaixaService::new(caixa_repo.clone());
        let pagamento_service = PagamentoService::new(caixa_repo, db_pool.clone());
        let dashboard_service = DashboardService::new(dashboard_repo);
        let billing_service = BillingService::new(
            stripe,
            org_repo,
            billing_repo,
            config.client_url.clone(),
            db_pool.clone(),
        );
        let document_service = DocumentService::new(config.pdf.clone());

        Self {
            db_pool,
            unidade_repo,
            auth_service,
            unidade_service,
            insumo_service,
            receita_service,
            caixa_service,
            pagamento_service,
            dashboard_service,
            billing_service,
            document_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_fill_optional_values() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/sabio"),
            ("JWT_SECRET", "segredo"),
        ]))
        .unwrap();
        assert_eq!(config.jwt_expiration_hours, 12);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.server_addr, "0.0.0.0:3000");
        assert_eq!(config.pdf.font_family, "Roboto");
        assert!(config.stripe.api_key.is_none());
    }

    #[test]
    fn missing_required_values_fail() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn blank_and_invalid_values() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("STRIPE_API_KEY", "  "),
            ("CLIENT_URL", "https://app.sabioforno.com.br/"),
        ]))
        .unwrap();
        assert!(config.stripe.api_key.is_none());
        assert_eq!(config.client_url, "https://app.sabioforno.com.br");

        assert!(Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("JWT_EXPIRATION_HOURS", "doze"),
        ]))
        .is_err());
    }
}
