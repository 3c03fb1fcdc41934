use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;

use crate::middleware::i18n::Locale;

// Entidades que podem "não existir" (ou estar fora do tenant do usuário)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Organization,
    Unidade,
    User,
    ChildUser,
    Insumo,
    Receita,
    FechamentoCaixa,
    Despesa,
    Pagamento,
}

impl Resource {
    fn label(&self, lang: &str) -> &'static str {
        let en = lang == "en";
        match self {
            Resource::Organization => if en { "Organization" } else { "Organização" },
            Resource::Unidade => if en { "Unit" } else { "Unidade" },
            Resource::User => if en { "User" } else { "Usuário" },
            Resource::ChildUser => if en { "Sub-user" } else { "Usuário filho" },
            Resource::Insumo => if en { "Ingredient" } else { "Insumo" },
            Resource::Receita => if en { "Recipe" } else { "Receita" },
            Resource::FechamentoCaixa => if en { "Cash closing" } else { "Fechamento de caixa" },
            Resource::Despesa => if en { "Expense" } else { "Despesa" },
            Resource::Pagamento => if en { "Payment" } else { "Pagamento" },
        }
    }
}

// Nosso tipo de erro, agora com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Nome de usuário já existe")]
    UsernameAlreadyExists,

    #[error("Limite de {0} unidades atingido")]
    UnitLimitReached(i32),

    #[error("Registro em uso: {0}")]
    ResourceInUse(String),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Operação exclusiva do usuário principal")]
    OwnerOnly,

    #[error("Sem acesso à página '{0}'")]
    PageForbidden(String),

    #[error("Sem acesso à unidade {0}")]
    UnitForbidden(i32),

    #[error("Assinatura inativa")]
    SubscriptionRequired,

    #[error("Assinatura ainda não está ativa")]
    SubscriptionInactive,

    #[error("{0:?} não encontrado(a)")]
    NotFound(Resource),

    #[error("Parâmetro inválido: {0}")]
    InvalidParameter(String),

    #[error("Webhook rejeitado: {0}")]
    WebhookRejected(String),

    #[error("Configuração ausente: {0}")]
    MissingConfiguration(&'static str),

    #[error("Erro no provedor de pagamentos: {0}")]
    PaymentProvider(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    // Variante para erros de banco de dados (exemplo com sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O corpo de erro que de fato sai na resposta HTTP
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self { status, error: error.into(), details: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidParameter(_)
            | AppError::WebhookRejected(_) => StatusCode::BAD_REQUEST,

            AppError::EmailAlreadyExists
            | AppError::UsernameAlreadyExists
            | AppError::UnitLimitReached(_)
            | AppError::ResourceInUse(_) => StatusCode::CONFLICT,

            AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::OwnerOnly
            | AppError::PageForbidden(_)
            | AppError::UnitForbidden(_)
            | AppError::SubscriptionRequired
            | AppError::SubscriptionInactive => StatusCode::UNAUTHORIZED,

            AppError::NotFound(_) => StatusCode::NOT_FOUND,

            AppError::MissingConfiguration(_)
            | AppError::PaymentProvider(_)
            | AppError::FontNotFound(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de domínio na resposta localizada (pt por padrão, en se pedido).
    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let en = locale.is_english();
        let status = self.status_code();

        let message: String = match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(m) => m.to_string(),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let error = if en { "One or more fields are invalid." } else { "Um ou mais campos são inválidos." };
                return ApiError {
                    status,
                    error: error.to_string(),
                    details: Some(json!(details)),
                };
            }
            AppError::EmailAlreadyExists => {
                if en { "This e-mail is already in use.".into() } else { "Este e-mail já está em uso.".into() }
            }
            AppError::UsernameAlreadyExists => {
                if en { "This username is already in use.".into() } else { "Este nome de usuário já está em uso.".into() }
            }
            AppError::UnitLimitReached(limit) => {
                if en {
                    format!("You reached your plan's limit of {} units. Please upgrade to add more.", limit)
                } else {
                    format!("Você atingiu o limite de {} unidades do seu plano. Para adicionar mais, por favor, faça um upgrade.", limit)
                }
            }
            AppError::ResourceInUse(what) => {
                if en { format!("{} is still in use and cannot be removed.", what) } else { format!("{} ainda está em uso e não pode ser removido.", what) }
            }
            AppError::InvalidCredentials => {
                if en { "Invalid login or password.".into() } else { "Login ou senha inválidos.".into() }
            }
            AppError::InvalidToken => {
                if en { "Missing or invalid authentication token.".into() } else { "Token de autenticação inválido ou ausente.".into() }
            }
            AppError::OwnerOnly => {
                if en { "Only the main account can perform this action.".into() } else { "Apenas o usuário principal pode realizar esta ação.".into() }
            }
            AppError::PageForbidden(page) => {
                if en { format!("You do not have access to the '{}' page.", page) } else { format!("Você não tem acesso à página '{}'.", page) }
            }
            AppError::UnitForbidden(_) => {
                if en { "You do not have access to this unit.".into() } else { "Você não tem permissão para acessar esta unidade.".into() }
            }
            AppError::SubscriptionRequired => {
                if en { "An active subscription is required.".into() } else { "É necessária uma assinatura ativa.".into() }
            }
            AppError::SubscriptionInactive => {
                if en {
                    "Subscription is not active yet. Waiting for payment confirmation.".into()
                } else {
                    "Assinatura ainda não está ativa. Aguardando confirmação do pagamento.".into()
                }
            }
            AppError::NotFound(resource) => {
                if en {
                    format!("{} not found.", resource.label("en"))
                } else {
                    format!("{} não encontrado(a).", resource.label("pt"))
                }
            }
            AppError::InvalidParameter(msg) => msg.clone(),
            AppError::WebhookRejected(msg) => format!("Webhook Error: {}", msg),

            // Todos os outros erros viram 500. Logamos o detalhe, mas não o devolvemos.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                if en { "An unexpected error occurred.".into() } else { "Ocorreu um erro inesperado.".into() }
            }
        };

        ApiError::new(status, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}

// Traduz violações de unicidade/FK do Postgres nos nossos erros de domínio.
pub fn map_constraint_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("users_email_key") => AppError::EmailAlreadyExists,
                Some("users_username_key") => AppError::UsernameAlreadyExists,
                _ => AppError::DatabaseError(e),
            };
        }
        if db_err.is_foreign_key_violation() {
            return match db_err.constraint() {
                Some("receita_insumos_insumo_id_fkey") => {
                    AppError::ResourceInUse("Insumo".to_string())
                }
                _ => AppError::DatabaseError(e),
            };
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn taxonomy_maps_to_expected_status() {
        assert_eq!(AppError::UnitLimitReached(2).status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::EmailAlreadyExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::OwnerOnly.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::SubscriptionInactive.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound(Resource::Receita).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::MissingConfiguration("STRIPE_API_KEY").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_follow_locale() {
        let pt = AppError::NotFound(Resource::Receita).to_api_error(&Locale("pt".into()));
        assert_eq!(pt.error, "Receita não encontrado(a).");

        let en = AppError::NotFound(Resource::Receita).to_api_error(&Locale("en".into()));
        assert_eq!(en.error, "Recipe not found.");
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = AppError::PaymentProvider("sk_live_segredo vazou".into());
        let api = err.to_api_error(&Locale::default());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("sk_live"));
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("length");
        err.message = Some("O nome é obrigatório.".into());
        errors.add("nome", err);

        let api = AppError::ValidationError(errors).to_api_error(&Locale::default());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("deveria ter detalhes");
        assert_eq!(details["nome"][0], "O nome é obrigatório.");
    }
}
