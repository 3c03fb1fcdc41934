// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::organization::{SubscriptionStatus, Unidade};

// PAI = dono da organização, FILHO = sub-usuário criado por ele
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Pai,
    Filho,
}

// ---
// Páginas do front-end (os "módulos" que podem ser liberados para um FILHO)
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Dashboard,
    Caixa,
    Insumos,
    Receitas,
    Custos,
    CustosOperacionais,
    Conta,
    Planos,
}

impl Page {
    pub const ALL: [Page; 8] = [
        Page::Dashboard,
        Page::Caixa,
        Page::Insumos,
        Page::Receitas,
        Page::Custos,
        Page::CustosOperacionais,
        Page::Conta,
        Page::Planos,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Dashboard => "dashboard",
            Page::Caixa => "caixa",
            Page::Insumos => "insumos",
            Page::Receitas => "receitas",
            Page::Custos => "custos",
            Page::CustosOperacionais => "custos-operacionais",
            Page::Conta => "conta",
            Page::Planos => "planos",
        }
    }

    pub fn parse(raw: &str) -> Option<Page> {
        Page::ALL.into_iter().find(|p| p.as_str() == raw)
    }

    /// Páginas de gestão da assinatura, liberadas mesmo sem pagamento.
    pub fn is_billing_management(&self) -> bool {
        matches!(self, Page::Conta | Page::Planos)
    }

    pub fn all_ids() -> Vec<String> {
        Page::ALL.iter().map(|p| p.as_str().to_string()).collect()
    }
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub email: Option<String>,
    pub username: Option<String>,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub name: String,
    pub company_name: Option<String>,
    pub role: UserRole,
    pub organization_id: i32,
    pub pai_id: Option<i32>,
    pub allowed_pages: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Listagem enxuta dos filhos
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChildUserSummary {
    pub id: i32,
    pub username: Option<String>,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// Detalhe de um filho com suas permissões
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChildUserDetail {
    pub id: i32,
    pub username: Option<String>,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub unidades_permitidas: Vec<UnidadeRef>,
    pub allowed_pages: Vec<String>,
}

// Referência curta de unidade (id + nome) embutida no token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UnidadeRef {
    pub id: i32,
    pub name: String,
}

impl From<Unidade> for UnidadeRef {
    fn from(u: Unidade) -> Self {
        Self { id: u.id, name: u.name }
    }
}

// Dados para registro de um novo usuário (o dono + a organização)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserPayload {
    #[validate(email(message = "Por favor, forneça um email válido."))]
    pub email: String,
    #[validate(length(min = 8, message = "A senha deve ter no mínimo 8 caracteres."))]
    pub password: String,
    #[validate(length(min = 1, message = "O nome não pode estar vazio."))]
    pub name: String,
    #[validate(length(min = 1, message = "O nome da empresa não pode estar vazio."))]
    pub company_name: String,
}

// Dados para login. O campo `email` aceita e-mail OU nome de usuário.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(length(min = 1, message = "O email ou nome de usuário não pode estar vazio."))]
    pub email: String,
    #[validate(length(min = 1, message = "A senha não pode estar vazia."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateChildUserPayload {
    #[validate(length(min = 1, message = "O nome de usuário não pode estar vazio."))]
    pub username: String,
    #[validate(length(min = 1, message = "O nome não pode estar vazio."))]
    pub name: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateChildUserPayload {
    #[validate(length(min = 1, message = "O nome não pode estar vazio."))]
    pub name: String,
    // A senha só é enviada se o Pai quiser redefini-la
    #[validate(length(min = 6, message = "A nova senha deve ter no mínimo 6 caracteres."))]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePermissionsPayload {
    pub unidade_ids: Option<Vec<i32>>,
    #[validate(custom(function = "validate_page_ids"))]
    pub allowed_pages: Option<Vec<String>>,
}

fn validate_page_ids(pages: &Vec<String>) -> Result<(), validator::ValidationError> {
    if let Some(bad) = pages.iter().find(|p| Page::parse(p).is_none()) {
        let mut err = validator::ValidationError::new("unknown_page");
        err.message = Some(format!("Página desconhecida: '{}'.", bad).into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionRefreshPayload {
    #[validate(length(min = 1, message = "ID da Sessão não fornecido."))]
    pub session_id: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

// Estrutura de dados ("claims") dentro do JWT.
// É uma fotografia do momento da emissão: mudanças de assinatura ou de
// permissões só aparecem depois de um refresh do token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: i32,
    pub email: Option<String>,
    pub username: Option<String>,
    pub name: String,
    pub company_name: Option<String>,
    pub role: UserRole,
    pub org_id: i32,
    pub unidades: Vec<UnidadeRef>,
    pub unidades_permitidas: Vec<UnidadeRef>,
    pub allowed_pages: Vec<String>,
    pub subscription_status: SubscriptionStatus,
    pub unidade_limit: Option<i32>,
    pub plan_type: String,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn is_owner(&self) -> bool {
        self.role == UserRole::Pai
    }
}
