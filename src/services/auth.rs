// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;

use crate::{
    common::error::{AppError, Resource},
    db::{OrganizationRepository, UnidadeRepository, UserRepository},
    models::{
        auth::{
            ChildUserDetail, ChildUserSummary, Claims, CreateChildUserPayload, Page,
            RegisterUserPayload, UnidadeRef, UpdateChildUserPayload, UpdatePermissionsPayload,
            User, UserRole,
        },
        organization::{Organization, SubscriptionStatus},
    },
    services::stripe::StripeClient,
};

const BCRYPT_COST: u32 = 10;
const FIRST_UNIT_NAME: &str = "Unidade Principal";

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    org_repo: OrganizationRepository,
    unidade_repo: UnidadeRepository,
    stripe: StripeClient,
    jwt_secret: String,
    jwt_expiration_hours: i64,
    pool: PgPool,
}

async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, BCRYPT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

/// Monta as claims a partir do estado atual do banco.
pub fn build_claims(
    user: &User,
    org: &Organization,
    unidades: Vec<UnidadeRef>,
    permitidas: Vec<UnidadeRef>,
    now: DateTime<Utc>,
    expiration_hours: i64,
) -> Claims {
    // O PAI enxerga tudo; o FILHO só o que foi liberado
    let (unidades_permitidas, allowed_pages) = match user.role {
        UserRole::Pai => (unidades.clone(), Page::all_ids()),
        UserRole::Filho => (permitidas, user.allowed_pages.clone()),
    };

    Claims {
        sub: user.id,
        email: user.email.clone(),
        username: user.username.clone(),
        name: user.name.clone(),
        company_name: user.company_name.clone(),
        role: user.role,
        org_id: org.id,
        unidades,
        unidades_permitidas,
        allowed_pages,
        subscription_status: org.subscription_status,
        unidade_limit: org.unidade_limit,
        plan_type: org.plan_type.clone(),
        exp: (now + Duration::hours(expiration_hours)).timestamp() as usize,
        iat: now.timestamp() as usize,
    }
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        org_repo: OrganizationRepository,
        unidade_repo: UnidadeRepository,
        stripe: StripeClient,
        jwt_secret: String,
        jwt_expiration_hours: i64,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, org_repo, unidade_repo, stripe, jwt_secret, jwt_expiration_hours, pool }
    }

    // Cadastro: organização + primeira unidade + usuário PAI numa única transação.
    pub async fn register(&self, payload: &RegisterUserPayload) -> Result<String, AppError> {
        let hashed_password = hash_password(&payload.password).await?;

        let mut tx = self.pool.begin().await?;

        let org = self.org_repo.create(&mut *tx, &payload.company_name).await?;
        self.unidade_repo.create(&mut *tx, org.id, FIRST_UNIT_NAME).await?;
        let user = self
            .user_repo
            .create_owner(
                &mut *tx,
                &payload.email,
                &hashed_password,
                &payload.name,
                &payload.company_name,
                org.id,
                &Page::all_ids(),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(user_id = user.id, org_id = org.id, "Nova organização cadastrada");
        self.issue_token(&user, &org).await
    }

    pub async fn login(&self, login: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_login(login)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let org = self.find_org(user.organization_id).await?;
        self.issue_token(&user, &org).await
    }

    /// Valida assinatura e expiração. Não consulta o banco.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    /// Reemite o token com o estado atual do banco. Só com assinatura ACTIVE.
    pub async fn refresh_token(&self, claims: &Claims) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;
        let org = self.find_org(user.organization_id).await?;

        if org.subscription_status != SubscriptionStatus::Active {
            tracing::info!(org_id = org.id, status = ?org.subscription_status, "Refresh negado: assinatura inativa");
            return Err(AppError::SubscriptionInactive);
        }

        self.issue_token(&user, &org).await
    }

    /// Volta do checkout: confere que a sessão é desta organização e reemite.
    pub async fn refresh_by_session(&self, claims: &Claims, session_id: &str) -> Result<String, AppError> {
        let session = self.stripe.retrieve_checkout_session(session_id).await?;

        let session_org = session
            .metadata
            .get("orgId")
            .and_then(|v| v.parse::<i32>().ok());

        if session_org != Some(claims.org_id) {
            tracing::warn!(session_id, org_id = claims.org_id, "Sessão de checkout de outra organização");
            return Err(AppError::InvalidToken);
        }

        self.refresh_token(claims).await
    }

    async fn find_org(&self, org_id: i32) -> Result<Organization, AppError> {
        self.org_repo
            .find_by_id(org_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Organization))
    }

    async fn issue_token(&self, user: &User, org: &Organization) -> Result<String, AppError> {
        let unidades: Vec<UnidadeRef> = self
            .unidade_repo
            .list_by_org(org.id)
            .await?
            .into_iter()
            .map(UnidadeRef::from)
            .collect();

        let permitidas = match user.role {
            UserRole::Pai => Vec::new(),
            UserRole::Filho => self.unidade_repo.list_for_user(&self.pool, user.id).await?,
        };

        let claims = build_claims(user, org, unidades, permitidas, Utc::now(), self.jwt_expiration_hours);

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    // ---
    // Usuários FILHO
    // ---

    pub async fn create_child(
        &self,
        pai_id: i32,
        payload: &CreateChildUserPayload,
    ) -> Result<ChildUserSummary, AppError> {
        let pai = self
            .user_repo
            .find_by_id(pai_id)
            .await?
            .ok_or(AppError::NotFound(Resource::User))?;

        let hashed_password = hash_password(&payload.password).await?;
        let child = self
            .user_repo
            .create_child(&pai, &payload.username, &payload.name, &hashed_password)
            .await?;

        Ok(ChildUserSummary {
            id: child.id,
            username: child.username,
            name: child.name,
            created_at: child.created_at,
        })
    }

    pub async fn list_children(&self, pai_id: i32) -> Result<Vec<ChildUserSummary>, AppError> {
        self.user_repo.list_children(pai_id).await
    }

    pub async fn get_child(&self, pai_id: i32, child_id: i32) -> Result<ChildUserDetail, AppError> {
        let child = self
            .user_repo
            .find_child(pai_id, child_id)
            .await?
            .ok_or(AppError::NotFound(Resource::ChildUser))?;

        let unidades = self.unidade_repo.list_for_user(&self.pool, child.id).await?;

        Ok(ChildUserDetail {
            id: child.id,
            username: child.username,
            name: child.name,
            created_at: child.created_at,
            unidades_permitidas: unidades,
            allowed_pages: child.allowed_pages,
        })
    }

    pub async fn update_child(
        &self,
        pai_id: i32,
        child_id: i32,
        payload: &UpdateChildUserPayload,
    ) -> Result<ChildUserSummary, AppError> {
        let hashed_password = match &payload.password {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        self.user_repo
            .update_child(pai_id, child_id, &payload.name, hashed_password.as_deref())
            .await?
            .ok_or(AppError::NotFound(Resource::ChildUser))
    }

    pub async fn delete_child(&self, pai_id: i32, child_id: i32) -> Result<(), AppError> {
        let deleted = self.user_repo.delete_child(pai_id, child_id).await?;
        if deleted == 0 {
            return Err(AppError::NotFound(Resource::ChildUser));
        }
        Ok(())
    }

    /// Substitui as unidades e as páginas liberadas de um FILHO.
    /// Sem `allowedPages`, o filho fica só com o caixa.
    pub async fn update_permissions(
        &self,
        pai_id: i32,
        org_id: i32,
        child_id: i32,
        payload: &UpdatePermissionsPayload,
    ) -> Result<ChildUserDetail, AppError> {
        let child = self
            .user_repo
            .find_child(pai_id, child_id)
            .await?
            .ok_or(AppError::NotFound(Resource::ChildUser))?;

        let pages = payload
            .allowed_pages
            .clone()
            .unwrap_or_else(|| vec![Page::Caixa.as_str().to_string()]);
        let unidade_ids = payload.unidade_ids.clone().unwrap_or_default();

        let mut tx = self.pool.begin().await?;

        self.user_repo.clear_unidades(&mut *tx, child.id).await?;
        if !unidade_ids.is_empty() {
            let granted = self
                .user_repo
                .grant_unidades(&mut *tx, child.id, org_id, &unidade_ids)
                .await?;
            if granted as usize != unidade_ids.len() {
                tracing::debug!(child_id, pedidas = unidade_ids.len(), granted, "Unidades fora da organização ignoradas");
            }
        }
        self.user_repo.set_allowed_pages(&mut *tx, child.id, &pages).await?;

        tx.commit().await?;

        self.get_child(pai_id, child_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org(status: SubscriptionStatus) -> Organization {
        Organization {
            id: 7,
            name: "Padaria".into(),
            plan_type: "Elite".into(),
            unidade_limit: Some(2),
            subscription_status: status,
            stripe_customer_id: None,
            subscription_id: None,
            current_period_end: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn user(role: UserRole, pages: &[&str]) -> User {
        User {
            id: 3,
            email: None,
            username: Some("balcao".into()),
            password_hash: String::new(),
            name: "Balcão".into(),
            company_name: Some("Padaria".into()),
            role,
            organization_id: 7,
            pai_id: None,
            allowed_pages: pages.iter().map(|p| p.to_string()).collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn units() -> Vec<UnidadeRef> {
        vec![
            UnidadeRef { id: 1, name: "Unidade Principal".into() },
            UnidadeRef { id: 2, name: "Filial".into() },
        ]
    }

    #[test]
    fn owner_claims_cover_every_unit_and_page() {
        let claims = build_claims(
            &user(UserRole::Pai, &[]),
            &org(SubscriptionStatus::Active),
            units(),
            vec![],
            Utc::now(),
            12,
        );
        assert_eq!(claims.unidades_permitidas, units());
        assert_eq!(claims.allowed_pages.len(), Page::ALL.len());
        assert_eq!(claims.unidade_limit, Some(2));
    }

    #[test]
    fn child_claims_only_carry_assigned_access() {
        let permitidas = vec![units()[1].clone()];
        let claims = build_claims(
            &user(UserRole::Filho, &["receitas"]),
            &org(SubscriptionStatus::PastDue),
            units(),
            permitidas.clone(),
            Utc::now(),
            12,
        );
        assert_eq!(claims.unidades.len(), 2);
        assert_eq!(claims.unidades_permitidas, permitidas);
        assert_eq!(claims.allowed_pages, vec!["receitas".to_string()]);
        assert_eq!(claims.subscription_status, SubscriptionStatus::PastDue);
    }

    #[test]
    fn expiration_follows_configured_window() {
        let now = Utc::now();
        let claims = build_claims(
            &user(UserRole::Pai, &[]),
            &org(SubscriptionStatus::Active),
            units(),
            vec![],
            now,
            12,
        );
        assert_eq!(claims.exp - claims.iat, 12 * 3600);
    }

    #[tokio::test]
    async fn token_round_trip_and_tampering() {
        let service = AuthService::new(
            UserRepository::new(lazy_pool()),
            OrganizationRepository::new(lazy_pool()),
            UnidadeRepository::new(lazy_pool()),
            StripeClient::new(Default::default()),
            "segredo".into(),
            12,
            lazy_pool(),
        );
        let claims = build_claims(
            &user(UserRole::Pai, &[]),
            &org(SubscriptionStatus::Active),
            units(),
            vec![],
            Utc::now(),
            12,
        );
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"segredo")).unwrap();
        assert_eq!(service.validate_token(&token).unwrap().org_id, 7);

        let forged = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"outro")).unwrap();
        assert!(matches!(service.validate_token(&forged), Err(AppError::InvalidToken)));
    }

    fn lazy_pool() -> PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/sabio_forno_test")
            .unwrap()
    }
}
