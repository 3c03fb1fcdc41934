// src/services/unidade_service.rs

use sqlx::PgPool;

use crate::{
    common::error::{AppError, Resource},
    db::{OrganizationRepository, UnidadeRepository},
    models::{
        auth::Claims,
        organization::{Unidade, UpdateUnidadePayload},
    },
};

/// Cota do plano: com `current` unidades, cabe mais uma? `None` = sem limite.
pub fn check_unit_quota(current: i64, limit: Option<i32>) -> Result<(), AppError> {
    match limit {
        Some(limit) if current >= i64::from(limit) => Err(AppError::UnitLimitReached(limit)),
        _ => Ok(()),
    }
}

#[derive(Clone)]
pub struct UnidadeService {
    unidade_repo: UnidadeRepository,
    org_repo: OrganizationRepository,
    pool: PgPool,
}

impl UnidadeService {
    pub fn new(unidade_repo: UnidadeRepository, org_repo: OrganizationRepository, pool: PgPool) -> Self {
        Self { unidade_repo, org_repo, pool }
    }

    /// O PAI vê todas as unidades; o FILHO só as que tem no banco hoje.
    pub async fn list(&self, claims: &Claims) -> Result<Vec<Unidade>, AppError> {
        let unidades = self.unidade_repo.list_by_org(claims.org_id).await?;
        if claims.is_owner() {
            return Ok(unidades);
        }

        let permitidas = self.unidade_repo.list_for_user(&self.pool, claims.sub).await?;
        Ok(unidades
            .into_iter()
            .filter(|u| permitidas.iter().any(|p| p.id == u.id))
            .collect())
    }

    // A linha da organização fica travada durante a contagem, então duas
    // criações simultâneas não passam juntas do limite.
    pub async fn create(&self, org_id: i32, name: &str) -> Result<Unidade, AppError> {
        let mut tx = self.pool.begin().await?;

        let org = self
            .org_repo
            .lock_for_update(&mut *tx, org_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Organization))?;

        let current = self.unidade_repo.count_by_org(&mut *tx, org_id).await?;
        check_unit_quota(current, org.unidade_limit)?;

        let unidade = self.unidade_repo.create(&mut *tx, org_id, name).await?;
        tx.commit().await?;

        tracing::info!(org_id, unidade_id = unidade.id, "Unidade criada");
        Ok(unidade)
    }

    pub async fn update(
        &self,
        org_id: i32,
        id: i32,
        payload: &UpdateUnidadePayload,
    ) -> Result<Unidade, AppError> {
        let unidade = match &payload.name {
            Some(name) => self.unidade_repo.rename(id, org_id, name).await?,
            None => self.unidade_repo.find(id, org_id).await?,
        };
        unidade.ok_or(AppError::NotFound(Resource::Unidade))
    }

    pub async fn delete(&self, org_id: i32, id: i32) -> Result<(), AppError> {
        if self.unidade_repo.delete(id, org_id).await? == 0 {
            return Err(AppError::NotFound(Resource::Unidade));
        }
        tracing::info!(org_id, unidade_id = id, "Unidade removida");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_quota_is_allowed() {
        assert!(check_unit_quota(0, Some(1)).is_ok());
        assert!(check_unit_quota(2, Some(3)).is_ok());
    }

    #[test]
    fn at_or_above_quota_is_a_conflict() {
        assert!(matches!(check_unit_quota(1, Some(1)), Err(AppError::UnitLimitReached(1))));
        assert!(matches!(check_unit_quota(5, Some(3)), Err(AppError::UnitLimitReached(3))));
        let err = check_unit_quota(2, Some(2)).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
    }

    #[test]
    fn unbounded_plan_never_hits_the_quota() {
        assert!(check_unit_quota(1_000, None).is_ok());
    }

    fn service(pool: &PgPool) -> UnidadeService {
        UnidadeService::new(
            UnidadeRepository::new(pool.clone()),
            OrganizationRepository::new(pool.clone()),
            pool.clone(),
        )
    }

    async fn set_limit(pool: &PgPool, org_id: i32, limit: Option<i32>) {
        sqlx::query("UPDATE organizations SET unidade_limit = $2 WHERE id = $1")
            .bind(org_id)
            .bind(limit)
            .execute(pool)
            .await
            .unwrap();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn creates_units_until_the_plan_limit(pool: PgPool) {
        let org = OrganizationRepository::new(pool.clone())
            .create(&pool, "Padaria Central")
            .await
            .unwrap();
        set_limit(&pool, org.id, Some(2)).await;
        let service = service(&pool);

        service.create(org.id, "Matriz").await.unwrap();
        service.create(org.id, "Filial Centro").await.unwrap();
        assert_eq!(service.unidade_repo.count_by_org(&pool, org.id).await.unwrap(), 2);

        let err = service.create(org.id, "Filial Praia").await.unwrap_err();
        assert!(matches!(err, AppError::UnitLimitReached(2)));
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);
        assert_eq!(service.unidade_repo.count_by_org(&pool, org.id).await.unwrap(), 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn unbounded_plan_keeps_creating(pool: PgPool) {
        let org = OrganizationRepository::new(pool.clone())
            .create(&pool, "Rede Imperial")
            .await
            .unwrap();
        set_limit(&pool, org.id, None).await;
        let service = service(&pool);

        for name in ["Matriz", "Filial 1", "Filial 2", "Filial 3"] {
            service.create(org.id, name).await.unwrap();
        }
        assert_eq!(service.unidade_repo.count_by_org(&pool, org.id).await.unwrap(), 4);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn missing_organization_is_not_found(pool: PgPool) {
        let err = service(&pool).create(9_999, "Matriz").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(Resource::Organization)));
    }
}
