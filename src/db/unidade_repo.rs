// src/db/unidade_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::{auth::UnidadeRef, organization::Unidade},
};

#[derive(Clone)]
pub struct UnidadeRepository {
    pool: PgPool,
}

impl UnidadeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        organization_id: i32,
        name: &str,
    ) -> Result<Unidade, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let unidade = sqlx::query_as::<_, Unidade>(
            r#"
            INSERT INTO unidades (name, organization_id)
            VALUES ($1, $2)
            RETURNING id, name, organization_id, created_at
            "#,
        )
        .bind(name)
        .bind(organization_id)
        .fetch_one(executor)
        .await?;
        Ok(unidade)
    }

    pub async fn count_by_org<'e, E>(&self, executor: E, organization_id: i32) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM unidades WHERE organization_id = $1")
            .bind(organization_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    pub async fn list_by_org(&self, organization_id: i32) -> Result<Vec<Unidade>, AppError> {
        let unidades = sqlx::query_as::<_, Unidade>(
            r#"
            SELECT id, name, organization_id, created_at
            FROM unidades
            WHERE organization_id = $1
            ORDER BY id
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(unidades)
    }

    /// Unidades que um FILHO pode acessar (tabela-ponte user_unidades).
    pub async fn list_for_user<'e, E>(&self, executor: E, user_id: i32) -> Result<Vec<UnidadeRef>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let unidades = sqlx::query_as::<_, UnidadeRef>(
            r#"
            SELECT u.id, u.name
            FROM unidades u
            JOIN user_unidades uu ON uu.unidade_id = u.id
            WHERE uu.user_id = $1
            ORDER BY u.id
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await?;
        Ok(unidades)
    }

    /// A verificação de isolamento entre organizações.
    pub async fn belongs_to_org(&self, unidade_id: i32, organization_id: i32) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM unidades WHERE id = $1 AND organization_id = $2)",
        )
        .bind(unidade_id)
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// A unidade está vinculada ao FILHO em user_unidades?
    pub async fn is_assigned(&self, unidade_id: i32, user_id: i32) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM user_unidades WHERE unidade_id = $1 AND user_id = $2)",
        )
        .bind(unidade_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Quantas das unidades informadas pertencem à organização.
    pub async fn count_owned<'e, E>(
        &self,
        executor: E,
        organization_id: i32,
        ids: &[i32],
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM unidades WHERE organization_id = $1 AND id = ANY($2)",
        )
        .bind(organization_id)
        .bind(ids)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    pub async fn rename(
        &self,
        id: i32,
        organization_id: i32,
        name: &str,
    ) -> Result<Option<Unidade>, AppError> {
        let unidade = sqlx::query_as::<_, Unidade>(
            r#"
            UPDATE unidades SET name = $3
            WHERE id = $1 AND organization_id = $2
            RETURNING id, name, organization_id, created_at
            "#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(unidade)
    }

    pub async fn find(&self, id: i32, organization_id: i32) -> Result<Option<Unidade>, AppError> {
        let unidade = sqlx::query_as::<_, Unidade>(
            "SELECT id, name, organization_id, created_at FROM unidades WHERE id = $1 AND organization_id = $2",
        )
        .bind(id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(unidade)
    }

    pub async fn delete(&self, id: i32, organization_id: i32) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM unidades WHERE id = $1 AND organization_id = $2")
            .bind(id)
            .bind(organization_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
