// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::{map_constraint_violation, AppError},
    models::auth::{ChildUserSummary, User},
};

const USER_COLUMNS: &str = r#"
    id, email, username, password_hash, name, company_name, role,
    organization_id, pai_id, allowed_pages, created_at, updated_at
"#;

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Login aceita o e-mail (PAI) ou o nome de usuário (FILHO).
    pub async fn find_by_login(&self, login: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 OR username = $1 LIMIT 1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(login)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    // Cria o dono da organização, com todas as páginas liberadas.
    // E-mail duplicado vira EmailAlreadyExists.
    pub async fn create_owner<'e, E>(
        &self,
        executor: E,
        email: &str,
        password_hash: &str,
        name: &str,
        company_name: &str,
        organization_id: i32,
        allowed_pages: &[String],
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO users (email, password_hash, name, company_name, role, organization_id, allowed_pages)
            VALUES ($1, $2, $3, $4, 'PAI', $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(password_hash)
            .bind(name)
            .bind(company_name)
            .bind(organization_id)
            .bind(allowed_pages)
            .fetch_one(executor)
            .await
            .map_err(map_constraint_violation)
    }

    pub async fn create_child(
        &self,
        pai: &User,
        username: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let sql = format!(
            r#"
            INSERT INTO users (username, password_hash, name, company_name, role, organization_id, pai_id, allowed_pages)
            VALUES ($1, $2, $3, $4, 'FILHO', $5, $6, ARRAY['caixa'])
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .bind(password_hash)
            .bind(name)
            .bind(&pai.company_name)
            .bind(pai.organization_id)
            .bind(pai.id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_constraint_violation)
    }

    pub async fn list_children(&self, pai_id: i32) -> Result<Vec<ChildUserSummary>, AppError> {
        let children = sqlx::query_as::<_, ChildUserSummary>(
            r#"
            SELECT id, username, name, created_at
            FROM users
            WHERE pai_id = $1 AND role = 'FILHO'
            ORDER BY created_at
            "#,
        )
        .bind(pai_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(children)
    }

    /// O filho só é encontrado se pertencer ao PAI informado.
    pub async fn find_child(&self, pai_id: i32, child_id: i32) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND pai_id = $2 AND role = 'FILHO'"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(child_id)
            .bind(pai_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn update_child(
        &self,
        pai_id: i32,
        child_id: i32,
        name: &str,
        password_hash: Option<&str>,
    ) -> Result<Option<ChildUserSummary>, AppError> {
        let child = sqlx::query_as::<_, ChildUserSummary>(
            r#"
            UPDATE users SET
                name = $3,
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $1 AND pai_id = $2 AND role = 'FILHO'
            RETURNING id, username, name, created_at
            "#,
        )
        .bind(child_id)
        .bind(pai_id)
        .bind(name)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(child)
    }

    pub async fn delete_child(&self, pai_id: i32, child_id: i32) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND pai_id = $2 AND role = 'FILHO'")
            .bind(child_id)
            .bind(pai_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn set_allowed_pages<'e, E>(
        &self,
        executor: E,
        user_id: i32,
        pages: &[String],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE users SET allowed_pages = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(pages)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn clear_unidades<'e, E>(&self, executor: E, user_id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM user_unidades WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // Só vincula as unidades que de fato são da organização.
    pub async fn grant_unidades<'e, E>(
        &self,
        executor: E,
        user_id: i32,
        organization_id: i32,
        unidade_ids: &[i32],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO user_unidades (user_id, unidade_id)
            SELECT $1, u.id FROM unidades u
            WHERE u.organization_id = $2 AND u.id = ANY($3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .bind(unidade_ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
