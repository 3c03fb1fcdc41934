// src/db/organization_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::{
        billing::Activation,
        organization::{Organization, SubscriptionStatus},
    },
};

const ORG_COLUMNS: &str = r#"
    id, name, plan_type, unidade_limit, subscription_status,
    stripe_customer_id, subscription_id, current_period_end,
    created_at, updated_at
"#;

#[derive(Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Nova organização no plano de entrada, aguardando pagamento.
    pub async fn create<'e, E>(&self, executor: E, name: &str) -> Result<Organization, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO organizations (name, plan_type, unidade_limit, subscription_status)
            VALUES ($1, 'Pro', 1, 'INCOMPLETE')
            RETURNING {ORG_COLUMNS}
            "#
        );
        let org = sqlx::query_as::<_, Organization>(&sql)
            .bind(name)
            .fetch_one(executor)
            .await?;
        Ok(org)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Organization>, AppError> {
        let sql = format!("SELECT {ORG_COLUMNS} FROM organizations WHERE id = $1");
        let org = sqlx::query_as::<_, Organization>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(org)
    }

    /// Trava a linha da organização até o fim da transação (checagem de cota).
    pub async fn lock_for_update<'e, E>(
        &self,
        executor: E,
        id: i32,
    ) -> Result<Option<Organization>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {ORG_COLUMNS} FROM organizations WHERE id = $1 FOR UPDATE");
        let org = sqlx::query_as::<_, Organization>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(org)
    }

    pub async fn set_stripe_customer(&self, id: i32, customer_id: &str) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE organizations SET stripe_customer_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(customer_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Checkout concluído: plano, cota, ids do Stripe e status ACTIVE.
    pub async fn apply_activation<'e, E>(
        &self,
        executor: E,
        id: i32,
        activation: &Activation,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE organizations SET
                plan_type = $2,
                unidade_limit = $3,
                subscription_status = $4,
                stripe_customer_id = $5,
                subscription_id = $6,
                current_period_end = $7,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&activation.plan_type)
        .bind(activation.unidade_limit)
        .bind(activation.status)
        .bind(&activation.stripe_customer_id)
        .bind(&activation.subscription_id)
        .bind(activation.current_period_end)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn update_status_by_subscription<'e, E>(
        &self,
        executor: E,
        subscription_id: &str,
        status: SubscriptionStatus,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE organizations
            SET subscription_status = $2, updated_at = NOW()
            WHERE subscription_id = $1
            "#,
        )
        .bind(subscription_id)
        .bind(status)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
