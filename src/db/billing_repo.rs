// src/db/billing_repo.rs

use sqlx::{Executor, Postgres};

use crate::common::error::AppError;

// Registro dos eventos do Stripe já processados.
#[derive(Clone, Default)]
pub struct BillingRepository;

impl BillingRepository {
    pub fn new() -> Self {
        Self
    }

    /// `true` se o evento é novo; `false` se já tinha sido processado.
    pub async fn record_event<'e, E>(
        &self,
        executor: E,
        event_id: &str,
        event_type: &str,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO billing_events (id, event_type)
            VALUES ($1, $2)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(event_type)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
