// src/db/insumo_repo.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::{map_constraint_violation, AppError},
    models::insumo::{Insumo, UpdateInsumoPayload},
};

const INSUMO_COLUMNS: &str =
    "id, nome, unidade_compra, valor_unidade_compra, organization_id, created_at, updated_at";

#[derive(Clone)]
pub struct InsumoRepository {
    pool: PgPool,
}

impl InsumoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        organization_id: i32,
        nome: &str,
        unidade_compra: &str,
        valor_unidade_compra: Decimal,
    ) -> Result<Insumo, AppError> {
        let sql = format!(
            r#"
            INSERT INTO insumos (nome, unidade_compra, valor_unidade_compra, organization_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {INSUMO_COLUMNS}
            "#
        );
        let insumo = sqlx::query_as::<_, Insumo>(&sql)
            .bind(nome)
            .bind(unidade_compra)
            .bind(valor_unidade_compra)
            .bind(organization_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(insumo)
    }

    pub async fn list(&self, organization_id: i32) -> Result<Vec<Insumo>, AppError> {
        let sql = format!("SELECT {INSUMO_COLUMNS} FROM insumos WHERE organization_id = $1 ORDER BY nome");
        let insumos = sqlx::query_as::<_, Insumo>(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(insumos)
    }

    pub async fn find(&self, id: i32, organization_id: i32) -> Result<Option<Insumo>, AppError> {
        let sql = format!("SELECT {INSUMO_COLUMNS} FROM insumos WHERE id = $1 AND organization_id = $2");
        let insumo = sqlx::query_as::<_, Insumo>(&sql)
            .bind(id)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(insumo)
    }

    /// Unidade de compra de cada id da lista que pertence à organização.
    pub async fn purchase_units<'e, E>(
        &self,
        executor: E,
        organization_id: i32,
        ids: &[i32],
    ) -> Result<HashMap<i32, String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows: Vec<(i32, String)> = sqlx::query_as(
            "SELECT id, unidade_compra FROM insumos WHERE organization_id = $1 AND id = ANY($2)",
        )
        .bind(organization_id)
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(rows.into_iter().collect())
    }

    // Atualização parcial: campos ausentes mantêm o valor atual
    pub async fn update(
        &self,
        id: i32,
        organization_id: i32,
        payload: &UpdateInsumoPayload,
    ) -> Result<Option<Insumo>, AppError> {
        let sql = format!(
            r#"
            UPDATE insumos SET
                nome = COALESCE($3, nome),
                unidade_compra = COALESCE($4, unidade_compra),
                valor_unidade_compra = COALESCE($5, valor_unidade_compra),
                updated_at = NOW()
            WHERE id = $1 AND organization_id = $2
            RETURNING {INSUMO_COLUMNS}
            "#
        );
        let insumo = sqlx::query_as::<_, Insumo>(&sql)
            .bind(id)
            .bind(organization_id)
            .bind(payload.nome.as_deref())
            .bind(payload.unidade_compra.as_deref())
            .bind(payload.valor_unidade_compra)
            .fetch_optional(&self.pool)
            .await?;
        Ok(insumo)
    }

    /// Um insumo usado por alguma receita não pode ser apagado (FK RESTRICT).
    pub async fn delete(&self, id: i32, organization_id: i32) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM insumos WHERE id = $1 AND organization_id = $2")
            .bind(id)
            .bind(organization_id)
            .execute(&self.pool)
            .await
            .map_err(map_constraint_violation)?;
        Ok(result.rows_affected())
    }
}
