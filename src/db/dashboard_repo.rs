// src/db/dashboard_repo.rs

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::{common::error::AppError, models::dashboard::DailyTotals};

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Totais por dia de fechamento no intervalo [start, end].
    // Despesas e pagamentos são somados em subconsultas para não
    // multiplicar as vendas no JOIN.
    pub async fn daily_totals(
        &self,
        unidade_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyTotals>, AppError> {
        let rows = sqlx::query_as::<_, DailyTotals>(
            r#"
            SELECT
                f.data,
                (f.vendas_dinheiro + f.vendas_cartao) AS vendas,
                COALESCE((
                    SELECT SUM(d.valor) FROM despesas_diarias d
                    WHERE d.fechamento_caixa_id = f.id
                ), 0) AS despesas,
                COALESCE((
                    SELECT SUM(p.valor) FROM pagamentos p
                    WHERE p.fechamento_caixa_id = f.id
                ), 0) AS pagamentos
            FROM fechamentos_caixa f
            WHERE f.unidade_id = $1 AND f.data BETWEEN $2 AND $3
            ORDER BY f.data
            "#,
        )
        .bind(unidade_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // 2. Receitas com maior e menor lucro desejado da unidade
    pub async fn most_profitable(&self, unidade_id: i32) -> Result<Option<String>, AppError> {
        self.recipe_by_margin(unidade_id, "DESC").await
    }

    pub async fn least_profitable(&self, unidade_id: i32) -> Result<Option<String>, AppError> {
        self.recipe_by_margin(unidade_id, "ASC").await
    }

    async fn recipe_by_margin(
        &self,
        unidade_id: i32,
        direction: &'static str,
    ) -> Result<Option<String>, AppError> {
        let sql = format!(
            "SELECT nome FROM receitas WHERE unidade_id = $1 ORDER BY lucro_desejado {direction}, id LIMIT 1"
        );
        let nome: Option<String> = sqlx::query_scalar(&sql)
            .bind(unidade_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(nome)
    }
}
