// src/db/caixa_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::caixa::{
        CustoRegistrado, DespesaDiaria, DespesaMensalRow, FechamentoCaixa, Pagamento,
        StatusPagamento, UpdateCaixaPayload,
    },
};

const FECHAMENTO_COLUMNS: &str = r#"
    id, data, vendas_dinheiro, vendas_cartao, troco_dia_seguinte,
    unidade_id, created_at, updated_at
"#;

const CUSTO_COLUMNS: &str = r#"
    id, nome, valor, mes, ano, data_pagamento, status, unidade_id, pagamento_id, created_at
"#;

// Fechamentos de caixa e tudo o que pendura neles: despesas, pagamentos
// e o espelho mensal dos pagamentos (custos_registrados).
#[derive(Clone)]
pub struct CaixaRepository {
    pool: PgPool,
}

impl CaixaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Devolve o fechamento do dia, criando-o zerado se ainda não existir.
    /// O ON CONFLICT resolve duas requisições simultâneas para a mesma data.
    pub async fn find_or_create(
        &self,
        unidade_id: i32,
        data: NaiveDate,
    ) -> Result<FechamentoCaixa, AppError> {
        sqlx::query(
            r#"
            INSERT INTO fechamentos_caixa (data, unidade_id)
            VALUES ($1, $2)
            ON CONFLICT ON CONSTRAINT fechamentos_caixa_unidade_data_key DO NOTHING
            "#,
        )
        .bind(data)
        .bind(unidade_id)
        .execute(&self.pool)
        .await?;

        let sql = format!(
            "SELECT {FECHAMENTO_COLUMNS} FROM fechamentos_caixa WHERE unidade_id = $1 AND data = $2"
        );
        let fechamento = sqlx::query_as::<_, FechamentoCaixa>(&sql)
            .bind(unidade_id)
            .bind(data)
            .fetch_one(&self.pool)
            .await?;
        Ok(fechamento)
    }

    pub async fn find_by_id(
        &self,
        id: i32,
        unidade_id: i32,
    ) -> Result<Option<FechamentoCaixa>, AppError> {
        let sql = format!(
            "SELECT {FECHAMENTO_COLUMNS} FROM fechamentos_caixa WHERE id = $1 AND unidade_id = $2"
        );
        let fechamento = sqlx::query_as::<_, FechamentoCaixa>(&sql)
            .bind(id)
            .bind(unidade_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(fechamento)
    }

    pub async fn update(
        &self,
        id: i32,
        unidade_id: i32,
        payload: &UpdateCaixaPayload,
    ) -> Result<Option<FechamentoCaixa>, AppError> {
        let sql = format!(
            r#"
            UPDATE fechamentos_caixa SET
                vendas_dinheiro = COALESCE($3, vendas_dinheiro),
                vendas_cartao = COALESCE($4, vendas_cartao),
                troco_dia_seguinte = COALESCE($5, troco_dia_seguinte),
                updated_at = NOW()
            WHERE id = $1 AND unidade_id = $2
            RETURNING {FECHAMENTO_COLUMNS}
            "#
        );
        let fechamento = sqlx::query_as::<_, FechamentoCaixa>(&sql)
            .bind(id)
            .bind(unidade_id)
            .bind(payload.vendas_dinheiro)
            .bind(payload.vendas_cartao)
            .bind(payload.troco_dia_seguinte)
            .fetch_optional(&self.pool)
            .await?;
        Ok(fechamento)
    }

    // ---
    // Despesas diárias
    // ---

    pub async fn list_despesas(&self, fechamento_id: i32) -> Result<Vec<DespesaDiaria>, AppError> {
        let despesas = sqlx::query_as::<_, DespesaDiaria>(
            r#"
            SELECT id, descricao, valor, fechamento_caixa_id, created_at
            FROM despesas_diarias
            WHERE fechamento_caixa_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(fechamento_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(despesas)
    }

    pub async fn create_despesa(
        &self,
        fechamento_id: i32,
        descricao: &str,
        valor: Decimal,
    ) -> Result<DespesaDiaria, AppError> {
        let despesa = sqlx::query_as::<_, DespesaDiaria>(
            r#"
            INSERT INTO despesas_diarias (descricao, valor, fechamento_caixa_id)
            VALUES ($1, $2, $3)
            RETURNING id, descricao, valor, fechamento_caixa_id, created_at
            "#,
        )
        .bind(descricao)
        .bind(valor)
        .bind(fechamento_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(despesa)
    }

    /// Apaga a despesa só se o fechamento dela for da unidade.
    pub async fn delete_despesa(&self, id: i32, unidade_id: i32) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM despesas_diarias d
            USING fechamentos_caixa f
            WHERE d.id = $1 AND d.fechamento_caixa_id = f.id AND f.unidade_id = $2
            "#,
        )
        .bind(id)
        .bind(unidade_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn despesas_do_mes(
        &self,
        unidade_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DespesaMensalRow>, AppError> {
        let rows = sqlx::query_as::<_, DespesaMensalRow>(
            r#"
            SELECT d.id, d.descricao, d.valor, d.fechamento_caixa_id, d.created_at, f.data
            FROM despesas_diarias d
            JOIN fechamentos_caixa f ON f.id = d.fechamento_caixa_id
            WHERE f.unidade_id = $1 AND f.data BETWEEN $2 AND $3
            ORDER BY f.data, d.created_at
            "#,
        )
        .bind(unidade_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ---
    // Pagamentos e custos registrados
    // ---

    pub async fn list_pagamentos(&self, fechamento_id: i32) -> Result<Vec<Pagamento>, AppError> {
        let pagamentos = sqlx::query_as::<_, Pagamento>(
            r#"
            SELECT id, descricao, valor, data, fechamento_caixa_id, created_at
            FROM pagamentos
            WHERE fechamento_caixa_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(fechamento_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(pagamentos)
    }

    pub async fn create_pagamento<'e, E>(
        &self,
        executor: E,
        fechamento_id: i32,
        descricao: &str,
        valor: Decimal,
        data: NaiveDate,
    ) -> Result<Pagamento, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let pagamento = sqlx::query_as::<_, Pagamento>(
            r#"
            INSERT INTO pagamentos (descricao, valor, data, fechamento_caixa_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, descricao, valor, data, fechamento_caixa_id, created_at
            "#,
        )
        .bind(descricao)
        .bind(valor)
        .bind(data)
        .bind(fechamento_id)
        .fetch_one(executor)
        .await?;
        Ok(pagamento)
    }

    /// Espelho mensal de um pagamento, sempre PAGO e ligado a ele por FK.
    pub async fn create_custo_registrado<'e, E>(
        &self,
        executor: E,
        unidade_id: i32,
        pagamento: &Pagamento,
        mes: i32,
        ano: i32,
    ) -> Result<CustoRegistrado, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO custos_registrados (nome, valor, mes, ano, data_pagamento, status, unidade_id, pagamento_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {CUSTO_COLUMNS}
            "#
        );
        let custo = sqlx::query_as::<_, CustoRegistrado>(&sql)
            .bind(&pagamento.descricao)
            .bind(pagamento.valor)
            .bind(mes)
            .bind(ano)
            .bind(pagamento.data)
            .bind(StatusPagamento::Pago)
            .bind(unidade_id)
            .bind(pagamento.id)
            .fetch_one(executor)
            .await?;
        Ok(custo)
    }

    /// O custo registrado some junto (ON DELETE CASCADE em pagamento_id).
    pub async fn delete_pagamento(&self, id: i32, unidade_id: i32) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM pagamentos p
            USING fechamentos_caixa f
            WHERE p.id = $1 AND p.fechamento_caixa_id = f.id AND f.unidade_id = $2
            "#,
        )
        .bind(id)
        .bind(unidade_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn custos_do_mes(
        &self,
        unidade_id: i32,
        ano: i32,
        mes: i32,
    ) -> Result<Vec<CustoRegistrado>, AppError> {
        let sql = format!(
            r#"
            SELECT {CUSTO_COLUMNS}
            FROM custos_registrados
            WHERE unidade_id = $1 AND ano = $2 AND mes = $3
            ORDER BY data_pagamento, id
            "#
        );
        let custos = sqlx::query_as::<_, CustoRegistrado>(&sql)
            .bind(unidade_id)
            .bind(ano)
            .bind(mes)
            .fetch_all(&self.pool)
            .await?;
        Ok(custos)
    }
}
