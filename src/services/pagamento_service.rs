// src/services/pagamento_service.rs

use chrono::Datelike;
use sqlx::PgPool;

use crate::{
    common::{
        error::{AppError, Resource},
        periods::{parse_date, MonthRef},
    },
    db::CaixaRepository,
    models::caixa::{CreatePagamentoPayload, CustoRegistrado, Pagamento},
};

#[derive(Clone)]
pub struct PagamentoService {
    repo: CaixaRepository,
    pool: PgPool,
}

impl PagamentoService {
    pub fn new(repo: CaixaRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    /// Registra o pagamento e o custo mensal correspondente na mesma transação.
    pub async fn create(
        &self,
        unidade_id: i32,
        payload: &CreatePagamentoPayload,
    ) -> Result<Pagamento, AppError> {
        let data = parse_date(&payload.data)?;

        self.repo
            .find_by_id(payload.fechamento_caixa_id, unidade_id)
            .await?
            .ok_or(AppError::NotFound(Resource::FechamentoCaixa))?;

        let mut tx = self.pool.begin().await?;

        let pagamento = self
            .repo
            .create_pagamento(&mut *tx, payload.fechamento_caixa_id, &payload.descricao, payload.valor, data)
            .await?;

        self.repo
            .create_custo_registrado(&mut *tx, unidade_id, &pagamento, data.month() as i32, data.year())
            .await?;

        tx.commit().await?;

        tracing::debug!(pagamento_id = pagamento.id, unidade_id, "Pagamento registrado");
        Ok(pagamento)
    }

    /// O custo registrado vai junto pela FK.
    pub async fn delete(&self, unidade_id: i32, id: i32) -> Result<(), AppError> {
        if self.repo.delete_pagamento(id, unidade_id).await? == 0 {
            return Err(AppError::NotFound(Resource::Pagamento));
        }
        Ok(())
    }

    pub async fn custos_registrados(
        &self,
        unidade_id: i32,
        month: MonthRef,
    ) -> Result<Vec<CustoRegistrado>, AppError> {
        self.repo
            .custos_do_mes(unidade_id, month.ano, month.mes as i32)
            .await
    }
}
