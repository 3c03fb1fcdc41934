// src/services/caixa_service.rs

use chrono::NaiveDate;

use crate::{
    common::{
        error::{AppError, Resource},
        periods::{parse_date, MonthRef},
    },
    db::CaixaRepository,
    models::caixa::{
        CreateDespesaPayload, DespesaDiaria, DespesaMensal, FechamentoCaixa, FechamentoCompleto,
        UpdateCaixaPayload,
    },
};

/// Segmento de `/caixa/{data}`: uma data ou, para clientes antigos, o id do fechamento.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaixaKey {
    Data(NaiveDate),
    Id(i32),
}

impl CaixaKey {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        if let Ok(data) = parse_date(raw) {
            return Ok(CaixaKey::Data(data));
        }
        raw.parse::<i32>().map(CaixaKey::Id).map_err(|_| {
            AppError::InvalidParameter(format!("Data inválida: '{}' (use AAAA-MM-DD).", raw))
        })
    }
}

#[derive(Clone)]
pub struct CaixaService {
    repo: CaixaRepository,
}

impl CaixaService {
    pub fn new(repo: CaixaRepository) -> Self {
        Self { repo }
    }

    async fn completo(&self, fechamento: FechamentoCaixa) -> Result<FechamentoCompleto, AppError> {
        let pagamentos = self.repo.list_pagamentos(fechamento.id).await?;
        let despesas_diarias = self.repo.list_despesas(fechamento.id).await?;
        Ok(FechamentoCompleto { fechamento, pagamentos, despesas_diarias })
    }

    /// Fechamento do dia com pagamentos e despesas. Cria o dia se ainda não existe.
    pub async fn get_day(&self, unidade_id: i32, data: NaiveDate) -> Result<FechamentoCompleto, AppError> {
        let fechamento = self.repo.find_or_create(unidade_id, data).await?;
        self.completo(fechamento).await
    }

    pub async fn update(
        &self,
        unidade_id: i32,
        key: CaixaKey,
        payload: &UpdateCaixaPayload,
    ) -> Result<FechamentoCompleto, AppError> {
        let id = match key {
            CaixaKey::Data(data) => self.repo.find_or_create(unidade_id, data).await?.id,
            CaixaKey::Id(id) => id,
        };

        let fechamento = self
            .repo
            .update(id, unidade_id, payload)
            .await?
            .ok_or(AppError::NotFound(Resource::FechamentoCaixa))?;

        self.completo(fechamento).await
    }

    // ---
    // Despesas diárias
    // ---

    pub async fn create_despesa(
        &self,
        unidade_id: i32,
        payload: &CreateDespesaPayload,
    ) -> Result<DespesaDiaria, AppError> {
        // O fechamento precisa ser da unidade em que o usuário está operando
        self.repo
            .find_by_id(payload.fechamento_caixa_id, unidade_id)
            .await?
            .ok_or(AppError::NotFound(Resource::FechamentoCaixa))?;

        self.repo
            .create_despesa(payload.fechamento_caixa_id, &payload.descricao, payload.valor)
            .await
    }

    pub async fn delete_despesa(&self, unidade_id: i32, id: i32) -> Result<(), AppError> {
        if self.repo.delete_despesa(id, unidade_id).await? == 0 {
            return Err(AppError::NotFound(Resource::Despesa));
        }
        Ok(())
    }

    pub async fn despesas_mensais(
        &self,
        unidade_id: i32,
        month: MonthRef,
    ) -> Result<Vec<DespesaMensal>, AppError> {
        let (start, end) = month.date_range();
        let rows = self.repo.despesas_do_mes(unidade_id, start, end).await?;
        Ok(rows.into_iter().map(DespesaMensal::from).collect())
    }
}
