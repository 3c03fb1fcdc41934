// src/services/insumo_service.rs

use crate::{
    common::error::{AppError, Resource},
    db::InsumoRepository,
    models::insumo::{CreateInsumoPayload, Insumo, UpdateInsumoPayload},
};

// Insumos são da organização inteira; as receitas de qualquer unidade os usam.
#[derive(Clone)]
pub struct InsumoService {
    repo: InsumoRepository,
}

impl InsumoService {
    pub fn new(repo: InsumoRepository) -> Self {
        Self { repo }
    }

    pub async fn create(&self, org_id: i32, payload: &CreateInsumoPayload) -> Result<Insumo, AppError> {
        self.repo
            .create(
                org_id,
                &payload.nome,
                payload.unidade_compra.trim(),
                payload.valor_unidade_compra,
            )
            .await
    }

    pub async fn list(&self, org_id: i32) -> Result<Vec<Insumo>, AppError> {
        self.repo.list(org_id).await
    }

    pub async fn get(&self, org_id: i32, id: i32) -> Result<Insumo, AppError> {
        self.repo
            .find(id, org_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Insumo))
    }

    pub async fn update(
        &self,
        org_id: i32,
        id: i32,
        payload: &UpdateInsumoPayload,
    ) -> Result<Insumo, AppError> {
        self.repo
            .update(id, org_id, payload)
            .await?
            .ok_or(AppError::NotFound(Resource::Insumo))
    }

    /// Falha com conflito se alguma receita ainda usa o insumo.
    pub async fn delete(&self, org_id: i32, id: i32) -> Result<(), AppError> {
        if self.repo.delete(id, org_id).await? == 0 {
            return Err(AppError::NotFound(Resource::Insumo));
        }
        Ok(())
    }
}
