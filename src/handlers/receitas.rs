// src/handlers/receitas.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::pdf_attachment,
    middleware::{
        i18n::Locale,
        rbac::{CapPageReceitas, RequireCapability},
        tenancy::UnitScope,
    },
    models::receita::{CreateReceitaPayload, ReceitaDetalhada, ReceitaResumo, UpdateReceitaPayload},
};

#[utoipa::path(
    post,
    path = "/receitas",
    tag = "Receitas",
    params(("unidadeId" = i32, Query, description = "ID da unidade")),
    request_body = CreateReceitaPayload,
    responses(
        (status = 201, description = "Receita criada com custo calculado", body = ReceitaDetalhada),
        (status = 404, description = "Insumo inexistente na organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_receita(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapPageReceitas>,
    scope: UnitScope,
    Json(payload): Json<CreateReceitaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let receita = app_state
        .receita_service
        .create(scope.org_id, scope.unidade_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(receita)))
}

#[utoipa::path(
    get,
    path = "/receitas",
    tag = "Receitas",
    params(("unidadeId" = i32, Query, description = "ID da unidade")),
    responses((status = 200, description = "Receitas da unidade", body = Vec<ReceitaResumo>)),
    security(("api_jwt" = []))
)]
pub async fn list_receitas(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapPageReceitas>,
    scope: UnitScope,
) -> Result<Json<Vec<ReceitaResumo>>, ApiError> {
    let receitas = app_state
        .receita_service
        .list(scope.unidade_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(receitas))
}

#[utoipa::path(
    get,
    path = "/receitas/{id}",
    tag = "Receitas",
    params(
        ("id" = i32, Path, description = "ID da receita"),
        ("unidadeId" = i32, Query, description = "ID da unidade")
    ),
    responses(
        (status = 200, description = "Receita com custos e preço sugerido", body = ReceitaDetalhada),
        (status = 404, description = "Receita não encontrada nesta unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_receita(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapPageReceitas>,
    scope: UnitScope,
    Path(id): Path<i32>,
) -> Result<Json<ReceitaDetalhada>, ApiError> {
    let receita = app_state
        .receita_service
        .get(scope.unidade_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(receita))
}

#[utoipa::path(
    patch,
    path = "/receitas/{id}",
    tag = "Receitas",
    params(
        ("id" = i32, Path, description = "ID da receita"),
        ("unidadeId" = i32, Query, description = "ID da unidade")
    ),
    request_body = UpdateReceitaPayload,
    responses((status = 200, description = "Receita atualizada", body = ReceitaDetalhada)),
    security(("api_jwt" = []))
)]
pub async fn update_receita(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapPageReceitas>,
    scope: UnitScope,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateReceitaPayload>,
) -> Result<Json<ReceitaDetalhada>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let receita = app_state
        .receita_service
        .update(scope.org_id, scope.unidade_id, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(receita))
}

#[utoipa::path(
    delete,
    path = "/receitas/{id}",
    tag = "Receitas",
    params(
        ("id" = i32, Path, description = "ID da receita"),
        ("unidadeId" = i32, Query, description = "ID da unidade")
    ),
    responses((status = 204, description = "Receita e itens removidos")),
    security(("api_jwt" = []))
)]
pub async fn delete_receita(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapPageReceitas>,
    scope: UnitScope,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    app_state
        .receita_service
        .delete(scope.unidade_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/receitas/{id}/export-pdf",
    tag = "Receitas",
    params(
        ("id" = i32, Path, description = "ID da receita"),
        ("unidadeId" = i32, Query, description = "ID da unidade")
    ),
    responses((status = 200, description = "Ficha técnica em PDF", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn export_receita_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapPageReceitas>,
    scope: UnitScope,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    let receita = app_state
        .receita_service
        .get(scope.unidade_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let pdf_bytes = app_state
        .document_service
        .receita_pdf(receita)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(pdf_attachment(pdf_bytes, &format!("receita_{}.pdf", id)))
}
