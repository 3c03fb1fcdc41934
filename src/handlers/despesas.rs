// src/handlers/despesas.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        periods::MonthRef,
    },
    config::AppState,
    handlers::pdf_attachment,
    middleware::{
        i18n::Locale,
        rbac::{CapPageCaixa, CapPageCustosOperacionais, RequireCapability},
        tenancy::UnitScope,
    },
    models::caixa::{CreateDespesaPayload, DespesaDiaria, DespesaMensal},
};

#[utoipa::path(
    post,
    path = "/despesas",
    tag = "Despesas",
    params(("unidadeId" = i32, Query, description = "ID da unidade")),
    request_body = CreateDespesaPayload,
    responses(
        (status = 201, description = "Despesa lançada no fechamento", body = DespesaDiaria),
        (status = 404, description = "Fechamento não encontrado nesta unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_despesa(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapPageCaixa>,
    scope: UnitScope,
    Json(payload): Json<CreateDespesaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let despesa = app_state
        .caixa_service
        .create_despesa(scope.unidade_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(despesa)))
}

#[utoipa::path(
    delete,
    path = "/despesas/{id}",
    tag = "Despesas",
    params(
        ("id" = i32, Path, description = "ID da despesa"),
        ("unidadeId" = i32, Query, description = "ID da unidade")
    ),
    responses((status = 204, description = "Despesa removida")),
    security(("api_jwt" = []))
)]
pub async fn delete_despesa(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapPageCaixa>,
    scope: UnitScope,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    app_state
        .caixa_service
        .delete_despesa(scope.unidade_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/despesas/mensal/{ano}/{mes}",
    tag = "Despesas",
    params(
        ("ano" = i32, Path, description = "Ano"),
        ("mes" = u32, Path, description = "Mês (1-12)"),
        ("unidadeId" = i32, Query, description = "ID da unidade")
    ),
    responses((status = 200, description = "Despesas do mês com a data do fechamento", body = Vec<DespesaMensal>)),
    security(("api_jwt" = []))
)]
pub async fn despesas_mensais(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapPageCustosOperacionais>,
    scope: UnitScope,
    Path((ano, mes)): Path<(i32, u32)>,
) -> Result<Json<Vec<DespesaMensal>>, ApiError> {
    let month = MonthRef::new(ano, mes).map_err(|e| e.to_api_error(&locale))?;

    let despesas = app_state
        .caixa_service
        .despesas_mensais(scope.unidade_id, month)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(despesas))
}

#[utoipa::path(
    get,
    path = "/despesas/mensal/{ano}/{mes}/export-pdf",
    tag = "Despesas",
    params(
        ("ano" = i32, Path, description = "Ano"),
        ("mes" = u32, Path, description = "Mês (1-12)"),
        ("unidadeId" = i32, Query, description = "ID da unidade")
    ),
    responses((status = 200, description = "Relatório mensal de despesas em PDF", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn export_despesas_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapPageCustosOperacionais>,
    scope: UnitScope,
    Path((ano, mes)): Path<(i32, u32)>,
) -> Result<Response, ApiError> {
    let month = MonthRef::new(ano, mes).map_err(|e| e.to_api_error(&locale))?;

    let despesas = app_state
        .caixa_service
        .despesas_mensais(scope.unidade_id, month)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let pdf_bytes = app_state
        .document_service
        .despesas_pdf(month, despesas)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(pdf_attachment(pdf_bytes, &format!("despesas_{}_{:02}.pdf", ano, mes)))
}
