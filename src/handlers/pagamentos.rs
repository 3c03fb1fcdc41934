// src/handlers/pagamentos.rs

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
        rbac::{CapPageCaixa, CapPageCustos, RequireCapability},
        tenancy::UnitScope,
    },
    models::caixa::{CreatePagamentoPayload, CustoRegistrado, Pagamento},
};

#[utoipa::path(
    post,
    path = "/pagamentos",
    tag = "Pagamentos",
    params(("unidadeId" = i32, Query, description = "ID da unidade")),
    request_body = CreatePagamentoPayload,
    responses(
        (status = 201, description = "Pagamento e custo mensal registrados", body = Pagamento),
        (status = 404, description = "Fechamento não encontrado nesta unidade")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_pagamento(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapPageCaixa>,
    scope: UnitScope,
    Json(payload): Json<CreatePagamentoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let pagamento = app_state
        .pagamento_service
        .create(scope.unidade_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(pagamento)))
}

#[utoipa::path(
    delete,
    path = "/pagamentos/{id}",
    tag = "Pagamentos",
    params(
        ("id" = i32, Path, description = "ID do pagamento"),
        ("unidadeId" = i32, Query, description = "ID da unidade")
    ),
    responses((status = 204, description = "Pagamento e custo registrado removidos")),
    security(("api_jwt" = []))
)]
pub async fn delete_pagamento(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapPageCaixa>,
    scope: UnitScope,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    app_state
        .pagamento_service
        .delete(scope.unidade_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/pagamentos/custos-registrados/{ano}/{mes}",
    tag = "Pagamentos",
    params(
        ("ano" = i32, Path, description = "Ano"),
        ("mes" = u32, Path, description = "Mês (1-12)"),
        ("unidadeId" = i32, Query, description = "ID da unidade")
    ),
    responses((status = 200, description = "Custos registrados no mês", body = Vec<CustoRegistrado>)),
    security(("api_jwt" = []))
)]
pub async fn custos_registrados(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapPageCustos>,
    scope: UnitScope,
    Path((ano, mes)): Path<(i32, u32)>,
) -> Result<Json<Vec<CustoRegistrado>>, ApiError> {
    let month = MonthRef::new(ano, mes).map_err(|e| e.to_api_error(&locale))?;

    let custos = app_state
        .pagamento_service
        .custos_registrados(scope.unidade_id, month)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(custos))
}

#[utoipa::path(
    get,
    path = "/pagamentos/custos-registrados/{ano}/{mes}/export-pdf",
    tag = "Pagamentos",
    params(
        ("ano" = i32, Path, description = "Ano"),
        ("mes" = u32, Path, description = "Mês (1-12)"),
        ("unidadeId" = i32, Query, description = "ID da unidade")
    ),
    responses((status = 200, description = "Relatório mensal de custos em PDF", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn export_custos_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapPageCustos>,
    scope: UnitScope,
    Path((ano, mes)): Path<(i32, u32)>,
) -> Result<Response, ApiError> {
    let month = MonthRef::new(ano, mes).map_err(|e| e.to_api_error(&locale))?;

    let custos = app_state
        .pagamento_service
        .custos_registrados(scope.unidade_id, month)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let pdf_bytes = app_state
        .document_service
        .custos_pdf(month, custos)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(pdf_attachment(pdf_bytes, &format!("custos_{}_{:02}.pdf", ano, mes)))
}
