// src/handlers/caixa.rs

use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        periods::parse_date,
    },
    config::AppState,
    handlers::pdf_attachment,
    middleware::{
        i18n::Locale,
        rbac::{CapPageCaixa, RequireCapability},
        tenancy::UnitScope,
    },
    models::caixa::{FechamentoCompleto, UpdateCaixaPayload},
    services::caixa_service::CaixaKey,
};

// GET /caixa/{data}: o dia é criado zerado na primeira consulta
#[utoipa::path(
    get,
    path = "/caixa/{data}",
    tag = "Caixa",
    params(
        ("data" = String, Path, description = "Data no formato AAAA-MM-DD"),
        ("unidadeId" = i32, Query, description = "ID da unidade")
    ),
    responses(
        (status = 200, description = "Fechamento do dia com pagamentos e despesas", body = FechamentoCompleto),
        (status = 400, description = "Data inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_caixa(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapPageCaixa>,
    scope: UnitScope,
    Path(data): Path<String>,
) -> Result<Json<FechamentoCompleto>, ApiError> {
    let data = parse_date(&data).map_err(|e| e.to_api_error(&locale))?;

    let caixa = app_state
        .caixa_service
        .get_day(scope.unidade_id, data)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(caixa))
}

// PATCH /caixa/{data}: aceita a data ou o id do fechamento
#[utoipa::path(
    patch,
    path = "/caixa/{data}",
    tag = "Caixa",
    params(
        ("data" = String, Path, description = "Data (AAAA-MM-DD) ou ID do fechamento"),
        ("unidadeId" = i32, Query, description = "ID da unidade")
    ),
    request_body = UpdateCaixaPayload,
    responses((status = 200, description = "Fechamento atualizado", body = FechamentoCompleto)),
    security(("api_jwt" = []))
)]
pub async fn update_caixa(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapPageCaixa>,
    scope: UnitScope,
    Path(data): Path<String>,
    Json(payload): Json<UpdateCaixaPayload>,
) -> Result<Json<FechamentoCompleto>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;
    let key = CaixaKey::parse(&data).map_err(|e| e.to_api_error(&locale))?;

    let caixa = app_state
        .caixa_service
        .update(scope.unidade_id, key, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(caixa))
}

#[utoipa::path(
    get,
    path = "/caixa/export-pdf/{data}",
    tag = "Caixa",
    params(
        ("data" = String, Path, description = "Data no formato AAAA-MM-DD"),
        ("unidadeId" = i32, Query, description = "ID da unidade")
    ),
    responses((status = 200, description = "Relatório do fechamento em PDF", content_type = "application/pdf")),
    security(("api_jwt" = []))
)]
pub async fn export_caixa_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapPageCaixa>,
    scope: UnitScope,
    Path(data): Path<String>,
) -> Result<Response, ApiError> {
    let data = parse_date(&data).map_err(|e| e.to_api_error(&locale))?;

    let caixa = app_state
        .caixa_service
        .get_day(scope.unidade_id, data)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let pdf_bytes = app_state
        .document_service
        .caixa_pdf(caixa)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(pdf_attachment(pdf_bytes, &format!("caixa_{}.pdf", data.format("%Y-%m-%d"))))
}
