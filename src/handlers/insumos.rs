// src/handlers/insumos.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{CapPageInsumos, RequireCapability},
    },
    models::insumo::{CreateInsumoPayload, Insumo, UpdateInsumoPayload},
};

#[utoipa::path(
    post,
    path = "/insumos",
    tag = "Insumos",
    request_body = CreateInsumoPayload,
    responses(
        (status = 201, description = "Insumo criado", body = Insumo),
        (status = 400, description = "Unidade de compra desconhecida ou valor negativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_insumo(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireCapability<CapPageInsumos>,
    Json(payload): Json<CreateInsumoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let insumo = app_state
        .insumo_service
        .create(user.0.org_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(insumo)))
}

#[utoipa::path(
    get,
    path = "/insumos",
    tag = "Insumos",
    responses((status = 200, description = "Insumos da organização", body = Vec<Insumo>)),
    security(("api_jwt" = []))
)]
pub async fn list_insumos(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireCapability<CapPageInsumos>,
) -> Result<Json<Vec<Insumo>>, ApiError> {
    let insumos = app_state
        .insumo_service
        .list(user.0.org_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(insumos))
}

#[utoipa::path(
    get,
    path = "/insumos/{id}",
    tag = "Insumos",
    params(("id" = i32, Path, description = "ID do insumo")),
    responses(
        (status = 200, description = "Insumo", body = Insumo),
        (status = 404, description = "Insumo não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_insumo(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireCapability<CapPageInsumos>,
    Path(id): Path<i32>,
) -> Result<Json<Insumo>, ApiError> {
    let insumo = app_state
        .insumo_service
        .get(user.0.org_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(insumo))
}

#[utoipa::path(
    patch,
    path = "/insumos/{id}",
    tag = "Insumos",
    params(("id" = i32, Path, description = "ID do insumo")),
    request_body = UpdateInsumoPayload,
    responses((status = 200, description = "Insumo atualizado", body = Insumo)),
    security(("api_jwt" = []))
)]
pub async fn update_insumo(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireCapability<CapPageInsumos>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateInsumoPayload>,
) -> Result<Json<Insumo>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let insumo = app_state
        .insumo_service
        .update(user.0.org_id, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(insumo))
}

#[utoipa::path(
    delete,
    path = "/insumos/{id}",
    tag = "Insumos",
    params(("id" = i32, Path, description = "ID do insumo")),
    responses(
        (status = 204, description = "Insumo removido"),
        (status = 409, description = "Insumo usado em alguma receita")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_insumo(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireCapability<CapPageInsumos>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    app_state
        .insumo_service
        .delete(user.0.org_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(StatusCode::NO_CONTENT)
}
