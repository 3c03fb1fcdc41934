// src/handlers/unidades.rs

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
        rbac::{CapManageUnits, RequireCapability},
    },
    models::organization::{CreateUnidadePayload, Unidade, UpdateUnidadePayload},
};

#[utoipa::path(
    get,
    path = "/unidades",
    tag = "Unidades",
    responses((status = 200, description = "Unidades visíveis para o usuário", body = Vec<Unidade>)),
    security(("api_jwt" = []))
)]
pub async fn list_unidades(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Unidade>>, ApiError> {
    let unidades = app_state
        .unidade_service
        .list(&user.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(unidades))
}

#[utoipa::path(
    post,
    path = "/unidades",
    tag = "Unidades",
    request_body = CreateUnidadePayload,
    responses(
        (status = 201, description = "Unidade criada", body = Unidade),
        (status = 409, description = "Limite de unidades do plano atingido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_unidade(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireCapability<CapManageUnits>,
    Json(payload): Json<CreateUnidadePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let unidade = app_state
        .unidade_service
        .create(user.0.org_id, &payload.name)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(unidade)))
}

#[utoipa::path(
    patch,
    path = "/unidades/{id}",
    tag = "Unidades",
    params(("id" = i32, Path, description = "ID da unidade")),
    request_body = UpdateUnidadePayload,
    responses((status = 200, description = "Unidade atualizada", body = Unidade)),
    security(("api_jwt" = []))
)]
pub async fn update_unidade(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireCapability<CapManageUnits>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUnidadePayload>,
) -> Result<Json<Unidade>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let unidade = app_state
        .unidade_service
        .update(user.0.org_id, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(unidade))
}

#[utoipa::path(
    delete,
    path = "/unidades/{id}",
    tag = "Unidades",
    params(("id" = i32, Path, description = "ID da unidade")),
    responses(
        (status = 204, description = "Unidade removida com receitas e fechamentos"),
        (status = 404, description = "Unidade não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_unidade(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireCapability<CapManageUnits>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    app_state
        .unidade_service
        .delete(user.0.org_id, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(StatusCode::NO_CONTENT)
}
