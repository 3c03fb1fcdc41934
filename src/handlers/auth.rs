// src/handlers/auth.rs

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
        rbac::{CapManageChildren, RequireCapability},
    },
    models::auth::{
        AuthResponse, ChildUserDetail, ChildUserSummary, CreateChildUserPayload, LoginUserPayload,
        MessageResponse, RegisterUserPayload, SessionRefreshPayload, UpdateChildUserPayload,
        UpdatePermissionsPayload,
    },
};

// POST /auth/register
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Organização, unidade inicial e usuário criados", body = AuthResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "E-mail já cadastrado")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let access_token = app_state
        .auth_service
        .register(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(AuthResponse { access_token })))
}

// POST /auth/login
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Token de acesso", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<LoginUserPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let access_token = app_state
        .auth_service
        .login(&payload.email, &payload.password)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(AuthResponse { access_token }))
}

// POST /auth/refresh-token
#[utoipa::path(
    post,
    path = "/auth/refresh-token",
    tag = "Auth",
    responses(
        (status = 200, description = "Token reemitido com o estado atual", body = AuthResponse),
        (status = 401, description = "Assinatura ainda não está ativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn refresh_token(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<Json<AuthResponse>, ApiError> {
    let access_token = app_state
        .auth_service
        .refresh_token(&user.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(AuthResponse { access_token }))
}

// POST /auth/refresh-token/session
#[utoipa::path(
    post,
    path = "/auth/refresh-token/session",
    tag = "Auth",
    request_body = SessionRefreshPayload,
    responses(
        (status = 200, description = "Token reemitido após o checkout", body = AuthResponse),
        (status = 401, description = "Sessão de outra organização ou assinatura inativa")
    ),
    security(("api_jwt" = []))
)]
pub async fn refresh_token_by_session(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<SessionRefreshPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let access_token = app_state
        .auth_service
        .refresh_by_session(&user.0, &payload.session_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(AuthResponse { access_token }))
}

// ---
// Usuários FILHO (só o PAI)
// ---

#[utoipa::path(
    post,
    path = "/auth/children",
    tag = "Sub-usuários",
    request_body = CreateChildUserPayload,
    responses(
        (status = 201, description = "Sub-usuário criado", body = ChildUserSummary),
        (status = 409, description = "Nome de usuário já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_child(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireCapability<CapManageChildren>,
    Json(payload): Json<CreateChildUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let child = app_state
        .auth_service
        .create_child(user.0.sub, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(child)))
}

#[utoipa::path(
    get,
    path = "/auth/children",
    tag = "Sub-usuários",
    responses((status = 200, description = "Sub-usuários do usuário principal", body = Vec<ChildUserSummary>)),
    security(("api_jwt" = []))
)]
pub async fn list_children(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireCapability<CapManageChildren>,
) -> Result<Json<Vec<ChildUserSummary>>, ApiError> {
    let children = app_state
        .auth_service
        .list_children(user.0.sub)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(children))
}

#[utoipa::path(
    get,
    path = "/auth/children/{id}",
    tag = "Sub-usuários",
    params(("id" = i32, Path, description = "ID do sub-usuário")),
    responses(
        (status = 200, description = "Sub-usuário com permissões", body = ChildUserDetail),
        (status = 404, description = "Sub-usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_child(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireCapability<CapManageChildren>,
    Path(id): Path<i32>,
) -> Result<Json<ChildUserDetail>, ApiError> {
    let child = app_state
        .auth_service
        .get_child(user.0.sub, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(child))
}

#[utoipa::path(
    patch,
    path = "/auth/children/{id}",
    tag = "Sub-usuários",
    params(("id" = i32, Path, description = "ID do sub-usuário")),
    request_body = UpdateChildUserPayload,
    responses((status = 200, description = "Sub-usuário atualizado", body = ChildUserSummary)),
    security(("api_jwt" = []))
)]
pub async fn update_child(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireCapability<CapManageChildren>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateChildUserPayload>,
) -> Result<Json<ChildUserSummary>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let child = app_state
        .auth_service
        .update_child(user.0.sub, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(child))
}

#[utoipa::path(
    delete,
    path = "/auth/children/{id}",
    tag = "Sub-usuários",
    params(("id" = i32, Path, description = "ID do sub-usuário")),
    responses((status = 200, description = "Sub-usuário removido", body = MessageResponse)),
    security(("api_jwt" = []))
)]
pub async fn delete_child(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireCapability<CapManageChildren>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ApiError> {
    app_state
        .auth_service
        .delete_child(user.0.sub, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let message = if locale.is_english() { "Sub-user removed." } else { "Usuário removido com sucesso." };
    Ok(Json(MessageResponse { message: message.to_string() }))
}

#[utoipa::path(
    patch,
    path = "/auth/children/{id}/permissions",
    tag = "Sub-usuários",
    params(("id" = i32, Path, description = "ID do sub-usuário")),
    request_body = UpdatePermissionsPayload,
    responses((status = 200, description = "Permissões substituídas", body = ChildUserDetail)),
    security(("api_jwt" = []))
)]
pub async fn update_child_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireCapability<CapManageChildren>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePermissionsPayload>,
) -> Result<Json<ChildUserDetail>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let child = app_state
        .auth_service
        .update_permissions(user.0.sub, user.0.org_id, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(child))
}
