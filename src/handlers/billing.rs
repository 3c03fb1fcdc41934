// src/handlers/billing.rs

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{CapManageBilling, RequireCapability},
    },
    models::billing::{CheckoutResponse, CreateCheckoutPayload, WebhookAck},
};

const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

#[utoipa::path(
    post,
    path = "/billing/create-checkout-session",
    tag = "Billing",
    request_body = CreateCheckoutPayload,
    responses(
        (status = 200, description = "URL da página de pagamento do Stripe", body = CheckoutResponse),
        (status = 400, description = "Plano inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_checkout_session(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    _guard: RequireCapability<CapManageBilling>,
    Json(payload): Json<CreateCheckoutPayload>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let response = app_state
        .billing_service
        .create_checkout(&user.0, &payload.plan_type)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(response))
}

// POST /billing/webhook: público, autenticado pela assinatura sobre o corpo cru
#[utoipa::path(
    post,
    path = "/billing/webhook",
    tag = "Billing",
    request_body(content = String, description = "Evento do Stripe (JSON cru)", content_type = "application/json"),
    responses(
        (status = 200, description = "Evento aceito", body = WebhookAck),
        (status = 400, description = "Assinatura ou conteúdo inválido")
    )
)]
pub async fn stripe_webhook(
    State(app_state): State<AppState>,
    locale: Locale,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    app_state
        .billing_service
        .handle_webhook(signature, &body, Utc::now().timestamp())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Webhook do Stripe recusado");
            e.to_api_error(&locale)
        })?;

    Ok(Json(WebhookAck { received: true }))
}
