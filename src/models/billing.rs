// src/models/billing.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    models::organization::{unit_limit_for_plan, PlanType, SubscriptionStatus},
};

fn validate_checkout_plan(plan: &str) -> Result<(), ValidationError> {
    match PlanType::parse(plan) {
        Some(p) if p.is_self_service() => Ok(()),
        _ => {
            let mut err = ValidationError::new("plan");
            err.message = Some("Plano inválido.".into());
            Err(err)
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutPayload {
    /// "Pro", "Elite" ou "Master"
    #[validate(custom(function = "validate_checkout_plan"))]
    pub plan_type: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
}

// ---
// Objetos da API do Stripe (só os campos que usamos)
// ---

#[derive(Debug, Deserialize)]
pub struct StripeCustomer {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    pub url: Option<String>,
    pub customer: Option<String>,
    pub subscription: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscriptionItem {
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StripeList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub status: String,
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub items: Option<StripeList<StripeSubscriptionItem>>,
}

impl StripeSubscription {
    // Nas versões novas da API o fim do período mora nos itens
    pub fn period_end(&self) -> Option<DateTime<Utc>> {
        let ts = self.current_period_end.or_else(|| {
            self.items
                .as_ref()
                .and_then(|items| items.data.first())
                .and_then(|item| item.current_period_end)
        })?;
        DateTime::from_timestamp(ts, 0)
    }
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct StripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

/// Evento do webhook já interpretado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEvent {
    CheckoutCompleted {
        org_id: i32,
        plan_type: String,
        customer_id: String,
        subscription_id: String,
    },
    SubscriptionUpdated {
        subscription_id: String,
        status: String,
    },
    Ignored,
}

#[derive(Debug, Clone)]
pub struct ParsedEvent {
    pub id: String,
    pub event_type: String,
    pub event: BillingEvent,
}

fn rejected(msg: &str) -> AppError {
    AppError::WebhookRejected(msg.to_string())
}

/// Interpreta o corpo (já autenticado) de um evento do Stripe.
/// Metadados faltando abortam antes de qualquer escrita.
pub fn parse_event(body: &[u8]) -> Result<ParsedEvent, AppError> {
    let raw: StripeEvent =
        serde_json::from_slice(body).map_err(|_| rejected("Corpo do evento inválido."))?;

    let event = match raw.event_type.as_str() {
        "checkout.session.completed" => {
            let session: StripeCheckoutSession = serde_json::from_value(raw.data.object)
                .map_err(|_| rejected("Sessão de checkout inválida."))?;

            let subscription_id = session
                .subscription
                .ok_or_else(|| rejected("ID da Assinatura não encontrado no checkout."))?;
            let customer_id = session
                .customer
                .ok_or_else(|| rejected("Metadados essenciais faltando no evento de checkout."))?;
            let org_id = session
                .metadata
                .get("orgId")
                .and_then(|v| v.parse::<i32>().ok())
                .ok_or_else(|| rejected("Metadados essenciais faltando no evento de checkout."))?;
            let plan_type = session
                .metadata
                .get("planType")
                .cloned()
                .ok_or_else(|| rejected("Metadados essenciais faltando no evento de checkout."))?;

            BillingEvent::CheckoutCompleted { org_id, plan_type, customer_id, subscription_id }
        }
        "customer.subscription.updated" => {
            let subscription: StripeSubscription = serde_json::from_value(raw.data.object)
                .map_err(|_| rejected("Assinatura inválida no evento."))?;
            BillingEvent::SubscriptionUpdated {
                subscription_id: subscription.id,
                status: subscription.status,
            }
        }
        _ => BillingEvent::Ignored,
    };

    Ok(ParsedEvent { id: raw.id, event_type: raw.event_type, event })
}

/// Novo status para um `customer.subscription.updated`. Outros status não mudam nada.
pub fn status_after_update(stripe_status: &str) -> Option<SubscriptionStatus> {
    match stripe_status {
        "past_due" => Some(SubscriptionStatus::PastDue),
        "canceled" => Some(SubscriptionStatus::Canceled),
        _ => None,
    }
}

/// Dados gravados na organização quando o checkout é concluído.
#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    pub plan_type: String,
    pub unidade_limit: Option<i32>,
    pub status: SubscriptionStatus,
    pub stripe_customer_id: String,
    pub subscription_id: String,
    pub current_period_end: Option<DateTime<Utc>>,
}

impl Activation {
    pub fn from_checkout(
        plan_type: &str,
        customer_id: &str,
        subscription: &StripeSubscription,
    ) -> Self {
        Self {
            plan_type: plan_type.to_string(),
            unidade_limit: unit_limit_for_plan(plan_type),
            status: SubscriptionStatus::Active,
            stripe_customer_id: customer_id.to_string(),
            subscription_id: subscription.id.clone(),
            current_period_end: subscription.period_end(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn checkout_event(metadata: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": { "object": {
                "id": "cs_test_1",
                "customer": "cus_1",
                "subscription": "sub_1",
                "metadata": metadata
            }}
        }))
        .unwrap()
    }

    #[test]
    fn parses_checkout_completed() {
        let parsed = parse_event(&checkout_event(json!({ "orgId": "7", "planType": "Elite" }))).unwrap();
        assert_eq!(parsed.id, "evt_1");
        assert_eq!(
            parsed.event,
            BillingEvent::CheckoutCompleted {
                org_id: 7,
                plan_type: "Elite".into(),
                customer_id: "cus_1".into(),
                subscription_id: "sub_1".into(),
            }
        );
    }

    #[test]
    fn missing_metadata_is_rejected() {
        let err = parse_event(&checkout_event(json!({ "planType": "Elite" }))).unwrap_err();
        assert!(matches!(err, AppError::WebhookRejected(_)));
    }

    #[test]
    fn unknown_events_are_ignored() {
        let body = serde_json::to_vec(&json!({
            "id": "evt_2", "type": "invoice.paid", "data": { "object": {} }
        }))
        .unwrap();
        assert_eq!(parse_event(&body).unwrap().event, BillingEvent::Ignored);
    }

    #[test]
    fn subscription_update_transitions() {
        assert_eq!(status_after_update("past_due"), Some(SubscriptionStatus::PastDue));
        assert_eq!(status_after_update("canceled"), Some(SubscriptionStatus::Canceled));
        assert_eq!(status_after_update("active"), None);
        assert_eq!(status_after_update("trialing"), None);
    }

    #[test]
    fn activation_takes_plan_quota_and_period_end() {
        let subscription: StripeSubscription = serde_json::from_value(json!({
            "id": "sub_1",
            "status": "active",
            "items": { "data": [ { "current_period_end": 1767225600 } ] }
        }))
        .unwrap();
        let activation = Activation::from_checkout("Master", "cus_1", &subscription);
        assert_eq!(activation.status, SubscriptionStatus::Active);
        assert_eq!(activation.unidade_limit, Some(3));
        assert_eq!(activation.current_period_end.map(|d| d.timestamp()), Some(1767225600));
    }

    #[test]
    fn checkout_rejects_custom_plan() {
        let payload = CreateCheckoutPayload { plan_type: "Imperial".into() };
        assert!(payload.validate().is_err());
        let payload = CreateCheckoutPayload { plan_type: "Pro".into() };
        assert!(payload.validate().is_ok());
    }
}
