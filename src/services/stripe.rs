// src/services/stripe.rs

use hmac::{Hmac, Mac};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use sha2::Sha256;

use crate::{
    common::error::AppError,
    models::{
        billing::{StripeCheckoutSession, StripeCustomer, StripeSubscription},
        organization::PlanType,
    },
};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

// Janela aceita entre o timestamp assinado e o relógio do servidor
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

// Chaves e preços vindos do ambiente. Tudo opcional: a falta só vira erro
// quando uma operação de cobrança realmente precisa do valor.
#[derive(Debug, Clone, Default)]
pub struct StripeSettings {
    pub api_key: Option<String>,
    pub webhook_secret: Option<String>,
    pub pro_price_id: Option<String>,
    pub elite_price_id: Option<String>,
    pub master_price_id: Option<String>,
}

#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    settings: StripeSettings,
}

impl StripeClient {
    pub fn new(settings: StripeSettings) -> Self {
        Self { http: reqwest::Client::new(), settings }
    }

    fn api_key(&self) -> Result<&str, AppError> {
        self.settings
            .api_key
            .as_deref()
            .ok_or(AppError::MissingConfiguration("STRIPE_API_KEY"))
    }

    pub fn webhook_secret(&self) -> Result<&str, AppError> {
        self.settings
            .webhook_secret
            .as_deref()
            .ok_or(AppError::MissingConfiguration("STRIPE_WEBHOOK_SECRET"))
    }

    /// Price id do Stripe para um plano de autoatendimento.
    pub fn price_for(&self, plan: PlanType) -> Result<&str, AppError> {
        let (price, key) = match plan {
            PlanType::Pro => (&self.settings.pro_price_id, "STRIPE_PRO_PRICE_ID"),
            PlanType::Elite => (&self.settings.elite_price_id, "STRIPE_ELITE_PRICE_ID"),
            PlanType::Master => (&self.settings.master_price_id, "STRIPE_MASTER_PRICE_ID"),
            PlanType::Imperial => {
                return Err(AppError::InvalidParameter("Plano inválido.".into()));
            }
        };
        price.as_deref().ok_or(AppError::MissingConfiguration(key))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AppError> {
        let response = request
            .bearer_auth(self.api_key()?)
            .send()
            .await
            .map_err(|e| AppError::PaymentProvider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "Stripe recusou a requisição");
            return Err(AppError::PaymentProvider(format!("HTTP {}", status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::PaymentProvider(e.to_string()))
    }

    pub async fn create_customer(
        &self,
        email: Option<&str>,
        name: &str,
        org_id: i32,
    ) -> Result<StripeCustomer, AppError> {
        let org = org_id.to_string();
        let mut form = vec![("name", name), ("metadata[orgId]", org.as_str())];
        if let Some(email) = email {
            form.push(("email", email));
        }
        self.send(self.http.post(format!("{STRIPE_API_BASE}/customers")).form(&form))
            .await
    }

    /// Sessão de checkout de assinatura. orgId e planType vão nos metadados
    /// para o webhook saber a quem aplicar o plano.
    pub async fn create_checkout_session(
        &self,
        customer_id: &str,
        plan: PlanType,
        org_id: i32,
        client_url: &str,
    ) -> Result<StripeCheckoutSession, AppError> {
        let price = self.price_for(plan)?;
        let org = org_id.to_string();
        let success_url = format!("{client_url}/payment-success?session_id={{CHECKOUT_SESSION_ID}}");
        let cancel_url = format!("{client_url}/planos");

        let form = [
            ("mode", "subscription"),
            ("customer", customer_id),
            ("line_items[0][price]", price),
            ("line_items[0][quantity]", "1"),
            ("success_url", success_url.as_str()),
            ("cancel_url", cancel_url.as_str()),
            ("metadata[orgId]", org.as_str()),
            ("metadata[planType]", plan.as_str()),
            ("subscription_data[metadata][orgId]", org.as_str()),
        ];
        self.send(self.http.post(format!("{STRIPE_API_BASE}/checkout/sessions")).form(&form))
            .await
    }

    pub async fn retrieve_subscription(&self, id: &str) -> Result<StripeSubscription, AppError> {
        self.send(self.http.get(format!("{STRIPE_API_BASE}/subscriptions/{id}")))
            .await
    }

    pub async fn retrieve_checkout_session(&self, id: &str) -> Result<StripeCheckoutSession, AppError> {
        self.send(self.http.get(format!("{STRIPE_API_BASE}/checkout/sessions/{id}")))
            .await
    }
}

/// Confere o cabeçalho `Stripe-Signature` (`t=...,v1=...`) contra o corpo cru.
/// `now` é o relógio atual em segundos.
pub fn verify_signature(header: &str, body: &[u8], secret: &str, now: i64) -> Result<(), AppError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| AppError::WebhookRejected("Assinatura sem timestamp.".into()))?;
    if signatures.is_empty() {
        return Err(AppError::WebhookRejected("Assinatura sem v1.".into()));
    }
    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(AppError::WebhookRejected("Timestamp fora da tolerância.".into()));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::InternalServerError(anyhow::anyhow!(e.to_string())))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);

    let matches = signatures.iter().any(|sig| {
        hex::decode(sig)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });

    if matches {
        Ok(())
    } else {
        Err(AppError::WebhookRejected("Assinatura inválida.".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";

    fn sign(body: &[u8], t: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(format!("{t}.").as_bytes());
        mac.update(body);
        format!("t={},v1={}", t, hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn accepts_valid_signature() {
        let body = br#"{"id":"evt_1"}"#;
        let header = sign(body, 1_700_000_000);
        assert!(verify_signature(&header, body, SECRET, 1_700_000_010).is_ok());
    }

    #[test]
    fn rejects_tampered_body() {
        let header = sign(br#"{"id":"evt_1"}"#, 1_700_000_000);
        let err = verify_signature(&header, br#"{"id":"evt_2"}"#, SECRET, 1_700_000_000).unwrap_err();
        assert!(matches!(err, AppError::WebhookRejected(_)));
    }

    #[test]
    fn rejects_stale_timestamp() {
        let body = b"{}";
        let header = sign(body, 1_700_000_000);
        let now = 1_700_000_000 + SIGNATURE_TOLERANCE_SECS + 1;
        assert!(verify_signature(&header, body, SECRET, now).is_err());
    }

    #[test]
    fn rejects_malformed_header() {
        assert!(verify_signature("", b"{}", SECRET, 0).is_err());
        assert!(verify_signature("t=abc,v1=00", b"{}", SECRET, 0).is_err());
        assert!(verify_signature("t=0", b"{}", SECRET, 0).is_err());
    }

    #[test]
    fn any_matching_v1_is_enough() {
        let body = b"{}";
        let valid = sign(body, 100);
        let header = format!("{},v1=deadbeef", valid.replace(",v1=", ",v1=00,v1="));
        assert!(verify_signature(&header, body, SECRET, 100).is_ok());
    }

    #[test]
    fn missing_billing_keys_are_configuration_errors() {
        let client = StripeClient::new(StripeSettings::default());
        assert!(matches!(client.webhook_secret(), Err(AppError::MissingConfiguration(_))));
        assert!(matches!(client.price_for(PlanType::Pro), Err(AppError::MissingConfiguration(_))));
        assert!(client.price_for(PlanType::Imperial).is_err());
    }
}
