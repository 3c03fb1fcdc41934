// src/services/billing_service.rs

use sqlx::PgPool;

use crate::{
    common::error::{AppError, Resource},
    db::{BillingRepository, OrganizationRepository},
    models::{
        auth::Claims,
        billing::{parse_event, status_after_update, Activation, BillingEvent, CheckoutResponse},
        organization::PlanType,
    },
    services::stripe::{verify_signature, StripeClient},
};

#[derive(Clone)]
pub struct BillingService {
    stripe: StripeClient,
    org_repo: OrganizationRepository,
    billing_repo: BillingRepository,
    client_url: String,
    pool: PgPool,
}

impl BillingService {
    pub fn new(
        stripe: StripeClient,
        org_repo: OrganizationRepository,
        billing_repo: BillingRepository,
        client_url: String,
        pool: PgPool,
    ) -> Self {
        Self { stripe, org_repo, billing_repo, client_url, pool }
    }

    /// Abre o checkout de um plano. O cliente no Stripe é criado na primeira vez.
    pub async fn create_checkout(&self, claims: &Claims, plan_type: &str) -> Result<CheckoutResponse, AppError> {
        let plan = PlanType::parse(plan_type)
            .filter(PlanType::is_self_service)
            .ok_or_else(|| AppError::InvalidParameter("Plano inválido.".into()))?;

        let org = self
            .org_repo
            .find_by_id(claims.org_id)
            .await?
            .ok_or(AppError::NotFound(Resource::Organization))?;

        let customer_id = match org.stripe_customer_id {
            Some(id) => id,
            None => {
                let customer = self
                    .stripe
                    .create_customer(claims.email.as_deref(), &org.name, org.id)
                    .await?;
                self.org_repo.set_stripe_customer(org.id, &customer.id).await?;
                tracing::info!(org_id = org.id, customer_id = %customer.id, "Cliente criado no Stripe");
                customer.id
            }
        };

        let session = self
            .stripe
            .create_checkout_session(&customer_id, plan, org.id, &self.client_url)
            .await?;

        let url = session
            .url
            .ok_or_else(|| AppError::PaymentProvider("Sessão de checkout sem URL.".into()))?;
        Ok(CheckoutResponse { url })
    }

    /// Processa um evento do Stripe. Qualquer falha de assinatura ou de
    /// conteúdo aborta antes de tocar no banco; eventos repetidos são ignorados.
    pub async fn handle_webhook(
        &self,
        signature: Option<&str>,
        body: &[u8],
        now: i64,
    ) -> Result<(), AppError> {
        let signature = signature
            .ok_or_else(|| AppError::WebhookRejected("Cabeçalho Stripe-Signature ausente.".into()))?;
        verify_signature(signature, body, self.stripe.webhook_secret()?, now)?;

        let parsed = parse_event(body)?;
        tracing::info!(event_id = %parsed.id, event_type = %parsed.event_type, "Webhook do Stripe recebido");

        match parsed.event {
            BillingEvent::CheckoutCompleted { org_id, plan_type, customer_id, subscription_id } => {
                let subscription = self.stripe.retrieve_subscription(&subscription_id).await?;
                let activation = Activation::from_checkout(&plan_type, &customer_id, &subscription);
                self.activate(&parsed.id, &parsed.event_type, org_id, &activation).await?;
            }
            BillingEvent::SubscriptionUpdated { subscription_id, status } => {
                let mut tx = self.pool.begin().await?;
                if !self.billing_repo.record_event(&mut *tx, &parsed.id, &parsed.event_type).await? {
                    tracing::info!(event_id = %parsed.id, "Evento já processado");
                    return Ok(());
                }
                if let Some(new_status) = status_after_update(&status) {
                    self.org_repo
                        .update_status_by_subscription(&mut *tx, &subscription_id, new_status)
                        .await?;
                    tracing::info!(subscription_id = %subscription_id, status = ?new_status, "Status da assinatura atualizado");
                }
                tx.commit().await?;
            }
            BillingEvent::Ignored => {
                tracing::debug!(event_type = %parsed.event_type, "Evento não tratado");
            }
        }

        Ok(())
    }

    /// Grava o evento e ativa a organização na mesma transação.
    /// Devolve `false` quando o evento já tinha sido processado.
    async fn activate(
        &self,
        event_id: &str,
        event_type: &str,
        org_id: i32,
        activation: &Activation,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;
        if !self.billing_repo.record_event(&mut *tx, event_id, event_type).await? {
            tracing::info!(event_id = %event_id, "Evento já processado");
            return Ok(false);
        }
        let updated = self.org_repo.apply_activation(&mut *tx, org_id, activation).await?;
        tx.commit().await?;

        if updated == 0 {
            tracing::warn!(org_id, "Checkout concluído para organização inexistente");
        } else {
            tracing::info!(org_id, plan = %activation.plan_type, "Assinatura ativada");
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmac::{Hmac, Mac};
    use serde_json::json;
    use sha2::Sha256;

    use crate::{
        models::{billing::StripeSubscription, organization::SubscriptionStatus},
        services::stripe::StripeSettings,
    };

    const SECRET: &str = "whsec_teste";

    fn service(pool: PgPool) -> BillingService {
        let stripe = StripeClient::new(StripeSettings {
            webhook_secret: Some(SECRET.into()),
            ..Default::default()
        });
        BillingService::new(
            stripe,
            OrganizationRepository::new(pool.clone()),
            BillingRepository::new(),
            "http://localhost:3000".into(),
            pool,
        )
    }

    fn subscription(id: &str) -> StripeSubscription {
        StripeSubscription {
            id: id.into(),
            status: "active".into(),
            current_period_end: Some(1_767_225_600),
            items: None,
        }
    }

    fn signed(body: &[u8], t: i64) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(format!("{t}.").as_bytes());
        mac.update(body);
        format!("t={},v1={}", t, hex::encode(mac.finalize().into_bytes()))
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn checkout_activates_the_organization_with_plan_quota(pool: PgPool) {
        let service = service(pool.clone());
        let org = service.org_repo.create(&pool, "Padaria Central").await.unwrap();
        assert_eq!(org.subscription_status, SubscriptionStatus::Incomplete);

        let activation = Activation::from_checkout("Elite", "cus_1", &subscription("sub_1"));
        let applied = service
            .activate("evt_checkout_1", "checkout.session.completed", org.id, &activation)
            .await
            .unwrap();
        assert!(applied);

        let org = service.org_repo.find_by_id(org.id).await.unwrap().unwrap();
        assert_eq!(org.subscription_status, SubscriptionStatus::Active);
        assert_eq!(org.plan_type, "Elite");
        assert_eq!(org.unidade_limit, Some(2));
        assert_eq!(org.stripe_customer_id.as_deref(), Some("cus_1"));
        assert_eq!(org.subscription_id.as_deref(), Some("sub_1"));
        assert!(org.current_period_end.is_some());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn replayed_checkout_event_writes_nothing(pool: PgPool) {
        let service = service(pool.clone());
        let org = service.org_repo.create(&pool, "Padaria Central").await.unwrap();

        let first = Activation::from_checkout("Elite", "cus_1", &subscription("sub_1"));
        assert!(service.activate("evt_dup", "checkout.session.completed", org.id, &first).await.unwrap());

        let second = Activation::from_checkout("Master", "cus_2", &subscription("sub_2"));
        assert!(!service.activate("evt_dup", "checkout.session.completed", org.id, &second).await.unwrap());

        let org = service.org_repo.find_by_id(org.id).await.unwrap().unwrap();
        assert_eq!(org.plan_type, "Elite");
        assert_eq!(org.unidade_limit, Some(2));
        assert_eq!(org.subscription_id.as_deref(), Some("sub_1"));

        let (events,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM billing_events WHERE id = 'evt_dup'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(events, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn signed_subscription_update_marks_past_due_once(pool: PgPool) {
        let service = service(pool.clone());
        let org = service.org_repo.create(&pool, "Padaria Central").await.unwrap();
        let activation = Activation::from_checkout("Pro", "cus_1", &subscription("sub_1"));
        service.activate("evt_checkout", "checkout.session.completed", org.id, &activation).await.unwrap();

        let body = serde_json::to_vec(&json!({
            "id": "evt_update",
            "type": "customer.subscription.updated",
            "data": { "object": { "id": "sub_1", "status": "past_due" } }
        }))
        .unwrap();
        let now = 1_760_000_000;
        service.handle_webhook(Some(&signed(&body, now)), &body, now).await.unwrap();

        let org_after = service.org_repo.find_by_id(org.id).await.unwrap().unwrap();
        assert_eq!(org_after.subscription_status, SubscriptionStatus::PastDue);

        // Reativa por fora: o mesmo evento reenviado não pode derrubar de novo
        sqlx::query("UPDATE organizations SET subscription_status = 'ACTIVE' WHERE id = $1")
            .bind(org.id)
            .execute(&pool)
            .await
            .unwrap();
        service.handle_webhook(Some(&signed(&body, now)), &body, now).await.unwrap();

        let org_after = service.org_repo.find_by_id(org.id).await.unwrap().unwrap();
        assert_eq!(org_after.subscription_status, SubscriptionStatus::Active);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn bad_signature_touches_nothing(pool: PgPool) {
        let service = service(pool.clone());
        let body = br#"{"id":"evt_x","type":"customer.subscription.updated","data":{"object":{"id":"sub_1","status":"canceled"}}}"#;
        let err = service
            .handle_webhook(Some("t=1760000000,v1=00"), body, 1_760_000_000)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::WebhookRejected(_)));

        let (events,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM billing_events")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(events, 0);
    }
}
