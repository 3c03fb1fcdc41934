// src/models/organization.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "subscription_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Incomplete,
    Active,
    PastDue,
    Canceled,
}

// Planos comercializados. Imperial é "sob consulta" e não passa pelo checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PlanType {
    Pro,
    Elite,
    Master,
    Imperial,
}

impl PlanType {
    pub fn parse(raw: &str) -> Option<PlanType> {
        match raw {
            "Pro" => Some(PlanType::Pro),
            "Elite" => Some(PlanType::Elite),
            "Master" => Some(PlanType::Master),
            "Imperial" => Some(PlanType::Imperial),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Pro => "Pro",
            PlanType::Elite => "Elite",
            PlanType::Master => "Master",
            PlanType::Imperial => "Imperial",
        }
    }

    /// Limite de unidades do plano. `None` = sem limite.
    pub fn unit_limit(&self) -> Option<i32> {
        match self {
            PlanType::Pro => Some(1),
            PlanType::Elite => Some(2),
            PlanType::Master => Some(3),
            PlanType::Imperial => None,
        }
    }

    pub fn is_self_service(&self) -> bool {
        !matches!(self, PlanType::Imperial)
    }
}

/// Limite para um nome de plano qualquer. Nome desconhecido cai no limite mínimo (1).
pub fn unit_limit_for_plan(name: &str) -> Option<i32> {
    PlanType::parse(name).map_or(Some(1), |plan| plan.unit_limit())
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: i32,
    pub name: String,
    pub plan_type: String,
    pub unidade_limit: Option<i32>,
    pub subscription_status: SubscriptionStatus,
    pub stripe_customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Unidade {
    pub id: i32,
    pub name: String,
    pub organization_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUnidadePayload {
    #[validate(length(min = 1, message = "O nome da unidade não pode estar vazio."))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUnidadePayload {
    #[validate(length(min = 1, message = "O nome da unidade não pode estar vazio."))]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_tiers_map_to_unit_limits() {
        assert_eq!(unit_limit_for_plan("Pro"), Some(1));
        assert_eq!(unit_limit_for_plan("Elite"), Some(2));
        assert_eq!(unit_limit_for_plan("Master"), Some(3));
        assert_eq!(unit_limit_for_plan("Imperial"), None);
        assert_eq!(unit_limit_for_plan("Platinum"), Some(1));
    }

    #[test]
    fn status_serializes_like_the_database_enum() {
        let json = serde_json::to_string(&SubscriptionStatus::PastDue).unwrap();
        assert_eq!(json, "\"PAST_DUE\"");
    }
}
