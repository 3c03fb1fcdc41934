// src/models/insumo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::validation::{validate_unit_label, validate_not_negative};

// Matéria-prima comprada pela organização (compartilhada entre as unidades)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Insumo {
    pub id: i32,
    pub nome: String,
    pub unidade_compra: String,
    pub valor_unidade_compra: Decimal,
    #[serde(rename = "organizationId")]
    pub organization_id: i32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateInsumoPayload {
    #[validate(length(min = 1, message = "O nome não pode estar vazio."))]
    pub nome: String,

    #[validate(custom(function = "validate_unit_label"))]
    pub unidade_compra: String,

    #[validate(custom(function = "validate_not_negative"))]
    pub valor_unidade_compra: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateInsumoPayload {
    #[validate(length(min = 1, message = "O nome não pode estar vazio."))]
    pub nome: Option<String>,

    #[validate(custom(function = "validate_unit_label"))]
    pub unidade_compra: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    pub valor_unidade_compra: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_purchase_unit() {
        let payload: CreateInsumoPayload = serde_json::from_value(serde_json::json!({
            "nome": "Farinha",
            "unidade_compra": " ",
            "valor_unidade_compra": 25.9
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("unidade_compra"));
    }

    #[test]
    fn accepts_custom_purchase_unit() {
        let payload: CreateInsumoPayload = serde_json::from_value(serde_json::json!({
            "nome": "Farinha",
            "unidade_compra": "saco",
            "valor_unidade_compra": 25.9
        }))
        .unwrap();
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn partial_update_only_checks_present_fields() {
        let payload: UpdateInsumoPayload =
            serde_json::from_value(serde_json::json!({ "valor_unidade_compra": 7.5 })).unwrap();
        assert!(payload.validate().is_ok());
    }
}
