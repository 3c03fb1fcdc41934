// src/models/receita.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::validation::{validate_unit_label, validate_not_negative, validate_positive};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Receita {
    pub id: i32,
    pub nome: String,
    pub rendimento_porcoes: Option<i32>,
    pub lucro_desejado: Decimal,
    pub valor_praticado: Decimal,
    #[serde(rename = "unidadeId")]
    pub unidade_id: i32,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

// Listagem: só o necessário para o menu lateral
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ReceitaResumo {
    pub id: i32,
    pub nome: String,
}

// Linha de receita_insumos já com os dados de compra do insumo (JOIN)
#[derive(Debug, Clone, FromRow)]
pub struct ReceitaInsumoRow {
    pub id: i32,
    pub receita_id: i32,
    pub insumo_id: i32,
    pub quantidade_usada: Decimal,
    pub medida_usada: String,
    pub insumo_nome: String,
    pub unidade_compra: String,
    pub valor_unidade_compra: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InsumoBase {
    pub id: i32,
    pub nome: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InsumoCalculado {
    pub id: i32,
    #[serde(rename = "receitaId")]
    pub receita_id: i32,
    #[serde(rename = "insumoId")]
    pub insumo_id: i32,
    pub quantidade_usada: Decimal,
    pub medida_usada: String,
    pub custo: Decimal,
    pub insumo: InsumoBase,
}

/// Receita com os custos calculados na leitura.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReceitaDetalhada {
    pub id: i32,
    pub nome: String,
    pub rendimento_porcoes: Option<i32>,
    pub lucro_desejado: Decimal,
    pub valor_praticado: Decimal,
    #[serde(rename = "unidadeId")]
    pub unidade_id: i32,
    pub insumos: Vec<InsumoCalculado>,
    #[serde(rename = "custoTotalReceita")]
    pub custo_total_receita: Decimal,
    #[serde(rename = "precoSugeridoTotal")]
    pub preco_sugerido_total: Decimal,
    #[serde(rename = "precoSugeridoPorcao")]
    pub preco_sugerido_porcao: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReceitaInsumoPayload {
    #[serde(rename = "insumoId")]
    pub insumo_id: i32,

    #[validate(custom(function = "validate_positive"))]
    pub quantidade_usada: Decimal,

    #[validate(custom(function = "validate_unit_label"))]
    pub medida_usada: String, // Ex: "g", "kg", "ml", "l", "unidade"
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReceitaPayload {
    #[validate(length(min = 1, message = "O nome não pode estar vazio."))]
    pub nome: String,

    pub rendimento_porcoes: Option<i32>,

    // Em porcentagem, ex: 30
    #[validate(custom(function = "validate_not_negative"))]
    pub lucro_desejado: Decimal,

    #[validate(nested)]
    pub insumos: Vec<ReceitaInsumoPayload>,
}

// Todos os campos opcionais. Se `insumos` vier, a lista inteira é substituída.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateReceitaPayload {
    #[validate(length(min = 1, message = "O nome não pode estar vazio."))]
    pub nome: Option<String>,

    pub rendimento_porcoes: Option<i32>,

    #[validate(custom(function = "validate_not_negative"))]
    pub lucro_desejado: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    pub valor_praticado: Option<Decimal>,

    #[validate(nested)]
    pub insumos: Option<Vec<ReceitaInsumoPayload>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_line_items_are_validated() {
        let payload: CreateReceitaPayload = serde_json::from_value(json!({
            "nome": "Pão de queijo",
            "lucro_desejado": 30,
            "insumos": [
                { "insumoId": 1, "quantidade_usada": 500, "medida_usada": "g" },
                { "insumoId": 2, "quantidade_usada": 0, "medida_usada": "colher" }
            ]
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn price_update_alone_is_valid() {
        let payload: UpdateReceitaPayload =
            serde_json::from_value(json!({ "valor_praticado": 12.5 })).unwrap();
        assert!(payload.validate().is_ok());
        assert!(payload.insumos.is_none());
    }
}
