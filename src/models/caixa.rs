// src/models/caixa.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::validation::{validate_not_negative, validate_positive};

// 1. Fechamento diário (um por unidade e data)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FechamentoCaixa {
    pub id: i32,
    pub data: NaiveDate,
    pub vendas_dinheiro: Decimal,
    pub vendas_cartao: Decimal,
    pub troco_dia_seguinte: Decimal,
    pub unidade_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DespesaDiaria {
    pub id: i32,
    pub descricao: String,
    pub valor: Decimal,
    pub fechamento_caixa_id: i32,
    pub created_at: DateTime<Utc>,
}

// 2. Pagamento de boleto/fornecedor feito com o dinheiro do caixa
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagamento {
    pub id: i32,
    pub descricao: String,
    pub valor: Decimal,
    pub data: NaiveDate,
    pub fechamento_caixa_id: i32,
    pub created_at: DateTime<Utc>,
}

// 3. Espelho mensal de um Pagamento (sempre PAGO)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_pagamento", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusPagamento {
    Pendente,
    Pago,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustoRegistrado {
    pub id: i32,
    pub nome: String,
    pub valor: Decimal,
    pub mes: i32,
    pub ano: i32,
    pub data_pagamento: NaiveDate,
    pub status: StatusPagamento,
    pub unidade_id: i32,
    pub pagamento_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Fechamento com as saídas do dia, no formato que a tela de caixa consome.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FechamentoCompleto {
    #[serde(flatten)]
    pub fechamento: FechamentoCaixa,
    pub pagamentos: Vec<Pagamento>,
    pub despesas_diarias: Vec<DespesaDiaria>,
}

impl FechamentoCompleto {
    pub fn vendas_totais(&self) -> Decimal {
        self.fechamento.vendas_dinheiro + self.fechamento.vendas_cartao
    }

    pub fn total_despesas(&self) -> Decimal {
        self.despesas_diarias.iter().map(|d| d.valor).sum()
    }

    pub fn total_pagamentos(&self) -> Decimal {
        self.pagamentos.iter().map(|p| p.valor).sum()
    }

    /// Saldo do dia no relatório: só as despesas operacionais saem das vendas.
    pub fn saldo_liquido(&self) -> Decimal {
        self.vendas_totais() - self.total_despesas()
    }
}

// Linha do relatório mensal de despesas (com a data do fechamento)
#[derive(Debug, Clone, FromRow)]
pub struct DespesaMensalRow {
    pub id: i32,
    pub descricao: String,
    pub valor: Decimal,
    pub fechamento_caixa_id: i32,
    pub created_at: DateTime<Utc>,
    pub data: NaiveDate,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DataFechamento {
    pub data: NaiveDate,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DespesaMensal {
    pub id: i32,
    pub descricao: String,
    pub valor: Decimal,
    pub fechamento_caixa_id: i32,
    pub created_at: DateTime<Utc>,
    pub fechamento_caixa: DataFechamento,
}

impl From<DespesaMensalRow> for DespesaMensal {
    fn from(row: DespesaMensalRow) -> Self {
        Self {
            id: row.id,
            descricao: row.descricao,
            valor: row.valor,
            fechamento_caixa_id: row.fechamento_caixa_id,
            created_at: row.created_at,
            fechamento_caixa: DataFechamento { data: row.data },
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCaixaPayload {
    #[validate(custom(function = "validate_not_negative"))]
    pub vendas_dinheiro: Option<Decimal>,
    #[validate(custom(function = "validate_not_negative"))]
    pub vendas_cartao: Option<Decimal>,
    #[validate(custom(function = "validate_not_negative"))]
    pub troco_dia_seguinte: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDespesaPayload {
    #[validate(length(min = 1, message = "A descrição não pode estar vazia."))]
    pub descricao: String,
    #[validate(custom(function = "validate_positive"))]
    pub valor: Decimal,
    pub fechamento_caixa_id: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePagamentoPayload {
    #[validate(length(min = 1, message = "A descrição não pode estar vazia."))]
    pub descricao: String,
    #[validate(custom(function = "validate_positive"))]
    pub valor: Decimal,
    // "AAAA-MM-DD" ou ISO completo
    #[validate(length(min = 10, message = "A data deve estar no formato AAAA-MM-DD."))]
    pub data: String,
    pub fechamento_caixa_id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(raw: &str) -> Decimal {
        raw.parse().unwrap()
    }

    fn fechamento() -> FechamentoCompleto {
        let now = Utc::now();
        let data = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        FechamentoCompleto {
            fechamento: FechamentoCaixa {
                id: 1,
                data,
                vendas_dinheiro: d("300"),
                vendas_cartao: d("700"),
                troco_dia_seguinte: d("50"),
                unidade_id: 1,
                created_at: now,
                updated_at: now,
            },
            pagamentos: vec![Pagamento {
                id: 1,
                descricao: "Fornecedor de farinha".into(),
                valor: d("200"),
                data,
                fechamento_caixa_id: 1,
                created_at: now,
            }],
            despesas_diarias: vec![DespesaDiaria {
                id: 1,
                descricao: "Gás".into(),
                valor: d("120"),
                fechamento_caixa_id: 1,
                created_at: now,
            }],
        }
    }

    #[test]
    fn daily_balance_only_subtracts_operational_expenses() {
        let f = fechamento();
        assert_eq!(f.vendas_totais(), d("1000"));
        assert_eq!(f.total_pagamentos(), d("200"));
        assert_eq!(f.saldo_liquido(), d("880"));
    }

    #[test]
    fn serializes_flat_with_children() {
        let json = serde_json::to_value(fechamento()).unwrap();
        assert_eq!(json["vendasDinheiro"], 300.0);
        assert_eq!(json["data"], "2025-10-20");
        assert_eq!(json["despesasDiarias"][0]["descricao"], "Gás");
        assert_eq!(json["pagamentos"][0]["fechamentoCaixaId"], 1);
    }
}
