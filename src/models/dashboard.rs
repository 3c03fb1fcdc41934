// src/models/dashboard.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::common::periods::MonthRef;

// Totais de um fechamento (uma linha por dia de caixa)
#[derive(Debug, Clone, FromRow)]
pub struct DailyTotals {
    pub data: NaiveDate,
    pub vendas: Decimal,
    pub despesas: Decimal,
    pub pagamentos: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthTotals {
    pub vendas: Decimal,
    pub despesas: Decimal,
    pub pagamentos: Decimal,
}

impl MonthTotals {
    /// Soma apenas os dias que caem dentro do mês.
    pub fn of_month(month: MonthRef, days: &[DailyTotals]) -> Self {
        days.iter()
            .filter(|day| month.contains(day.data))
            .fold(MonthTotals::default(), |acc, day| MonthTotals {
                vendas: acc.vendas + day.vendas,
                despesas: acc.despesas + day.despesas,
                pagamentos: acc.pagamentos + day.pagamentos,
            })
    }

    pub fn custos(&self) -> Decimal {
        self.despesas + self.pagamentos
    }

    pub fn saldo(&self) -> Decimal {
        self.vendas - self.custos()
    }
}

// 1. Os cards do topo
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub saldo_liquido_mes: Decimal,
    pub vendas_no_mes: Decimal,
    pub despesas_operacionais_mes: Decimal,
    pub custos_registrados_mes: Decimal,
    pub produto_mais_lucrativo: String,
    pub produto_menos_lucrativo: String,
}

// 2. Gráfico dos últimos 12 meses
#[derive(Debug, Serialize, ToSchema)]
pub struct MonthlySummaryItem {
    pub ano: i32,
    pub mes: u32,
    pub label: String,
    pub vendas: Decimal,
    pub custos: Decimal,
    pub saldo: Decimal,
}

impl MonthlySummaryItem {
    pub fn new(month: MonthRef, totals: MonthTotals) -> Self {
        Self {
            ano: month.ano,
            mes: month.mes,
            label: month.label(),
            vendas: totals.vendas,
            custos: totals.custos(),
            saldo: totals.saldo(),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    /// Ano de referência (padrão: ano atual)
    pub ano: Option<i32>,
    /// Mês de referência 1-12 (padrão: mês atual)
    pub mes: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(raw: &str) -> Decimal {
        raw.parse().unwrap()
    }

    fn day(y: i32, m: u32, dd: u32, vendas: &str, despesas: &str, pagamentos: &str) -> DailyTotals {
        DailyTotals {
            data: NaiveDate::from_ymd_opt(y, m, dd).unwrap(),
            vendas: d(vendas),
            despesas: d(despesas),
            pagamentos: d(pagamentos),
        }
    }

    #[test]
    fn bucket_ignores_day_inside_month() {
        let oct = MonthRef { ano: 2025, mes: 10 };
        let first = MonthTotals::of_month(oct, &[day(2025, 10, 1, "100", "10", "20")]);
        let last = MonthTotals::of_month(oct, &[day(2025, 10, 31, "100", "10", "20")]);
        assert_eq!(first, last);
        assert_eq!(first.saldo(), d("70"));
    }

    #[test]
    fn moving_a_record_across_the_boundary_rebalances_exactly() {
        let sep = MonthRef { ano: 2025, mes: 9 };
        let oct = MonthRef { ano: 2025, mes: 10 };
        let base = vec![day(2025, 9, 15, "500", "50", "0"), day(2025, 10, 15, "800", "0", "100")];

        let mut moved = base.clone();
        moved.push(day(2025, 9, 30, "40", "0", "0"));
        let mut moved_next = base.clone();
        moved_next.push(day(2025, 10, 1, "40", "0", "0"));

        let sep_a = MonthTotals::of_month(sep, &moved);
        let oct_a = MonthTotals::of_month(oct, &moved);
        let sep_b = MonthTotals::of_month(sep, &moved_next);
        let oct_b = MonthTotals::of_month(oct, &moved_next);

        assert_eq!(sep_a.vendas - sep_b.vendas, d("40"));
        assert_eq!(oct_b.vendas - oct_a.vendas, d("40"));
        assert_eq!(sep_a.saldo() + oct_a.saldo(), sep_b.saldo() + oct_b.saldo());
    }

    #[test]
    fn summary_item_counts_expenses_and_payments_as_costs() {
        let item = MonthlySummaryItem::new(
            MonthRef { ano: 2025, mes: 10 },
            MonthTotals { vendas: d("1000"), despesas: d("150"), pagamentos: d("250") },
        );
        assert_eq!(item.custos, d("400"));
        assert_eq!(item.saldo, d("600"));
        assert_eq!(item.label, "out./25");
    }
}
