// src/services/dashboard_service.rs

use chrono::NaiveDate;

use crate::{
    common::{
        error::AppError,
        periods::{trailing_months, MonthRef},
    },
    db::DashboardRepository,
    models::dashboard::{DailyTotals, DashboardStats, MonthTotals, MonthlySummaryItem},
};

const SUMMARY_MONTHS: usize = 12;
const SEM_RECEITA: &str = "N/D";

pub fn build_stats(totals: MonthTotals, mais: Option<String>, menos: Option<String>) -> DashboardStats {
    DashboardStats {
        saldo_liquido_mes: totals.saldo(),
        vendas_no_mes: totals.vendas,
        despesas_operacionais_mes: totals.despesas,
        custos_registrados_mes: totals.pagamentos,
        produto_mais_lucrativo: mais.unwrap_or_else(|| SEM_RECEITA.to_string()),
        produto_menos_lucrativo: menos.unwrap_or_else(|| SEM_RECEITA.to_string()),
    }
}

/// Série mensal a partir dos totais diários de toda a janela.
pub fn summarize(months: &[MonthRef], days: &[DailyTotals]) -> Vec<MonthlySummaryItem> {
    months
        .iter()
        .map(|month| MonthlySummaryItem::new(*month, MonthTotals::of_month(*month, days)))
        .collect()
}

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository) -> Self {
        Self { repo }
    }

    pub async fn stats(&self, unidade_id: i32, month: MonthRef) -> Result<DashboardStats, AppError> {
        let (start, end) = month.date_range();
        let days = self.repo.daily_totals(unidade_id, start, end).await?;
        let totals = MonthTotals::of_month(month, &days);

        let mais = self.repo.most_profitable(unidade_id).await?;
        let menos = self.repo.least_profitable(unidade_id).await?;

        Ok(build_stats(totals, mais, menos))
    }

    // Uma única consulta cobre os 12 meses; o agrupamento é feito aqui
    pub async fn monthly_summary(
        &self,
        unidade_id: i32,
        today: NaiveDate,
    ) -> Result<Vec<MonthlySummaryItem>, AppError> {
        let months = trailing_months(today, SUMMARY_MONTHS);
        let (Some(first), Some(last)) = (months.first(), months.last()) else {
            return Ok(Vec::new());
        };

        let days = self
            .repo
            .daily_totals(unidade_id, first.first_day(), last.last_day())
            .await?;

        Ok(summarize(&months, &days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

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
    fn stats_split_expenses_and_registered_costs() {
        let month = MonthRef::new(2025, 10).unwrap();
        let days = vec![
            day(2025, 10, 1, "1000", "100", "200"),
            day(2025, 10, 31, "500", "50", "0"),
        ];
        let stats = build_stats(MonthTotals::of_month(month, &days), Some("Bolo".into()), None);
        assert_eq!(stats.vendas_no_mes, d("1500"));
        assert_eq!(stats.despesas_operacionais_mes, d("150"));
        assert_eq!(stats.custos_registrados_mes, d("200"));
        assert_eq!(stats.saldo_liquido_mes, d("1150"));
        assert_eq!(stats.produto_mais_lucrativo, "Bolo");
        assert_eq!(stats.produto_menos_lucrativo, "N/D");
    }

    #[test]
    fn summary_has_twelve_months_oldest_first() {
        let today = NaiveDate::from_ymd_opt(2025, 10, 20).unwrap();
        let months = trailing_months(today, SUMMARY_MONTHS);
        let days = vec![
            day(2024, 11, 3, "10", "1", "1"),
            day(2025, 10, 20, "300", "20", "30"),
            // fora da janela
            day(2024, 10, 31, "999", "0", "0"),
        ];
        let summary = summarize(&months, &days);
        assert_eq!(summary.len(), 12);
        assert_eq!(summary[0].label, "nov./24");
        assert_eq!(summary[0].vendas, d("10"));
        assert_eq!(summary[11].label, "out./25");
        assert_eq!(summary[11].custos, d("50"));
        assert_eq!(summary[11].saldo, d("250"));
        let total: Decimal = summary.iter().map(|m| m.vendas).sum();
        assert_eq!(total, d("310"));
    }
}
