// src/common/periods.rs

use chrono::{DateTime, Datelike, Months, NaiveDate};

use crate::common::error::AppError;

const MESES_ABREVIADOS: [&str; 12] = [
    "jan.", "fev.", "mar.", "abr.", "mai.", "jun.",
    "jul.", "ago.", "set.", "out.", "nov.", "dez.",
];

/// Um mês de calendário (ano + mês 1..=12).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRef {
    pub ano: i32,
    pub mes: u32,
}

impl MonthRef {
    pub fn new(ano: i32, mes: u32) -> Result<Self, AppError> {
        if !(1..=12).contains(&mes) {
            return Err(AppError::InvalidParameter(format!(
                "Mês inválido: {} (esperado entre 1 e 12).",
                mes
            )));
        }
        // Garante que o ano cabe no calendário do chrono
        NaiveDate::from_ymd_opt(ano, mes, 1)
            .ok_or_else(|| AppError::InvalidParameter(format!("Ano inválido: {}.", ano)))?;
        Ok(Self { ano, mes })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self { ano: date.year(), mes: date.month() }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.ano, self.mes, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Último dia do mês (o "dia 0" do mês seguinte).
    pub fn last_day(&self) -> NaiveDate {
        let first = self.first_day();
        first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(first)
    }

    /// Intervalo fechado [primeiro dia, último dia].
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        (self.first_day(), self.last_day())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let (start, end) = self.date_range();
        date >= start && date <= end
    }

    pub fn previous(&self) -> Self {
        if self.mes == 1 {
            Self { ano: self.ano - 1, mes: 12 }
        } else {
            Self { ano: self.ano, mes: self.mes - 1 }
        }
    }

    /// Rótulo curto usado no gráfico, ex: "out./25".
    pub fn label(&self) -> String {
        let idx = (self.mes as usize).saturating_sub(1).min(11);
        format!("{}/{:02}", MESES_ABREVIADOS[idx], self.ano.rem_euclid(100))
    }
}

/// Os últimos `count` meses até `today` (inclusive), do mais antigo para o mais recente.
pub fn trailing_months(today: NaiveDate, count: usize) -> Vec<MonthRef> {
    let mut months = Vec::with_capacity(count);
    let mut current = MonthRef::of(today);
    for _ in 0..count {
        months.push(current);
        current = current.previous();
    }
    months.reverse();
    months
}

/// Aceita "2025-10-20" ou um RFC 3339 completo ("2025-10-20T03:00:00.000Z").
/// No segundo caso vale o dia escrito, no fuso que veio junto.
pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .filter(|_| raw.len() == 10)
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .ok_or_else(|| {
            AppError::InvalidParameter(format!("Data inválida: '{}' (use AAAA-MM-DD).", raw))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_range_covers_whole_month() {
        let feb_leap = MonthRef::new(2024, 2).unwrap();
        assert_eq!(feb_leap.date_range(), (d(2024, 2, 1), d(2024, 2, 29)));

        let dec = MonthRef::new(2025, 12).unwrap();
        assert_eq!(dec.date_range(), (d(2025, 12, 1), d(2025, 12, 31)));
    }

    #[test]
    fn rejects_month_out_of_range() {
        assert!(MonthRef::new(2025, 0).is_err());
        assert!(MonthRef::new(2025, 13).is_err());
    }

    #[test]
    fn trailing_series_is_oldest_first_and_crosses_years() {
        let months = trailing_months(d(2025, 3, 15), 12);
        assert_eq!(months.len(), 12);
        assert_eq!(months.first(), Some(&MonthRef { ano: 2024, mes: 4 }));
        assert_eq!(months.last(), Some(&MonthRef { ano: 2025, mes: 3 }));
        assert!(months.windows(2).all(|w| w[0].next_is(w[1])));
    }

    #[test]
    fn labels_are_short_portuguese() {
        assert_eq!(MonthRef::new(2025, 10).unwrap().label(), "out./25");
        assert_eq!(MonthRef::new(2009, 1).unwrap().label(), "jan./09");
    }

    #[test]
    fn parses_plain_and_iso_dates() {
        assert_eq!(parse_date("2025-10-20").unwrap(), d(2025, 10, 20));
        assert_eq!(parse_date("2025-10-20T03:00:00.000Z").unwrap(), d(2025, 10, 20));
        assert_eq!(parse_date("2025-10-20T23:30:00-03:00").unwrap(), d(2025, 10, 20));
        assert!(parse_date("20/10/2025").is_err());
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        assert!(parse_date("2025-10-20xyz").is_err());
        assert!(parse_date("2025-10-20T").is_err());
        assert!(parse_date("2025-10-20 qualquer coisa").is_err());
        assert!(parse_date("2025-1-2").is_err());
    }

    impl MonthRef {
        fn next_is(&self, other: MonthRef) -> bool {
            other.previous() == *self
        }
    }
}
