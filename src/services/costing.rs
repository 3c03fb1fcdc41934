// src/services/costing.rs

use rust_decimal::{Decimal, RoundingStrategy};

// Fator para a unidade base (g, ml ou unidade)
const BASE_UNITS: [(&str, u32); 16] = [
    ("kilo", 1000),
    ("quilo", 1000),
    ("kilograma", 1000),
    ("kg", 1000),
    ("grama", 1),
    ("gramas", 1),
    ("g", 1),
    ("litro", 1000),
    ("litros", 1000),
    ("l", 1000),
    ("mililitro", 1),
    ("mililitros", 1),
    ("ml", 1),
    ("unidade", 1),
    ("unidades", 1),
    ("un", 1),
];

/// Fator de conversão para a base, sem diferenciar maiúsculas. `None` se desconhecida.
pub fn base_factor(unit: &str) -> Option<Decimal> {
    let normalized = unit.trim().to_lowercase();
    BASE_UNITS
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, factor)| Decimal::from(*factor))
}

// Registros antigos podem ter unidades fora da tabela: tratamos como fator 1
fn factor_or_one(unit: &str) -> Decimal {
    base_factor(unit).unwrap_or_else(|| {
        tracing::warn!(unidade = unit, "Unidade de medida desconhecida, usando fator 1");
        Decimal::ONE
    })
}

fn same_label(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// A medida de uso combina com a de compra? Unidades fora da tabela só
/// valem quando são o mesmo rótulo dos dois lados.
pub fn units_compatible(unidade_compra: &str, medida_usada: &str) -> bool {
    same_label(unidade_compra, medida_usada)
        || (base_factor(unidade_compra).is_some() && base_factor(medida_usada).is_some())
}

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Um insumo usado na receita, com o preço de compra do cadastro.
#[derive(Debug, Clone)]
pub struct CostLine {
    pub unidade_compra: String,
    pub valor_unidade_compra: Decimal,
    pub quantidade_usada: Decimal,
    pub medida_usada: String,
}

impl CostLine {
    /// Custo sem arredondamento: (preço / fator de compra) * (quantidade * fator de uso)
    fn raw_cost(&self) -> Decimal {
        if same_label(&self.unidade_compra, &self.medida_usada) {
            return self.valor_unidade_compra * self.quantidade_usada;
        }
        let preco_por_base = self.valor_unidade_compra / factor_or_one(&self.unidade_compra);
        let quantidade_na_base = self.quantidade_usada * factor_or_one(&self.medida_usada);
        preco_por_base * quantidade_na_base
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipeCost {
    /// Custo de cada linha, na mesma ordem da entrada, arredondado.
    pub custos_linhas: Vec<Decimal>,
    pub custo_total: Decimal,
    pub preco_sugerido_total: Decimal,
    pub preco_sugerido_porcao: Decimal,
}

/// Custo e preço sugerido de uma receita.
///
/// O total soma os custos sem arredondar e só arredonda no fim; o preço sugerido
/// parte desse total bruto. Sem rendimento (ou rendimento <= 0) o preço por porção é 0.
pub fn calculate(lines: &[CostLine], lucro_desejado: Decimal, rendimento_porcoes: Option<i32>) -> RecipeCost {
    let raw_costs: Vec<Decimal> = lines.iter().map(CostLine::raw_cost).collect();
    let total: Decimal = raw_costs.iter().copied().sum();

    let multiplicador = Decimal::ONE + lucro_desejado / Decimal::ONE_HUNDRED;
    let preco_total = total * multiplicador;

    let preco_porcao = match rendimento_porcoes {
        Some(porcoes) if porcoes > 0 => preco_total / Decimal::from(porcoes),
        _ => Decimal::ZERO,
    };

    RecipeCost {
        custos_linhas: raw_costs.into_iter().map(round_money).collect(),
        custo_total: round_money(total),
        preco_sugerido_total: round_money(preco_total),
        preco_sugerido_porcao: round_money(preco_porcao),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(raw: &str) -> Decimal {
        raw.parse().unwrap()
    }

    fn line(compra: &str, preco: &str, qtd: &str, uso: &str) -> CostLine {
        CostLine {
            unidade_compra: compra.into(),
            valor_unidade_compra: d(preco),
            quantidade_usada: d(qtd),
            medida_usada: uso.into(),
        }
    }

    #[test]
    fn half_kilo_of_a_ten_real_kilo_costs_five() {
        let cost = calculate(&[line("kg", "10.00", "500", "g")], d("0"), None);
        assert_eq!(cost.custos_linhas, vec![d("5.00")]);
        assert_eq!(cost.custo_total, d("5.00"));
    }

    #[test]
    fn suggested_price_applies_margin_over_cost() {
        let cost = calculate(&[line("kg", "10.00", "500", "g")], d("30"), Some(10));
        assert_eq!(cost.preco_sugerido_total, d("6.50"));
        assert_eq!(cost.preco_sugerido_porcao, d("0.65"));
    }

    #[test]
    fn per_portion_is_zero_without_portions() {
        let lines = [line("l", "8", "250", "ml")];
        assert_eq!(calculate(&lines, d("50"), None).preco_sugerido_porcao, Decimal::ZERO);
        assert_eq!(calculate(&lines, d("50"), Some(0)).preco_sugerido_porcao, Decimal::ZERO);
        assert_eq!(calculate(&lines, d("50"), Some(-3)).preco_sugerido_porcao, Decimal::ZERO);
    }

    #[test]
    fn total_sums_unrounded_line_costs() {
        // 3 linhas de 0.333.. cada: arredondadas viram 0.33, mas o total bruto é 1.00
        let lines = [
            line("un", "1", "0.333333", "un"),
            line("un", "1", "0.333333", "un"),
            line("un", "1", "0.333334", "un"),
        ];
        let cost = calculate(&lines, d("0"), None);
        assert_eq!(cost.custos_linhas, vec![d("0.33"), d("0.33"), d("0.33")]);
        assert_eq!(cost.custo_total, d("1.00"));
    }

    #[test]
    fn units_are_case_insensitive_and_unknown_falls_back_to_one() {
        assert_eq!(base_factor("Quilo"), Some(d("1000")));
        assert_eq!(base_factor(" ML "), Some(d("1")));
        assert_eq!(base_factor("xícara"), None);

        // "pitada" desconhecida: fator 1 dos dois lados
        let cost = calculate(&[line("pitada", "2", "3", "pitada")], d("0"), None);
        assert_eq!(cost.custo_total, d("6.00"));
    }

    #[test]
    fn custom_units_must_match_the_purchase_label() {
        assert!(units_compatible("kg", "g"));
        assert!(units_compatible("Saco", " saco "));
        assert!(!units_compatible("saco", "kg"));
        assert!(!units_compatible("l", "xícara"));

        let cost = calculate(&[line("Saco", "25.90", "2", "saco")], d("0"), None);
        assert_eq!(cost.custo_total, d("51.80"));
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_money(d("2.345")), d("2.35"));
        assert_eq!(round_money(d("2.344")), d("2.34"));
    }

    #[test]
    fn empty_recipe_costs_nothing() {
        let cost = calculate(&[], d("30"), Some(4));
        assert_eq!(cost.custo_total, Decimal::ZERO);
        assert_eq!(cost.preco_sugerido_total, Decimal::ZERO);
    }
}
