// src/common/validation.rs

use rust_decimal::Decimal;
use validator::ValidationError;

// ---
// Validações Customizadas compartilhadas pelos payloads
// ---

pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.add_param("exclusive_min".into(), &0.0);
        err.message = Some("O valor deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

// Rótulo de unidade: qualquer texto não vazio. A compatibilidade com a
// unidade de compra é conferida na receita, onde as duas são conhecidas.
pub fn validate_unit_label(unit: &str) -> Result<(), ValidationError> {
    if unit.trim().is_empty() {
        let mut err = ValidationError::new("unit_label");
        err.message = Some("A unidade de medida não pode estar vazia.".into());
        return Err(err);
    }
    Ok(())
}
