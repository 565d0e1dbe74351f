use blt_common::Pesos;

use crate::MercadoApiError;

/// Mercado Pago reports transaction amounts as floating point currency units. Convert to integer
/// cents, rounding to the nearest cent.
pub fn pesos_from_amount(amount: f64) -> Result<Pesos, MercadoApiError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(MercadoApiError::InvalidCurrencyAmount(amount.to_string()));
    }
    let cents = (amount * 100.0).round();
    if cents > i64::MAX as f64 {
        return Err(MercadoApiError::InvalidCurrencyAmount(amount.to_string()));
    }
    Ok(Pesos::from(cents as i64))
}
