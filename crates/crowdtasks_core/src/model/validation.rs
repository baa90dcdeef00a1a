//! Field-level validation shared by model types and services.

use thiserror::Error;

/// Validation failure for user-supplied entity fields.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Required text field is blank after trim.
    #[error("{field} must not be blank")]
    BlankField { field: &'static str },
    /// Price is negative, NaN or infinite.
    #[error("price must be a finite non-negative number, got {0}")]
    InvalidPrice(f64),
}

/// Trims `value` and rejects blank input for the named field.
pub fn normalize_required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankField { field });
    }
    Ok(trimmed.to_string())
}

/// Rejects prices that cannot be summed into a meaningful total.
pub fn validate_price(price: f64) -> Result<f64, ValidationError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ValidationError::InvalidPrice(price));
    }
    Ok(price)
}
