//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use std::str::FromStr;

use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::{EngineError, ResultEngine};

/// Parse a decimal stored as text and return a labeled error on failure.
pub(crate) fn parse_decimal(value: &str, label: &str) -> ResultEngine<Decimal> {
    Decimal::from_str(value.trim())
        .map_err(|_| EngineError::InvalidAmount(format!("invalid {label}: {value}")))
}

/// Convert an amount to integer cents, rounding half to even.
pub(crate) fn to_minor(amount: Decimal) -> ResultEngine<i64> {
    amount
        .round_dp(2)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|minor| minor.to_i64())
        .ok_or_else(|| EngineError::InvalidAmount(format!("amount too large: {amount}")))
}

pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Minimal `local@domain` shape check.
pub(crate) fn validate_email(email: &str) -> ResultEngine<()> {
    let invalid = || EngineError::InvalidInput(format!("invalid email: {email}"));
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || email.contains(' ') {
        return Err(invalid());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decimal_keeps_scale() {
        assert_eq!(parse_decimal("2.50", "price").unwrap().to_string(), "2.50");
        assert!(parse_decimal("abc", "price").is_err());
    }

    #[test]
    fn to_minor_rounds_half_even() {
        assert_eq!(to_minor(Decimal::new(1005, 3)).unwrap(), 100);
        assert_eq!(to_minor(Decimal::new(1015, 3)).unwrap(), 102);
        assert_eq!(to_minor(Decimal::new(-250, 2)).unwrap(), -250);
        assert!(matches!(
            to_minor(Decimal::MAX),
            Err(EngineError::InvalidAmount(_))
        ));
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("shop@example.com").is_ok());
        assert!(validate_email("shop.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@b@c").is_err());
    }
}
