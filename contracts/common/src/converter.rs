//! Currency Conversion
//!
//! The directory holds one pluggable converter that quotes a foreign
//! currency amount in base-currency units. The protocol never trades through
//! it; it is a lookup used by front-ends to price contributions.

use std::fmt;

use crate::errors::{BondFundError, BondFundResult};
use crate::math::mul_div;

/// Quote an amount of some other currency in base units.
pub trait CurrencyConverter: Send + Sync + fmt::Debug {
    /// Short label for logs and audit events
    fn name(&self) -> &str;

    /// Base-currency units obtained for `amount_in`, rounded down
    fn convert(&self, amount_in: u64) -> BondFundResult<u64>;
}

/// Converter with a fixed exchange rate `numerator / denominator`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedRateConverter {
    label: String,
    numerator: u64,
    denominator: u64,
}

impl FixedRateConverter {
    /// Create a converter; both rate terms must be positive
    pub fn new(label: impl Into<String>, numerator: u64, denominator: u64) -> BondFundResult<Self> {
        if numerator == 0 || denominator == 0 {
            return Err(BondFundError::InvalidInput {
                param: "rate",
                reason: "rate terms must be positive",
            });
        }
        Ok(Self {
            label: label.into(),
            numerator,
            denominator,
        })
    }

    /// One-to-one converter
    pub fn identity() -> Self {
        Self {
            label: "identity".to_string(),
            numerator: 1,
            denominator: 1,
        }
    }

    pub fn rate(&self) -> (u64, u64) {
        (self.numerator, self.denominator)
    }
}

impl CurrencyConverter for FixedRateConverter {
    fn name(&self) -> &str {
        &self.label
    }

    fn convert(&self, amount_in: u64) -> BondFundResult<u64> {
        mul_div(amount_in, self.numerator, self.denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let converter = FixedRateConverter::identity();
        assert_eq!(converter.convert(12_345).unwrap(), 12_345);
        assert_eq!(converter.name(), "identity");
    }

    #[test]
    fn test_fixed_rate_rounds_down() {
        // 1 unit in = 2.5 base units
        let converter = FixedRateConverter::new("eur", 5, 2).unwrap();
        assert_eq!(converter.convert(3).unwrap(), 7);
        assert_eq!(converter.rate(), (5, 2));
    }

    #[test]
    fn test_zero_rate_rejected() {
        assert!(FixedRateConverter::new("bad", 0, 1).is_err());
        assert!(FixedRateConverter::new("bad", 1, 0).is_err());
    }

    #[test]
    fn test_overflow_reported() {
        let converter = FixedRateConverter::new("huge", u64::MAX, 1).unwrap();
        assert!(matches!(converter.convert(2), Err(BondFundError::Overflow)));
    }
}
