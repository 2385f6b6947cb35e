//! Validation Helpers for the BondFund Protocol
//!
//! Small reusable checks shared by the treasury, the causes and the
//! directory.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bondfund_common::validation::{check, require_positive};
//!
//! check!(amount > 0, BondFundError::ZeroAmount);
//! require_positive(amount)?;
//! ```

use crate::errors::{BondFundError, BondFundResult};
use crate::constants::cause::MAX_NAME_LEN;

// ============ Validation Macro ============

/// Check a condition and return an error if it fails.
///
/// # Examples
///
/// ```rust,ignore
/// check!(
///     payout < reserve,
///     BondFundError::InsufficientReserve { reserve, payout }
/// );
/// ```
#[macro_export]
macro_rules! check {
    ($condition:expr, $error:expr) => {
        if !($condition) {
            return Err($error);
        }
    };
}

pub use crate::check;

// ============ Conservation ============

/// Custodial bookkeeping: everything received is either held or paid out.
pub fn custody_balanced(received: u64, held: u64, paid_out: u64) -> BondFundResult<()> {
    let accounted = (held as u128) + (paid_out as u128);
    check!(
        received as u128 == accounted,
        BondFundError::InvalidInput {
            param: "custodial_fund",
            reason: "cumulative received differs from balance plus payouts",
        }
    );
    Ok(())
}

/// Supply mirror must agree with the ledger it mirrors.
pub fn supply_matches(mirror: u64, ledger: u64) -> BondFundResult<()> {
    check!(mirror == ledger, BondFundError::SupplyMismatch { mirror, ledger });
    Ok(())
}

// ============ Common Validation Helpers ============

/// Require a value to be positive (non-zero).
pub fn require_positive(value: u64) -> BondFundResult<()> {
    check!(value > 0, BondFundError::ZeroAmount);
    Ok(())
}

/// Require sufficient balance for an operation.
pub fn require_sufficient_balance(available: u64, requested: u64) -> BondFundResult<()> {
    check!(
        available >= requested,
        BondFundError::InsufficientBalance { available, requested }
    );
    Ok(())
}

/// Require a non-empty, bounded display name.
pub fn require_valid_name(name: &str) -> BondFundResult<()> {
    check!(
        !name.trim().is_empty(),
        BondFundError::InvalidInput {
            param: "name",
            reason: "name cannot be empty",
        }
    );
    check!(
        name.len() <= MAX_NAME_LEN,
        BondFundError::InvalidInput {
            param: "name",
            reason: "name is too long",
        }
    );
    Ok(())
}
