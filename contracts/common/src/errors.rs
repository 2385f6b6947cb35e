//! Error Types for the BondFund Protocol
//!
//! Every fallible operation returns a [`BondFundResult`]. Each error belongs
//! to exactly one [`ErrorKind`], which is what callers (and tests) match on
//! when they only care about the class of failure.

use core::fmt;

use crate::types::Address;

/// Result type alias for BondFund operations
pub type BondFundResult<T> = Result<T, BondFundError>;

/// Broad classes of failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, rejected before any mutation
    Validation,
    /// Caller lacks the administrator or sweep-authority role
    Authorization,
    /// Redeem or disburse amount exceeds what is available
    InsufficientFunds,
    /// Curve domain, precision or overflow failure
    Arithmetic,
    /// Broken internal state (poisoned lock, ledger disagreement)
    Internal,
}

/// Main error enum for all BondFund protocol errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BondFundError {
    // ============ Amount Errors ============
    /// Zero amount not allowed
    ZeroAmount,

    /// Insufficient balance for operation
    InsufficientBalance { available: u64, requested: u64 },

    /// Payout would empty (or exceed) the reserve
    InsufficientReserve { reserve: u64, payout: u64 },

    // ============ Configuration Errors ============
    /// Split ratio does not sum to the bps denominator
    InvalidSplit { reserve_bps: u64, custodial_bps: u64 },

    /// Reserve ratio outside (0, 1]
    InvalidReserveRatio { ppm: u32 },

    /// Curve precision outside the supported range
    InvalidPrecision { bits: usize },

    /// Index outside the enumerated range
    IndexOutOfRange { index: usize, count: usize },

    /// Invalid input parameter
    InvalidInput { param: &'static str, reason: &'static str },

    /// Invalid address (e.g., zero address)
    InvalidAddress { reason: &'static str },

    /// The last administrator of a cause cannot leave
    LastAdministrator,

    /// No currency converter registered
    ConverterNotRegistered,

    /// Persisted state could not be decoded
    InvalidStateEncoding,

    // ============ Authorization Errors ============
    /// Caller is not the expected principal
    Unauthorized { expected: Address, actual: Address },

    /// Caller is not an administrator of the cause
    NotAdministrator { caller: Address },

    /// Mint not authorized
    MintUnauthorized { caller: Address },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    Overflow,

    /// Arithmetic underflow occurred
    Underflow,

    /// Division by zero
    DivisionByZero,

    /// Curve evaluated outside its domain
    CurveDomain { param: &'static str, reason: &'static str },

    // ============ State Errors ============
    /// Supply mirror disagrees with the claim-token ledger
    SupplyMismatch { mirror: u64, ledger: u64 },

    /// A state lock was poisoned by a panicking writer
    LockPoisoned,
}

impl BondFundError {
    /// Returns a human-readable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::ZeroAmount => "E010_ZERO_AMOUNT",
            Self::InsufficientBalance { .. } => "E012_INSUFFICIENT_BALANCE",
            Self::InsufficientReserve { .. } => "E013_INSUFFICIENT_RESERVE",
            Self::InvalidSplit { .. } => "E020_INVALID_SPLIT",
            Self::InvalidReserveRatio { .. } => "E021_INVALID_RATIO",
            Self::InvalidPrecision { .. } => "E022_INVALID_PRECISION",
            Self::IndexOutOfRange { .. } => "E023_INDEX_OUT_OF_RANGE",
            Self::InvalidInput { .. } => "E024_INVALID_INPUT",
            Self::InvalidAddress { .. } => "E025_INVALID_ADDRESS",
            Self::LastAdministrator => "E026_LAST_ADMIN",
            Self::ConverterNotRegistered => "E027_NO_CONVERTER",
            Self::InvalidStateEncoding => "E028_BAD_STATE_ENCODING",
            Self::Unauthorized { .. } => "E030_UNAUTHORIZED",
            Self::NotAdministrator { .. } => "E031_NOT_ADMIN",
            Self::MintUnauthorized { .. } => "E032_MINT_UNAUTH",
            Self::Overflow => "E040_OVERFLOW",
            Self::Underflow => "E041_UNDERFLOW",
            Self::DivisionByZero => "E042_DIV_ZERO",
            Self::CurveDomain { .. } => "E043_CURVE_DOMAIN",
            Self::SupplyMismatch { .. } => "E050_SUPPLY_MISMATCH",
            Self::LockPoisoned => "E051_LOCK_POISONED",
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroAmount
            | Self::InvalidSplit { .. }
            | Self::InvalidReserveRatio { .. }
            | Self::InvalidPrecision { .. }
            | Self::IndexOutOfRange { .. }
            | Self::InvalidInput { .. }
            | Self::InvalidAddress { .. }
            | Self::LastAdministrator
            | Self::ConverterNotRegistered
            | Self::InvalidStateEncoding => ErrorKind::Validation,
            Self::Unauthorized { .. }
            | Self::NotAdministrator { .. }
            | Self::MintUnauthorized { .. } => ErrorKind::Authorization,
            Self::InsufficientBalance { .. } | Self::InsufficientReserve { .. } => {
                ErrorKind::InsufficientFunds
            }
            Self::Overflow | Self::Underflow | Self::DivisionByZero | Self::CurveDomain { .. } => {
                ErrorKind::Arithmetic
            }
            Self::SupplyMismatch { .. } | Self::LockPoisoned => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for BondFundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.code(), self)
    }
}

impl std::error::Error for BondFundError {}
