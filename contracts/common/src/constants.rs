//! Protocol Constants
//!
//! All magic numbers and configuration defaults for the BondFund protocol.

/// Claim ledger limits
pub mod ledger {
    /// Largest total share supply a ledger accepts
    pub const MAX_SUPPLY: u64 = 1_000_000_000_000_000_000;
}

/// Contribution split configuration (in basis points, 100 = 1%)
pub mod split {
    /// Basis points denominator; reserve + custodial must equal this
    pub const BPS_DENOMINATOR: u64 = 10_000;

    /// Default share of each contribution sent to the reserve (10%)
    pub const DEFAULT_RESERVE_BPS: u64 = 1_000;

    /// Default share of each contribution kept for the cause (90%)
    pub const DEFAULT_CUSTODIAL_BPS: u64 = BPS_DENOMINATOR - DEFAULT_RESERVE_BPS;
}

/// Bonding curve parameters
pub mod curve {
    /// Reserve ratio denominator (parts per million)
    pub const MAX_RESERVE_RATIO_PPM: u32 = 1_000_000;

    /// Smallest accepted reserve ratio
    pub const MIN_RESERVE_RATIO_PPM: u32 = 1;

    /// Default reserve ratio (50%)
    pub const DEFAULT_RESERVE_RATIO_PPM: u32 = 500_000;

    /// Fractional bits of the fixed-point representation used inside the curve
    pub const FIXED_POINT_BITS: usize = 127;

    /// Default number of fractional bits resolved by log2/exp2
    pub const DEFAULT_PRECISION_BITS: usize = 96;

    /// Lowest supported precision
    pub const MIN_PRECISION_BITS: usize = 8;

    /// Highest supported precision (size of the exp2 lookup table)
    pub const MAX_PRECISION_BITS: usize = 120;

    /// Largest integer part accepted by exp2 (result must stay below 2^256)
    pub const MAX_EXP2_INTEGER: usize = 127;
}

/// Cause setup limits
pub mod cause {
    /// Longest accepted cause name in bytes
    pub const MAX_NAME_LEN: usize = 64;
}

/// Audit event retention
pub mod events {
    /// Undrained events a log keeps before evicting the oldest
    pub const MAX_RETAINED_EVENTS: usize = 10_000;
}
