//! BondFund Common Library
//!
//! Shared types, constants, and utilities for all BondFund contracts.
//!
//! ## Protocol Overview
//!
//! A contribution to a cause is split in two: the custodial part is held for
//! the cause's administrators to disburse, the reserve part buys claim shares
//! for the contributor on a continuous bonding curve. Shares can be sold back
//! to the reserve at any time.
//!
//! ## Modules
//!
//! - **Pricing Curve**: fixed-point bonding curve, rounding in the reserve's favour
//! - **Math**: Q127 log2 / exp2 primitives over `U256`
//! - **Access Control**: per-cause administrator sets and single authorities
//! - **Token Operations**: the claim ledger interface the treasury mints through
//! - **Converter**: pluggable currency quotes
//! - **Events**: audit records for every committed operation

pub mod constants;
pub mod errors;
pub mod types;
pub mod math;
pub mod curve;
pub mod events;
pub mod validation;
pub mod token_ops;
pub mod access_control;
pub mod converter;

// Re-exports for convenience
pub use constants::*;
pub use errors::*;
pub use types::*;
pub use math::*;
pub use curve::*;
pub use events::*;
pub use token_ops::*;
pub use access_control::*;
pub use converter::*;
