//! Core Types for the BondFund Protocol
//!
//! Fundamental value types shared by the treasury, the causes and the
//! directory.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::{curve, split};
use crate::errors::{BondFundError, BondFundResult};

/// Type alias for principal identifiers (32-byte hash)
pub type Address = [u8; 32];

/// Type alias for cause identifiers
pub type CauseId = [u8; 32];

/// Opaque pointer to external content (e.g. a content-addressed document).
/// Never interpreted by the protocol.
pub type ContentRef = String;

/// The all-zero address, never a valid principal
pub const ZERO_ADDRESS: Address = [0u8; 32];

/// Reject the zero address
pub fn ensure_address(address: &Address, reason: &'static str) -> BondFundResult<()> {
    if *address == ZERO_ADDRESS {
        return Err(BondFundError::InvalidAddress { reason });
    }
    Ok(())
}

// ============ Curve Parameters ============

/// Bonding curve elasticity, in parts per million. Valid range is (0, 1].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct ReserveRatio(u32);

impl ReserveRatio {
    /// Validate and wrap a ppm value
    pub fn from_ppm(ppm: u32) -> BondFundResult<Self> {
        if !(curve::MIN_RESERVE_RATIO_PPM..=curve::MAX_RESERVE_RATIO_PPM).contains(&ppm) {
            return Err(BondFundError::InvalidReserveRatio { ppm });
        }
        Ok(Self(ppm))
    }

    /// Ratio in parts per million
    pub fn ppm(&self) -> u32 {
        self.0
    }

    /// True for the linear curve (ratio == 1)
    pub fn is_linear(&self) -> bool {
        self.0 == curve::MAX_RESERVE_RATIO_PPM
    }
}

impl Default for ReserveRatio {
    fn default() -> Self {
        Self(curve::DEFAULT_RESERVE_RATIO_PPM)
    }
}

// ============ Contribution Split ============

/// Fixed split of each contribution between the reserve and the cause.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct SplitRatio {
    reserve_bps: u64,
    custodial_bps: u64,
}

impl SplitRatio {
    /// Create a split; the two parts must add up to exactly 10_000 bps
    pub fn new(reserve_bps: u64, custodial_bps: u64) -> BondFundResult<Self> {
        let total = reserve_bps.checked_add(custodial_bps);
        if total != Some(split::BPS_DENOMINATOR) {
            return Err(BondFundError::InvalidSplit {
                reserve_bps,
                custodial_bps,
            });
        }
        Ok(Self {
            reserve_bps,
            custodial_bps,
        })
    }

    pub fn reserve_bps(&self) -> u64 {
        self.reserve_bps
    }

    pub fn custodial_bps(&self) -> u64 {
        self.custodial_bps
    }

    /// Reserve part of `value`, rounded down
    pub fn reserve_share(&self, value: u64) -> u64 {
        // reserve_bps <= 10_000, so the quotient never exceeds value
        ((value as u128 * self.reserve_bps as u128) / split::BPS_DENOMINATOR as u128) as u64
    }

    /// Split `value` into (reserve, custodial); the parts always sum to `value`
    pub fn split(&self, value: u64) -> (u64, u64) {
        let reserve = self.reserve_share(value);
        (reserve, value - reserve)
    }
}

impl Default for SplitRatio {
    fn default() -> Self {
        Self {
            reserve_bps: split::DEFAULT_RESERVE_BPS,
            custodial_bps: split::DEFAULT_CUSTODIAL_BPS,
        }
    }
}

// ============ Settlement ============

/// Base-currency movement out of the protocol, settled by the host
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct CurrencyTransfer {
    /// Recipient
    pub to: Address,
    /// Amount in smallest currency units
    pub amount: u64,
}

// ============ Identifiers ============

/// Derive a deterministic cause identifier from its name and directory slot
pub fn derive_cause_id(name: &str, index: u64) -> CauseId {
    let mut hasher = Sha256::new();
    hasher.update(b"bondfund/cause");
    hasher.update(name.as_bytes());
    hasher.update(index.to_le_bytes());
    let result = hasher.finalize();
    let mut id = [0u8; 32];
    id.copy_from_slice(&result);
    id
}

/// First four bytes as hex, for log fields
pub fn short_id(id: &[u8; 32]) -> String {
    id[..4].iter().map(|b| format!("{:02x}", b)).collect()
}
