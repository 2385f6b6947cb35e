//! Token Operations Module
//!
//! The claim-token ledger seen from the protocol side. The treasury is the
//! only minter and burner; holders can only move shares between themselves.
//!
//! ## Key Features
//!
//! - **Mint Authorization**: Only the registered minter can mint or burn
//! - **Supply Tracking**: Total supply always equals the sum of balances
//! - **Transfers**: Plain holder-to-holder moves, no fees

use crate::errors::BondFundResult;
use crate::types::Address;

pub use crate::constants::ledger::MAX_SUPPLY;

// ============================================================================
// Ledger Interface
// ============================================================================

/// Fungible claim-share ledger used by the reserve treasury.
///
/// `mint` and `burn` must apply fully or leave the ledger untouched: the
/// treasury never copies the ledger to stage a change, it makes the ledger
/// call its last fallible step instead. `Clone` is only used to hand out
/// persistence copies.
pub trait ClaimLedger: Clone + Send {
    /// Principal allowed to mint and burn
    fn minter(&self) -> Address;

    /// Create `amount` shares for `to`
    fn mint(&mut self, minter: &Address, to: &Address, amount: u64) -> BondFundResult<()>;

    /// Destroy `amount` shares held by `from`
    fn burn(&mut self, burner: &Address, from: &Address, amount: u64) -> BondFundResult<()>;

    /// Shares held by `owner`
    fn balance_of(&self, owner: &Address) -> u64;

    /// Shares in existence
    fn total_supply(&self) -> u64;
}
