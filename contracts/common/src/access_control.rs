//! Access Control Module
//!
//! Role checks for the BondFund protocol:
//!
//! - **Administrator sets**: each cause owns its own set of principals allowed
//!   to disburse its custodial fund. Any member may add another member; a
//!   member may only remove itself. There is no forced removal.
//! - **Single authorities**: the treasury sweep and the directory's admin
//!   functions are bound to one identity.

use std::collections::BTreeSet;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::errors::{BondFundError, BondFundResult};
use crate::types::{ensure_address, Address};

/// Check that `actual` is the single principal allowed to act
pub fn require_identity(expected: &Address, actual: &Address) -> BondFundResult<()> {
    if expected != actual {
        return Err(BondFundError::Unauthorized {
            expected: *expected,
            actual: *actual,
        });
    }
    Ok(())
}

/// Set of administrators for one cause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct AdministratorSet {
    members: BTreeSet<Address>,
}

impl AdministratorSet {
    /// Create a set; at least one valid administrator is required
    pub fn new<I>(initial: I) -> BondFundResult<Self>
    where
        I: IntoIterator<Item = Address>,
    {
        let mut members = BTreeSet::new();
        for address in initial {
            ensure_address(&address, "administrator cannot be the zero address")?;
            members.insert(address);
        }
        if members.is_empty() {
            return Err(BondFundError::InvalidInput {
                param: "administrators",
                reason: "at least one administrator is required",
            });
        }
        Ok(Self { members })
    }

    /// Check membership
    pub fn contains(&self, address: &Address) -> bool {
        self.members.contains(address)
    }

    /// Fail with an authorization error unless `caller` is a member
    pub fn require(&self, caller: &Address) -> BondFundResult<()> {
        if !self.contains(caller) {
            return Err(BondFundError::NotAdministrator { caller: *caller });
        }
        Ok(())
    }

    /// Add `identity` on behalf of `caller`. Returns false if already present.
    pub fn add(&mut self, caller: &Address, identity: Address) -> BondFundResult<bool> {
        self.require(caller)?;
        ensure_address(&identity, "administrator cannot be the zero address")?;
        Ok(self.members.insert(identity))
    }

    /// Remove `caller` from the set. The last member cannot leave.
    pub fn renounce(&mut self, caller: &Address) -> BondFundResult<()> {
        self.require(caller)?;
        if self.members.len() == 1 {
            return Err(BondFundError::LastAdministrator);
        }
        self.members.remove(caller);
        Ok(())
    }

    /// Members in ascending order
    pub fn members(&self) -> Vec<Address> {
        self.members.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
