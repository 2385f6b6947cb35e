//! BondFund Claim Token
//!
//! Fungible share ledger for claims on the reserve treasury.
//! Only the authorized minter (the treasury) can mint or burn; holders can
//! transfer freely between themselves.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use bondfund_common::{
    errors::{BondFundError, BondFundResult},
    token_ops::{ClaimLedger, MAX_SUPPLY},
    types::{ensure_address, Address},
    validation::{require_positive, require_sufficient_balance},
};

// ============ Token State ============

/// Claim token ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ClaimToken {
    /// Authorized minter (the reserve treasury)
    authorized_minter: Address,
    /// Per-holder balances; zero balances are removed
    balances: BTreeMap<Address, u64>,
    /// Total supply tracking
    total_supply: u64,
}

// NOTE: Default is not implemented so that a minter must always be chosen.

impl ClaimToken {
    /// Create an empty ledger with an authorized minter
    pub fn new(authorized_minter: Address) -> BondFundResult<Self> {
        ensure_address(&authorized_minter, "minter cannot be the zero address")?;
        Ok(Self {
            authorized_minter,
            balances: BTreeMap::new(),
            total_supply: 0,
        })
    }

    /// Move shares between holders
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: u64) -> BondFundResult<()> {
        require_positive(amount)?;
        ensure_address(to, "recipient cannot be the zero address")?;
        let available = self.balance_of(from);
        require_sufficient_balance(available, amount)?;
        if from == to {
            return Ok(());
        }

        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(BondFundError::Overflow)?;
        self.set_balance(from, available - amount);
        self.set_balance(to, credited);
        Ok(())
    }

    fn require_minter(&self, caller: &Address) -> BondFundResult<()> {
        if *caller != self.authorized_minter {
            return Err(BondFundError::MintUnauthorized { caller: *caller });
        }
        Ok(())
    }

    fn set_balance(&mut self, owner: &Address, amount: u64) {
        if amount == 0 {
            self.balances.remove(owner);
        } else {
            self.balances.insert(*owner, amount);
        }
    }
}

impl ClaimLedger for ClaimToken {
    fn minter(&self) -> Address {
        self.authorized_minter
    }

    fn mint(&mut self, minter: &Address, to: &Address, amount: u64) -> BondFundResult<()> {
        // 1. Amount must be positive
        require_positive(amount)?;

        // 2. Caller must be the authorized minter
        self.require_minter(minter)?;
        ensure_address(to, "recipient cannot be the zero address")?;

        // 3. Supply cap
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .filter(|supply| *supply <= MAX_SUPPLY)
            .ok_or(BondFundError::Overflow)?;

        // 4. Credit recipient (cannot overflow: balance <= supply)
        let credited = self.balance_of(to) + amount;
        self.set_balance(to, credited);
        self.total_supply = new_supply;
        Ok(())
    }

    fn burn(&mut self, burner: &Address, from: &Address, amount: u64) -> BondFundResult<()> {
        require_positive(amount)?;
        self.require_minter(burner)?;

        let available = self.balance_of(from);
        require_sufficient_balance(available, amount)?;
        let new_supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or(BondFundError::Underflow)?;

        self.set_balance(from, available - amount);
        self.total_supply = new_supply;
        Ok(())
    }

    fn balance_of(&self, owner: &Address) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> u64 {
        self.total_supply
    }
}

// ============ Tests ============
