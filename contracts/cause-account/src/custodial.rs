//! Custodial fund held on behalf of a single cause.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use bondfund_common::{
    errors::{BondFundError, BondFundResult},
    types::{ensure_address, Address, CurrencyTransfer},
    validation::{custody_balanced, require_sufficient_balance},
};

/// Base-currency pot released only by the cause's administrators.
///
/// `balance == cumulative_received - cumulative_paid_out` at all times.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct CustodialFund {
    balance: u64,
    cumulative_received: u64,
    cumulative_paid_out: u64,
}

impl CustodialFund {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount`
    pub fn receive(&mut self, amount: u64) -> BondFundResult<()> {
        let balance = self.balance.checked_add(amount).ok_or(BondFundError::Overflow)?;
        let received = self
            .cumulative_received
            .checked_add(amount)
            .ok_or(BondFundError::Overflow)?;
        self.balance = balance;
        self.cumulative_received = received;
        Ok(())
    }

    /// Debit `amount` and return the transfer the host must settle
    pub fn pay_out(
        &mut self,
        amount: u64,
        destination: &Address,
    ) -> BondFundResult<CurrencyTransfer> {
        ensure_address(destination, "payout destination cannot be the zero address")?;
        require_sufficient_balance(self.balance, amount)?;
        let paid = self
            .cumulative_paid_out
            .checked_add(amount)
            .ok_or(BondFundError::Overflow)?;
        self.balance -= amount;
        self.cumulative_paid_out = paid;
        Ok(CurrencyTransfer {
            to: *destination,
            amount,
        })
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn cumulative_received(&self) -> u64 {
        self.cumulative_received
    }

    pub fn cumulative_paid_out(&self) -> u64 {
        self.cumulative_paid_out
    }

    /// Check the bookkeeping identity (used when loading persisted state)
    pub fn verify(&self) -> BondFundResult<()> {
        custody_balanced(self.cumulative_received, self.balance, self.cumulative_paid_out)
    }
}
