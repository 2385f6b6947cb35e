//! Cause Account - Contribution Router for BondFund
//!
//! Every contribution to a cause is split by a fixed ratio: the reserve part
//! buys claim shares for the contributor from the shared treasury, the
//! custodial part stays with the cause until one of its administrators
//! disburses it.
//!
//! ## Core Operations
//!
//! - **Contribute**: Split, issue shares, credit the custodial fund
//! - **Quotes**: `my_reward` / `my_return` preview issuance and redemption
//! - **Disburse**: Administrator releases custodial funds with a content reference
//! - **Administrators**: Add others, renounce self
//!
//! ## Locking
//!
//! A contribution holds the cause lock while the treasury issues, so the
//! cause lock is always taken before the treasury lock. Operations write
//! the live state only after their last fallible step; nothing is copied
//! beyond the custodial fund a contribution stages.

pub mod custodial;

use std::sync::{Arc, Mutex, MutexGuard};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use bondfund_common::{
    access_control::AdministratorSet,
    errors::{BondFundError, BondFundResult},
    events::{BondFundEvent, EventLog},
    token_ops::ClaimLedger,
    types::{
        derive_cause_id, ensure_address, short_id, Address, CauseId, ContentRef, CurrencyTransfer,
        SplitRatio,
    },
    validation::{require_positive, require_valid_name},
};
use bondfund_reserve_treasury::ReserveTreasury;

pub use custodial::CustodialFund;

// ============ Cause State ============

/// Setup parameters for a cause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct CauseConfig {
    /// Display name
    pub name: String,
    /// Share of each contribution sent to the reserve (bps)
    pub reserve_bps: u64,
    /// Share of each contribution kept for the cause (bps)
    pub custodial_bps: u64,
    /// Initial administrators; at least one
    pub administrators: Vec<Address>,
}

/// Persistent cause state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct CauseState {
    pub cause_id: CauseId,
    pub name: String,
    pub split: SplitRatio,
    pub administrators: AdministratorSet,
    pub fund: CustodialFund,
}

/// Result of a successful contribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionReceipt {
    pub contributor: Address,
    pub value: u64,
    pub reserve_share: u64,
    pub custodial_share: u64,
    /// Shares minted to the contributor
    pub minted: u64,
}

/// Result of a successful disbursement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisbursementReceipt {
    pub actor: Address,
    pub amount: u64,
    pub content_ref: ContentRef,
    /// Currency the host must send to the recipient
    pub transfer: CurrencyTransfer,
}

#[derive(Debug)]
struct CauseInner {
    state: CauseState,
    events: EventLog,
}

/// Cause state held under the cause lock
///
/// While the guard lives, no operation on this cause can run.
pub struct CauseStateGuard<'a> {
    guard: MutexGuard<'a, CauseInner>,
}

impl CauseStateGuard<'_> {
    pub fn state(&self) -> &CauseState {
        &self.guard.state
    }
}

// ============ Cause Account ============

/// One cause: split router, custodial fund and administrator set
#[derive(Debug)]
pub struct CauseAccount<L: ClaimLedger> {
    cause_id: CauseId,
    treasury: Arc<ReserveTreasury<L>>,
    inner: Mutex<CauseInner>,
}

impl<L: ClaimLedger> CauseAccount<L> {
    /// Create a cause occupying slot `index` of a directory
    pub fn setup(
        config: CauseConfig,
        index: u64,
        treasury: Arc<ReserveTreasury<L>>,
    ) -> BondFundResult<Self> {
        require_valid_name(&config.name)?;
        let split = SplitRatio::new(config.reserve_bps, config.custodial_bps)?;
        let administrators = AdministratorSet::new(config.administrators)?;
        let cause_id = derive_cause_id(&config.name, index);

        info!(
            cause = %short_id(&cause_id),
            name = %config.name,
            reserve_bps = split.reserve_bps(),
            administrators = administrators.len(),
            "Cause created"
        );

        let state = CauseState {
            cause_id,
            name: config.name,
            split,
            administrators,
            fund: CustodialFund::new(),
        };
        Ok(Self::from_parts(state, treasury))
    }

    /// Rebuild a cause from persisted state
    pub fn restore(state: CauseState, treasury: Arc<ReserveTreasury<L>>) -> BondFundResult<Self> {
        require_valid_name(&state.name)?;
        SplitRatio::new(state.split.reserve_bps(), state.split.custodial_bps())?;
        AdministratorSet::new(state.administrators.members())?;
        state.fund.verify()?;
        Ok(Self::from_parts(state, treasury))
    }

    fn from_parts(state: CauseState, treasury: Arc<ReserveTreasury<L>>) -> Self {
        Self {
            cause_id: state.cause_id,
            treasury,
            inner: Mutex::new(CauseInner {
                state,
                events: EventLog::new(),
            }),
        }
    }

    // ============ Locking ============

    /// Run `op` under the cause lock and record its event once it succeeded.
    ///
    /// `op` writes the live state, so it must finish every fallible step
    /// before its first write.
    fn transact<T>(
        &self,
        op: impl FnOnce(&mut CauseState) -> BondFundResult<(T, Option<BondFundEvent>)>,
    ) -> BondFundResult<T> {
        let mut guard = self.inner.lock().map_err(|_| BondFundError::LockPoisoned)?;
        let inner = &mut *guard;
        let (output, event) = op(&mut inner.state)?;
        if let Some(event) = event {
            inner.events.emit(event);
        }
        Ok(output)
    }

    fn read<T>(&self, op: impl FnOnce(&CauseInner) -> T) -> BondFundResult<T> {
        let guard = self.inner.lock().map_err(|_| BondFundError::LockPoisoned)?;
        Ok(op(&guard))
    }

    /// Hold the cause lock, e.g. to capture several causes at one instant
    pub fn lock_state(&self) -> BondFundResult<CauseStateGuard<'_>> {
        let guard = self.inner.lock().map_err(|_| BondFundError::LockPoisoned)?;
        Ok(CauseStateGuard { guard })
    }

    // ============ Contributions ============

    /// Split `value`, issue shares for the reserve part and keep the rest.
    ///
    /// The custodial credit is staged on a copy of the fund and issuance is
    /// the last fallible step, so either every effect lands or none does. A
    /// reserve part that rounds to zero issues nothing.
    pub fn contribute(
        &self,
        contributor: &Address,
        value: u64,
    ) -> BondFundResult<ContributionReceipt> {
        require_positive(value)?;
        ensure_address(contributor, "contributor cannot be the zero address")?;

        let receipt = self.transact(|state| {
            let (reserve_share, custodial_share) = state.split.split(value);
            let mut fund = state.fund.clone();
            fund.receive(custodial_share)?;

            let minted = if reserve_share > 0 {
                self.treasury.issue(reserve_share, contributor)?.minted
            } else {
                0
            };
            state.fund = fund;

            let receipt = ContributionReceipt {
                contributor: *contributor,
                value,
                reserve_share,
                custodial_share,
                minted,
            };
            let event = BondFundEvent::ContributionRecorded {
                cause_id: self.cause_id,
                contributor: *contributor,
                value,
                minted,
            };
            Ok((receipt, Some(event)))
        })?;

        info!(
            cause = %short_id(&self.cause_id),
            contributor = %short_id(contributor),
            value,
            reserve_share = receipt.reserve_share,
            custodial_share = receipt.custodial_share,
            minted = receipt.minted,
            "Contribution recorded"
        );
        Ok(receipt)
    }

    /// Shares a contribution of `value` would mint right now
    pub fn my_reward(&self, caller: &Address, value: u64) -> BondFundResult<u64> {
        let guard = self.inner.lock().map_err(|_| BondFundError::LockPoisoned)?;
        let reserve_share = guard.state.split.reserve_share(value);
        let minted = if reserve_share > 0 {
            self.treasury.quote_issue(reserve_share, caller)?
        } else {
            0
        };
        debug!(cause = %short_id(&self.cause_id), value, minted, "Reward quoted");
        Ok(minted)
    }

    /// Currency that redeeming `amount` shares would pay right now
    pub fn my_return(&self, caller: &Address, amount: u64) -> BondFundResult<u64> {
        self.treasury.quote_redeem(amount, caller)
    }

    // ============ Disbursement ============

    /// Release `amount` of custodial funds to `recipient`. Administrators only.
    ///
    /// `content_ref` is recorded verbatim in the audit event.
    pub fn disburse(
        &self,
        caller: &Address,
        amount: u64,
        recipient: &Address,
        content_ref: impl Into<ContentRef>,
    ) -> BondFundResult<DisbursementReceipt> {
        let content_ref = content_ref.into();

        let result = self.transact(|state| {
            state.administrators.require(caller)?;
            require_positive(amount)?;
            let transfer = state.fund.pay_out(amount, recipient)?;

            let event = BondFundEvent::Disbursed {
                cause_id: self.cause_id,
                actor: *caller,
                recipient: *recipient,
                amount,
                content_ref: content_ref.clone(),
            };
            let receipt = DisbursementReceipt {
                actor: *caller,
                amount,
                content_ref: content_ref.clone(),
                transfer,
            };
            Ok((receipt, Some(event)))
        });

        match result {
            Ok(receipt) => {
                info!(
                    cause = %short_id(&self.cause_id),
                    actor = %short_id(caller),
                    recipient = %short_id(recipient),
                    amount,
                    content_ref = %receipt.content_ref,
                    "Custodial funds disbursed"
                );
                Ok(receipt)
            }
            Err(err @ BondFundError::NotAdministrator { .. }) => {
                warn!(
                    cause = %short_id(&self.cause_id),
                    caller = %short_id(caller),
                    "Disbursement rejected"
                );
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    // ============ Administrators ============

    /// Add `identity` as an administrator. Returns false if it already was one.
    pub fn add_administrator(&self, caller: &Address, identity: &Address) -> BondFundResult<bool> {
        let added = self.transact(|state| {
            let added = state.administrators.add(caller, *identity)?;
            let event = added.then(|| BondFundEvent::AdministratorAdded {
                cause_id: self.cause_id,
                by: *caller,
                administrator: *identity,
            });
            Ok((added, event))
        });

        match added {
            Ok(added) => {
                if added {
                    info!(
                        cause = %short_id(&self.cause_id),
                        by = %short_id(caller),
                        administrator = %short_id(identity),
                        "Administrator added"
                    );
                }
                Ok(added)
            }
            Err(err) => {
                warn!(
                    cause = %short_id(&self.cause_id),
                    caller = %short_id(caller),
                    error = %err,
                    "Administrator add rejected"
                );
                Err(err)
            }
        }
    }

    /// Remove `caller` from the administrators
    pub fn renounce_administrator(&self, caller: &Address) -> BondFundResult<()> {
        self.transact(|state| {
            state.administrators.renounce(caller)?;
            let event = BondFundEvent::AdministratorRenounced {
                cause_id: self.cause_id,
                administrator: *caller,
            };
            Ok(((), Some(event)))
        })?;

        info!(
            cause = %short_id(&self.cause_id),
            administrator = %short_id(caller),
            "Administrator renounced"
        );
        Ok(())
    }

    // ============ Accessors ============

    pub fn cause_id(&self) -> CauseId {
        self.cause_id
    }

    pub fn treasury(&self) -> &Arc<ReserveTreasury<L>> {
        &self.treasury
    }

    pub fn name(&self) -> BondFundResult<String> {
        self.read(|inner| inner.state.name.clone())
    }

    pub fn split(&self) -> BondFundResult<SplitRatio> {
        self.read(|inner| inner.state.split)
    }

    pub fn is_administrator(&self, identity: &Address) -> BondFundResult<bool> {
        self.read(|inner| inner.state.administrators.contains(identity))
    }

    pub fn administrators(&self) -> BondFundResult<Vec<Address>> {
        self.read(|inner| inner.state.administrators.members())
    }

    pub fn custodial_balance(&self) -> BondFundResult<u64> {
        self.read(|inner| inner.state.fund.balance())
    }

    /// Total ever credited to the custodial fund
    pub fn cumulative_received(&self) -> BondFundResult<u64> {
        self.read(|inner| inner.state.fund.cumulative_received())
    }

    pub fn state(&self) -> BondFundResult<CauseState> {
        self.read(|inner| inner.state.clone())
    }

    /// Events recorded since the last `take_events`
    pub fn events(&self) -> BondFundResult<Vec<BondFundEvent>> {
        self.read(|inner| inner.events.events())
    }

    /// Drain recorded events
    pub fn take_events(&self) -> BondFundResult<Vec<BondFundEvent>> {
        let mut guard = self.inner.lock().map_err(|_| BondFundError::LockPoisoned)?;
        Ok(guard.events.drain())
    }
}

// ============ Tests ============
