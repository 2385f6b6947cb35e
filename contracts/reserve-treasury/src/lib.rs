//! Reserve Treasury - Bonding Curve Issuer for BondFund
//!
//! Holds the shared reserve behind every cause and issues claim shares
//! against it on a continuous bonding curve. Shares can be sold back at any
//! time for a slice of the reserve.
//!
//! ## Core Operations
//!
//! - **Issue**: Deposit reserve currency, mint shares to a beneficiary
//! - **Redeem**: Burn shares, pay reserve currency out
//! - **Quote**: Read-only previews of both
//! - **Sweep**: Sweep authority moves the residual reserve out
//!
//! ## State Model
//!
//! Reserve, supply mirror and the claim ledger live behind one lock. Each
//! mutation stages a copy of the small reserve state, runs every check, and
//! touches the ledger as its last fallible step. The staged state replaces
//! the live one only when that step succeeded, so a failure leaves nothing
//! behind. The ledger itself is never copied on the write path.

use std::fmt;
use std::sync::Mutex;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use bondfund_common::{
    access_control::require_identity,
    curve::{FixedPointCurve, PricingCurve},
    errors::{BondFundError, BondFundResult},
    events::{BondFundEvent, EventLog},
    token_ops::ClaimLedger,
    types::{ensure_address, short_id, Address, CurrencyTransfer, ReserveRatio},
    validation::{require_positive, require_sufficient_balance, supply_matches},
};

// ============ Treasury State ============

/// Setup parameters for a treasury
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TreasuryConfig {
    /// Identity the treasury mints and burns under
    pub treasury_id: Address,
    /// Reserve the curve starts from
    pub initial_reserve: u64,
    /// Shares minted at setup
    pub seed_supply: u64,
    /// Holder of the seed shares
    pub seed_holder: Address,
    /// Curve elasticity in ppm
    pub reserve_ratio_ppm: u32,
    /// Only principal allowed to sweep
    pub sweep_authority: Address,
}

/// Persistent treasury state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct TreasuryState {
    /// Base currency held by the treasury
    pub reserve_balance: u64,
    /// Mirror of the ledger's total supply
    pub share_supply: u64,
    /// Curve elasticity
    pub reserve_ratio: ReserveRatio,
    /// Only principal allowed to sweep
    pub sweep_authority: Address,
}

/// Result of a successful issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueReceipt {
    pub beneficiary: Address,
    pub deposit: u64,
    pub minted: u64,
    pub reserve_balance: u64,
    pub share_supply: u64,
}

/// Result of a successful redeem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemReceipt {
    pub holder: Address,
    pub burned: u64,
    pub payout: u64,
    /// Currency the host must send to the holder
    pub transfer: CurrencyTransfer,
    pub reserve_balance: u64,
    pub share_supply: u64,
}

/// Result of a successful sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReceipt {
    pub amount: u64,
    /// Currency the host must send to the destination
    pub transfer: CurrencyTransfer,
    /// Shares still in circulation after the sweep
    pub outstanding_supply: u64,
}

#[derive(Debug)]
struct TreasuryInner<L> {
    state: TreasuryState,
    ledger: L,
    events: EventLog,
}

// ============ Reserve Treasury ============

/// Shared reserve and share issuer
pub struct ReserveTreasury<L: ClaimLedger> {
    treasury_id: Address,
    curve: Box<dyn PricingCurve>,
    inner: Mutex<TreasuryInner<L>>,
}

impl<L: ClaimLedger> fmt::Debug for ReserveTreasury<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReserveTreasury")
            .field("treasury_id", &short_id(&self.treasury_id))
            .finish_non_exhaustive()
    }
}

impl<L: ClaimLedger> ReserveTreasury<L> {
    /// Create a treasury and mint the seed supply.
    ///
    /// # Errors
    /// `ZeroAmount` for an empty seed reserve or supply, `InvalidReserveRatio`
    /// for a ratio outside (0, 1], `SupplyMismatch` if the ledger already
    /// carries shares, `MintUnauthorized` if the ledger's minter is not
    /// `treasury_id`.
    pub fn setup(config: TreasuryConfig, mut ledger: L) -> BondFundResult<Self> {
        require_positive(config.initial_reserve)?;
        require_positive(config.seed_supply)?;
        let reserve_ratio = ReserveRatio::from_ppm(config.reserve_ratio_ppm)?;
        ensure_address(&config.treasury_id, "treasury id cannot be the zero address")?;
        ensure_address(&config.sweep_authority, "sweep authority cannot be the zero address")?;
        supply_matches(0, ledger.total_supply())?;

        ledger.mint(&config.treasury_id, &config.seed_holder, config.seed_supply)?;

        let state = TreasuryState {
            reserve_balance: config.initial_reserve,
            share_supply: config.seed_supply,
            reserve_ratio,
            sweep_authority: config.sweep_authority,
        };

        info!(
            treasury = %short_id(&config.treasury_id),
            reserve = config.initial_reserve,
            supply = config.seed_supply,
            ratio_ppm = config.reserve_ratio_ppm,
            "Reserve treasury created"
        );

        Ok(Self::from_parts(config.treasury_id, state, ledger))
    }

    /// Rebuild a treasury from persisted state and its ledger.
    ///
    /// The treasury identity is the ledger's minter.
    pub fn restore(state: TreasuryState, ledger: L) -> BondFundResult<Self> {
        supply_matches(state.share_supply, ledger.total_supply())?;
        ensure_address(&state.sweep_authority, "sweep authority cannot be the zero address")?;
        let treasury_id = ledger.minter();
        debug!(
            treasury = %short_id(&treasury_id),
            reserve = state.reserve_balance,
            supply = state.share_supply,
            "Reserve treasury restored"
        );
        Ok(Self::from_parts(treasury_id, state, ledger))
    }

    /// Replace the pricing strategy
    pub fn with_curve(mut self, curve: Box<dyn PricingCurve>) -> Self {
        self.curve = curve;
        self
    }

    fn from_parts(treasury_id: Address, state: TreasuryState, ledger: L) -> Self {
        Self {
            treasury_id,
            curve: Box::new(FixedPointCurve::default()),
            inner: Mutex::new(TreasuryInner {
                state,
                ledger,
                events: EventLog::new(),
            }),
        }
    }

    // ============ Locking ============

    /// Run `op` on a staged copy of the state and commit it only on success.
    ///
    /// The ledger is live, so `op` must make its ledger call the last
    /// fallible step. The returned event is recorded after the commit.
    fn transact<T>(
        &self,
        op: impl FnOnce(&mut TreasuryState, &mut L) -> BondFundResult<(T, BondFundEvent)>,
    ) -> BondFundResult<T> {
        let mut guard = self.inner.lock().map_err(|_| BondFundError::LockPoisoned)?;
        let inner = &mut *guard;
        let mut staged = inner.state.clone();
        let (output, event) = op(&mut staged, &mut inner.ledger)?;
        inner.state = staged;
        inner.events.emit(event);
        Ok(output)
    }

    fn read<T>(&self, op: impl FnOnce(&TreasuryInner<L>) -> T) -> BondFundResult<T> {
        let guard = self.inner.lock().map_err(|_| BondFundError::LockPoisoned)?;
        Ok(op(&guard))
    }

    // ============ Operations ============

    /// Deposit `deposit` into the reserve and mint shares to `beneficiary`.
    ///
    /// A deposit too small to buy a whole share still joins the reserve;
    /// `minted` is then zero.
    pub fn issue(&self, deposit: u64, beneficiary: &Address) -> BondFundResult<IssueReceipt> {
        require_positive(deposit)?;
        ensure_address(beneficiary, "beneficiary cannot be the zero address")?;

        let receipt = self.transact(|state, ledger| {
            supply_matches(state.share_supply, ledger.total_supply())?;
            let minted = self.curve.purchase_return(
                state.reserve_balance,
                state.share_supply,
                state.reserve_ratio.ppm(),
                deposit,
            )?;

            let reserve_balance = state
                .reserve_balance
                .checked_add(deposit)
                .ok_or(BondFundError::Overflow)?;
            let share_supply = state
                .share_supply
                .checked_add(minted)
                .ok_or(BondFundError::Overflow)?;

            if minted > 0 {
                ledger.mint(&self.treasury_id, beneficiary, minted)?;
            }
            state.reserve_balance = reserve_balance;
            state.share_supply = share_supply;

            let receipt = IssueReceipt {
                beneficiary: *beneficiary,
                deposit,
                minted,
                reserve_balance,
                share_supply,
            };
            let event = BondFundEvent::SharesIssued {
                beneficiary: *beneficiary,
                deposit,
                minted,
                reserve_balance,
                share_supply,
            };
            Ok((receipt, event))
        })?;

        info!(
            beneficiary = %short_id(beneficiary),
            deposit,
            minted = receipt.minted,
            reserve = receipt.reserve_balance,
            supply = receipt.share_supply,
            "Shares issued"
        );
        Ok(receipt)
    }

    /// Shares `issue(deposit, ..)` would mint right now
    pub fn quote_issue(&self, deposit: u64, account: &Address) -> BondFundResult<u64> {
        let minted = self.read(|inner| {
            let state = &inner.state;
            self.curve.purchase_return(
                state.reserve_balance,
                state.share_supply,
                state.reserve_ratio.ppm(),
                deposit,
            )
        })??;
        debug!(account = %short_id(account), deposit, minted, "Issue quoted");
        Ok(minted)
    }

    /// Burn `amount` of `holder`'s shares and pay out reserve currency.
    ///
    /// # Errors
    /// `ZeroAmount`, `InsufficientBalance` when the holder owns fewer shares,
    /// `InsufficientReserve` when the payout would empty the reserve.
    pub fn redeem(&self, amount: u64, holder: &Address) -> BondFundResult<RedeemReceipt> {
        require_positive(amount)?;

        let result = self.transact(|state, ledger| {
            require_sufficient_balance(ledger.balance_of(holder), amount)?;
            supply_matches(state.share_supply, ledger.total_supply())?;

            let payout = self.curve.sale_return(
                state.reserve_balance,
                state.share_supply,
                state.reserve_ratio.ppm(),
                amount,
            )?;
            if payout >= state.reserve_balance {
                return Err(BondFundError::InsufficientReserve {
                    reserve: state.reserve_balance,
                    payout,
                });
            }
            let reserve_balance = state.reserve_balance - payout;
            let share_supply = state
                .share_supply
                .checked_sub(amount)
                .ok_or(BondFundError::Underflow)?;

            ledger.burn(&self.treasury_id, holder, amount)?;
            state.reserve_balance = reserve_balance;
            state.share_supply = share_supply;

            let receipt = RedeemReceipt {
                holder: *holder,
                burned: amount,
                payout,
                transfer: CurrencyTransfer {
                    to: *holder,
                    amount: payout,
                },
                reserve_balance,
                share_supply,
            };
            let event = BondFundEvent::SharesRedeemed {
                holder: *holder,
                amount,
                payout,
                reserve_balance,
                share_supply,
            };
            Ok((receipt, event))
        });

        match result {
            Ok(receipt) => {
                info!(
                    holder = %short_id(holder),
                    burned = amount,
                    payout = receipt.payout,
                    reserve = receipt.reserve_balance,
                    supply = receipt.share_supply,
                    "Shares redeemed"
                );
                Ok(receipt)
            }
            Err(err @ BondFundError::InsufficientReserve { .. }) => {
                warn!(
                    holder = %short_id(holder),
                    amount,
                    error = %err,
                    "Redeem blocked by reserve check"
                );
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Currency `redeem(amount, ..)` would pay right now. Holdings are not checked.
    pub fn quote_redeem(&self, amount: u64, account: &Address) -> BondFundResult<u64> {
        let payout = self.read(|inner| {
            let state = &inner.state;
            self.curve.sale_return(
                state.reserve_balance,
                state.share_supply,
                state.reserve_ratio.ppm(),
                amount,
            )
        })??;
        debug!(account = %short_id(account), amount, payout, "Redeem quoted");
        Ok(payout)
    }

    /// Move the whole reserve to `destination`. Sweep authority only.
    ///
    /// The caller is checked before anything else, so an outsider always
    /// gets an authorization error.
    pub fn sweep(&self, caller: &Address, destination: &Address) -> BondFundResult<SweepReceipt> {
        let result = self.transact(|state, _ledger| {
            require_identity(&state.sweep_authority, caller)?;
            ensure_address(destination, "sweep destination cannot be the zero address")?;

            let amount = state.reserve_balance;
            let outstanding_supply = state.share_supply;
            state.reserve_balance = 0;

            let receipt = SweepReceipt {
                amount,
                transfer: CurrencyTransfer {
                    to: *destination,
                    amount,
                },
                outstanding_supply,
            };
            let event = BondFundEvent::ReserveSwept {
                by: *caller,
                destination: *destination,
                amount,
                outstanding_supply,
            };
            Ok((receipt, event))
        });

        match result {
            Ok(receipt) => {
                if receipt.outstanding_supply > 0 {
                    warn!(
                        outstanding = receipt.outstanding_supply,
                        "Reserve swept while shares remain outstanding"
                    );
                }
                info!(
                    destination = %short_id(destination),
                    amount = receipt.amount,
                    "Reserve swept"
                );
                Ok(receipt)
            }
            Err(err) => {
                warn!(caller = %short_id(caller), error = %err, "Sweep rejected");
                Err(err)
            }
        }
    }

    // ============ Accessors ============

    pub fn treasury_id(&self) -> Address {
        self.treasury_id
    }

    pub fn reserve_balance(&self) -> BondFundResult<u64> {
        self.read(|inner| inner.state.reserve_balance)
    }

    pub fn share_supply(&self) -> BondFundResult<u64> {
        self.read(|inner| inner.state.share_supply)
    }

    /// Shares held by `holder`
    pub fn balance_of(&self, holder: &Address) -> BondFundResult<u64> {
        self.read(|inner| inner.ledger.balance_of(holder))
    }

    /// Snapshot of the persistent state
    pub fn state(&self) -> BondFundResult<TreasuryState> {
        self.read(|inner| inner.state.clone())
    }

    /// Copy of the claim ledger
    pub fn ledger(&self) -> BondFundResult<L> {
        self.read(|inner| inner.ledger.clone())
    }

    /// State and ledger captured under one lock, ready for `restore`
    pub fn persistent_parts(&self) -> BondFundResult<(TreasuryState, L)> {
        self.read(|inner| (inner.state.clone(), inner.ledger.clone()))
    }

    /// Events recorded since the last `take_events`
    pub fn events(&self) -> BondFundResult<Vec<BondFundEvent>> {
        self.read(|inner| inner.events.events())
    }

    /// Events evicted from a full log before they were taken
    pub fn dropped_events(&self) -> BondFundResult<u64> {
        self.read(|inner| inner.events.dropped())
    }

    /// Drain recorded events
    pub fn take_events(&self) -> BondFundResult<Vec<BondFundEvent>> {
        let mut guard = self.inner.lock().map_err(|_| BondFundError::LockPoisoned)?;
        Ok(guard.events.drain())
    }
}

// ============ Tests ============
