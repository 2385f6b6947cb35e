//! Directory - Cause Registry for BondFund
//!
//! Owns the shared reserve treasury and the fixed, ordered list of causes
//! that route contributions into it. The directory owner is also the
//! treasury's sweep authority and manages the currency converter slot.
//!
//! ## Core Operations
//!
//! - **Enumeration**: `count`, `at`, `cause`
//! - **Converter**: Owner swaps the currency converter; anyone can quote through it
//! - **Sweep**: Owner moves the residual reserve to itself
//! - **Persistence**: `snapshot` / `restore` of the whole system
//!
//! ## Lock Order
//!
//! Causes in directory order, then the treasury. The events lock is taken
//! before the converter slot.

use std::sync::{Arc, Mutex, RwLock};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use bondfund_cause_account::{CauseAccount, CauseConfig, CauseState};
use bondfund_common::{
    access_control::require_identity,
    converter::CurrencyConverter,
    errors::{BondFundError, BondFundResult},
    events::{BondFundEvent, EventLog},
    token_ops::ClaimLedger,
    types::{derive_cause_id, ensure_address, short_id, Address, CauseId},
};
use bondfund_reserve_treasury::{ReserveTreasury, SweepReceipt, TreasuryConfig, TreasuryState};

#[cfg(test)]
mod integration_tests;

// ============ Directory State ============

/// Setup parameters for the whole system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct DirectoryConfig {
    /// Directory owner, sweep authority and seed share holder
    pub owner: Address,
    /// Identity the treasury mints under
    pub treasury_id: Address,
    /// Reserve the curve starts from
    pub initial_reserve: u64,
    /// Shares minted to the owner at setup
    pub seed_supply: u64,
    /// Curve elasticity in ppm
    pub reserve_ratio_ppm: u32,
    /// Causes in directory order
    pub causes: Vec<CauseConfig>,
}

/// Persisted form of the whole system, minus the claim ledger
///
/// `Directory::snapshot` hands out the matching ledger copy alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct DirectorySnapshot {
    pub owner: Address,
    pub treasury: TreasuryState,
    pub causes: Vec<CauseState>,
}

impl DirectorySnapshot {
    /// Serialize snapshot to bytes for storage
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize snapshot from bytes
    pub fn from_bytes(bytes: &[u8]) -> BondFundResult<Self> {
        borsh::from_slice(bytes).map_err(|_| BondFundError::InvalidStateEncoding)
    }
}

// ============ Directory ============

/// Cause registry around one shared treasury
pub struct Directory<L: ClaimLedger> {
    owner: Address,
    treasury: Arc<ReserveTreasury<L>>,
    causes: Vec<Arc<CauseAccount<L>>>,
    converter: RwLock<Option<Arc<dyn CurrencyConverter>>>,
    events: Mutex<EventLog>,
}

impl<L: ClaimLedger> Directory<L> {
    /// Build the treasury and every cause
    pub fn setup(config: DirectoryConfig, ledger: L) -> BondFundResult<Self> {
        ensure_address(&config.owner, "owner cannot be the zero address")?;

        let treasury = Arc::new(ReserveTreasury::setup(
            TreasuryConfig {
                treasury_id: config.treasury_id,
                initial_reserve: config.initial_reserve,
                seed_supply: config.seed_supply,
                seed_holder: config.owner,
                reserve_ratio_ppm: config.reserve_ratio_ppm,
                sweep_authority: config.owner,
            },
            ledger,
        )?);

        let causes = config
            .causes
            .into_iter()
            .enumerate()
            .map(|(index, cause)| {
                CauseAccount::setup(cause, index as u64, treasury.clone()).map(Arc::new)
            })
            .collect::<BondFundResult<Vec<_>>>()?;

        info!(
            owner = %short_id(&config.owner),
            causes = causes.len(),
            "Directory created"
        );

        Ok(Self::from_parts(config.owner, treasury, causes))
    }

    /// Rebuild the system from a snapshot and the claim ledger
    pub fn restore(snapshot: DirectorySnapshot, ledger: L) -> BondFundResult<Self> {
        ensure_address(&snapshot.owner, "owner cannot be the zero address")?;
        if snapshot.treasury.sweep_authority != snapshot.owner {
            return Err(BondFundError::InvalidInput {
                param: "snapshot",
                reason: "sweep authority must be the directory owner",
            });
        }

        let treasury = Arc::new(ReserveTreasury::restore(snapshot.treasury, ledger)?);
        let mut causes = Vec::with_capacity(snapshot.causes.len());
        for (index, state) in snapshot.causes.into_iter().enumerate() {
            if state.cause_id != derive_cause_id(&state.name, index as u64) {
                return Err(BondFundError::InvalidStateEncoding);
            }
            causes.push(Arc::new(CauseAccount::restore(state, treasury.clone())?));
        }

        info!(
            owner = %short_id(&snapshot.owner),
            causes = causes.len(),
            "Directory restored"
        );

        Ok(Self::from_parts(snapshot.owner, treasury, causes))
    }

    fn from_parts(
        owner: Address,
        treasury: Arc<ReserveTreasury<L>>,
        causes: Vec<Arc<CauseAccount<L>>>,
    ) -> Self {
        Self {
            owner,
            treasury,
            causes,
            converter: RwLock::new(None),
            events: Mutex::new(EventLog::new()),
        }
    }

    /// Capture the persistent state together with a matching ledger copy.
    ///
    /// Every cause lock is held, in directory order, while the treasury state
    /// and ledger are read under the treasury lock. The pair is therefore one
    /// consistent instant even with operations in flight, and can be fed
    /// straight back into `restore`.
    pub fn snapshot(&self) -> BondFundResult<(DirectorySnapshot, L)> {
        let held = self
            .causes
            .iter()
            .map(|cause| cause.lock_state())
            .collect::<BondFundResult<Vec<_>>>()?;
        let (treasury, ledger) = self.treasury.persistent_parts()?;
        let causes = held.iter().map(|guard| guard.state().clone()).collect();

        let snapshot = DirectorySnapshot {
            owner: self.owner,
            treasury,
            causes,
        };
        Ok((snapshot, ledger))
    }

    // ============ Enumeration ============

    /// Number of causes
    pub fn count(&self) -> usize {
        self.causes.len()
    }

    /// Cause at `index`
    pub fn at(&self, index: usize) -> BondFundResult<Arc<CauseAccount<L>>> {
        self.causes
            .get(index)
            .cloned()
            .ok_or(BondFundError::IndexOutOfRange {
                index,
                count: self.causes.len(),
            })
    }

    /// Cause with identifier `cause_id`
    pub fn cause(&self, cause_id: &CauseId) -> Option<Arc<CauseAccount<L>>> {
        self.causes
            .iter()
            .find(|cause| cause.cause_id() == *cause_id)
            .cloned()
    }

    pub fn treasury(&self) -> &Arc<ReserveTreasury<L>> {
        &self.treasury
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    // ============ Currency Converter ============

    /// Replace the currency converter. Owner only.
    pub fn set_currency_converter(
        &self,
        caller: &Address,
        adapter: Arc<dyn CurrencyConverter>,
    ) -> BondFundResult<()> {
        if let Err(err) = require_identity(&self.owner, caller) {
            warn!(caller = %short_id(caller), "Converter change rejected");
            return Err(err);
        }

        let name = adapter.name().to_string();
        // Both locks are taken before the swap so a failure changes nothing
        let mut events = self.events.lock().map_err(|_| BondFundError::LockPoisoned)?;
        let mut slot = self.converter.write().map_err(|_| BondFundError::LockPoisoned)?;
        *slot = Some(adapter);
        events.emit(BondFundEvent::CurrencyConverterChanged {
            by: *caller,
            adapter: name.clone(),
        });
        drop(slot);
        drop(events);

        info!(adapter = %name, "Currency converter changed");
        Ok(())
    }

    /// Quote `amount_in` through the registered converter
    pub fn convert(&self, amount_in: u64) -> BondFundResult<u64> {
        let slot = self.converter.read().map_err(|_| BondFundError::LockPoisoned)?;
        let converter = slot.as_ref().ok_or(BondFundError::ConverterNotRegistered)?;
        converter.convert(amount_in)
    }

    /// Name of the registered converter, if any
    pub fn converter_name(&self) -> BondFundResult<Option<String>> {
        let slot = self.converter.read().map_err(|_| BondFundError::LockPoisoned)?;
        Ok(slot.as_ref().map(|c| c.name().to_string()))
    }

    // ============ Sweep ============

    /// Move the whole reserve to the owner. Owner only.
    pub fn trigger_sweep(&self, caller: &Address) -> BondFundResult<SweepReceipt> {
        if let Err(err) = require_identity(&self.owner, caller) {
            warn!(caller = %short_id(caller), "Sweep trigger rejected");
            return Err(err);
        }
        self.treasury.sweep(caller, &self.owner)
    }

    // ============ Events ============

    /// Directory events recorded since the last `take_events`
    pub fn events(&self) -> BondFundResult<Vec<BondFundEvent>> {
        let log = self.events.lock().map_err(|_| BondFundError::LockPoisoned)?;
        Ok(log.events())
    }

    /// Drain directory, treasury and cause events, in that order
    pub fn take_events(&self) -> BondFundResult<Vec<BondFundEvent>> {
        let mut all = self
            .events
            .lock()
            .map_err(|_| BondFundError::LockPoisoned)?
            .drain();
        all.extend(self.treasury.take_events()?);
        for cause in &self.causes {
            all.extend(cause.take_events()?);
        }
        Ok(all)
    }
}
