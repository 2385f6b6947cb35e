//! Audit Events for the BondFund Protocol
//!
//! Events are recorded when an operation commits and can be indexed
//! off-process for dashboards, reconciliation and donor receipts. A failed
//! operation records nothing.

use std::collections::VecDeque;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::constants::events::MAX_RETAINED_EVENTS;
use crate::types::{Address, CauseId, ContentRef};

/// Event types for indexing and filtering
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Cause Events (0x01 - 0x1F)
    ContributionRecorded = 0x01,
    Disbursed = 0x02,
    AdministratorAdded = 0x03,
    AdministratorRenounced = 0x04,

    // Treasury Events (0x20 - 0x3F)
    SharesIssued = 0x20,
    SharesRedeemed = 0x21,
    ReserveSwept = 0x22,

    // Directory Events (0x40 - 0x5F)
    CurrencyConverterChanged = 0x40,
}

/// Main event enum containing all audit records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum BondFundEvent {
    // ============ Cause Events ============

    /// A contribution was split and credited
    ContributionRecorded {
        cause_id: CauseId,
        contributor: Address,
        value: u64,
        minted: u64,
    },

    /// Custodial funds were released to a recipient
    Disbursed {
        cause_id: CauseId,
        actor: Address,
        recipient: Address,
        amount: u64,
        content_ref: ContentRef,
    },

    /// An administrator added another administrator
    AdministratorAdded {
        cause_id: CauseId,
        by: Address,
        administrator: Address,
    },

    /// An administrator left the cause
    AdministratorRenounced {
        cause_id: CauseId,
        administrator: Address,
    },

    // ============ Treasury Events ============

    /// Shares minted against a reserve deposit
    SharesIssued {
        beneficiary: Address,
        deposit: u64,
        minted: u64,
        reserve_balance: u64,
        share_supply: u64,
    },

    /// Shares burned for a reserve payout
    SharesRedeemed {
        holder: Address,
        amount: u64,
        payout: u64,
        reserve_balance: u64,
        share_supply: u64,
    },

    /// Residual reserve moved out by the sweep authority
    ReserveSwept {
        by: Address,
        destination: Address,
        amount: u64,
        outstanding_supply: u64,
    },

    // ============ Directory Events ============

    /// The currency conversion adapter was replaced
    CurrencyConverterChanged {
        by: Address,
        adapter: String,
    },
}

impl BondFundEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::ContributionRecorded { .. } => EventType::ContributionRecorded,
            Self::Disbursed { .. } => EventType::Disbursed,
            Self::AdministratorAdded { .. } => EventType::AdministratorAdded,
            Self::AdministratorRenounced { .. } => EventType::AdministratorRenounced,
            Self::SharesIssued { .. } => EventType::SharesIssued,
            Self::SharesRedeemed { .. } => EventType::SharesRedeemed,
            Self::ReserveSwept { .. } => EventType::ReserveSwept,
            Self::CurrencyConverterChanged { .. } => EventType::CurrencyConverterChanged,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting events as operations commit.
///
/// The log keeps at most `capacity` undrained events. Once full, each new
/// event evicts the oldest one and bumps `dropped`.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<BondFundEvent>,
    capacity: usize,
    dropped: u64,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    /// Create a new empty event log holding up to `MAX_RETAINED_EVENTS`
    pub fn new() -> Self {
        Self::with_capacity(MAX_RETAINED_EVENTS)
    }

    /// Create a new empty event log holding up to `capacity` events (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: BondFundEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    /// Copy of the retained events, oldest first
    pub fn events(&self) -> Vec<BondFundEvent> {
        self.events.iter().cloned().collect()
    }

    /// Remove and return every retained event
    pub fn drain(&mut self) -> Vec<BondFundEvent> {
        self.events.drain(..).collect()
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&BondFundEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Events evicted before anyone drained them
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type() {
        let event = BondFundEvent::ContributionRecorded {
            cause_id: [9u8; 32],
            contributor: [2u8; 32],
            value: 100_000,
            minted: 41_421,
        };

        assert_eq!(event.event_type(), EventType::ContributionRecorded);
    }

    #[test]
    fn test_disbursed_keeps_reference_verbatim() {
        let event = BondFundEvent::Disbursed {
            cause_id: [9u8; 32],
            actor: [1u8; 32],
            recipient: [5u8; 32],
            amount: 40_000,
            content_ref: "QmPlaceholder/receipt.pdf".to_string(),
        };

        let restored = BondFundEvent::from_bytes(&event.to_bytes()).unwrap();
        assert_eq!(event, restored);
        assert!(matches!(
            restored,
            BondFundEvent::Disbursed { ref content_ref, .. }
                if content_ref == "QmPlaceholder/receipt.pdf"
        ));
    }

    #[test]
    fn test_event_log() {
        let mut log = EventLog::new();
        assert!(log.is_empty());

        log.emit(BondFundEvent::SharesIssued {
            beneficiary: [2u8; 32],
            deposit: 10_000,
            minted: 41_421,
            reserve_balance: 20_000,
            share_supply: 141_421,
        });
        log.emit(BondFundEvent::ContributionRecorded {
            cause_id: [9u8; 32],
            contributor: [2u8; 32],
            value: 100_000,
            minted: 41_421,
        });

        assert_eq!(log.len(), 2);
        assert!(log.has_events());
        assert_eq!(log.filter_by_type(EventType::SharesIssued).len(), 1);

        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert!(log.is_empty());
    }

    #[test]
    fn test_full_log_evicts_oldest() {
        let mut log = EventLog::with_capacity(3);
        for administrator in 1u8..=5 {
            log.emit(BondFundEvent::AdministratorRenounced {
                cause_id: [9u8; 32],
                administrator: [administrator; 32],
            });
        }

        assert_eq!(log.len(), 3);
        assert_eq!(log.dropped(), 2);
        assert!(matches!(
            log.events().first(),
            Some(BondFundEvent::AdministratorRenounced { administrator, .. })
                if *administrator == [3u8; 32]
        ));

        log.drain();
        log.emit(BondFundEvent::CurrencyConverterChanged {
            by: [1u8; 32],
            adapter: "identity".to_string(),
        });
        assert_eq!(log.len(), 1);
        assert_eq!(log.dropped(), 2);
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(BondFundEvent::from_bytes(&[0xFF, 0x00]).is_none());
    }
}
