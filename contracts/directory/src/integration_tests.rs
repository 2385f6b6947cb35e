//! Integration Tests
//!
//! End-to-end tests across the directory, the causes, the shared treasury
//! and the claim ledger.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use crate::*;
    use bondfund_claim_token::ClaimToken;
    use bondfund_common::converter::FixedRateConverter;
    use bondfund_common::errors::ErrorKind;
    use bondfund_common::events::EventType;
    use bondfund_common::types::CurrencyTransfer;
    use proptest::prelude::*;

    fn owner() -> Address {
        [1u8; 32]
    }

    fn treasury_id() -> Address {
        [2u8; 32]
    }

    fn admin1() -> Address {
        [10u8; 32]
    }

    fn admin2() -> Address {
        [11u8; 32]
    }

    fn admin3() -> Address {
        [12u8; 32]
    }

    fn donor1() -> Address {
        [20u8; 32]
    }

    fn donor2() -> Address {
        [21u8; 32]
    }

    fn supplier() -> Address {
        [30u8; 32]
    }

    fn config() -> DirectoryConfig {
        DirectoryConfig {
            owner: owner(),
            treasury_id: treasury_id(),
            initial_reserve: 10_000,
            seed_supply: 100_000,
            reserve_ratio_ppm: 500_000,
            causes: vec![
                CauseConfig {
                    name: "Clean water".to_string(),
                    reserve_bps: 1_000,
                    custodial_bps: 9_000,
                    administrators: vec![admin1(), admin2()],
                },
                CauseConfig {
                    name: "School meals".to_string(),
                    reserve_bps: 2_000,
                    custodial_bps: 8_000,
                    administrators: vec![admin3()],
                },
            ],
        }
    }

    fn create_directory() -> Directory<ClaimToken> {
        let ledger = ClaimToken::new(treasury_id()).unwrap();
        Directory::setup(config(), ledger).unwrap()
    }

    // ============================================================================
    // Contribution Scenarios
    // ============================================================================

    #[test]
    fn test_single_contribution_split() {
        let directory = create_directory();
        let cause = directory.at(0).unwrap();

        let receipt = cause.contribute(&donor1(), 100_000).unwrap();

        assert_eq!(cause.custodial_balance().unwrap(), 90_000);
        assert_eq!(directory.treasury().reserve_balance().unwrap(), 20_000);
        assert_eq!(
            directory.treasury().balance_of(&donor1()).unwrap(),
            receipt.minted
        );

        let events = cause.events().unwrap();
        assert!(matches!(
            events.as_slice(),
            [BondFundEvent::ContributionRecorded { value: 100_000, minted, .. }]
                if *minted == receipt.minted
        ));
    }

    #[test]
    fn test_second_contribution_accumulates() {
        let directory = create_directory();
        let cause = directory.at(0).unwrap();

        cause.contribute(&donor1(), 100_000).unwrap();
        cause.contribute(&donor2(), 200_000).unwrap();

        assert_eq!(cause.custodial_balance().unwrap(), 270_000);
        assert_eq!(cause.cumulative_received().unwrap(), 270_000);
        assert_eq!(directory.treasury().reserve_balance().unwrap(), 40_000);
    }

    #[test]
    fn test_sweep_authority_and_drain() {
        let directory = create_directory();
        let cause = directory.at(0).unwrap();
        let treasury = directory.treasury();

        let minted1 = cause.contribute(&donor1(), 100_000).unwrap().minted;
        let minted2 = cause.contribute(&donor2(), 200_000).unwrap().minted;

        // Non-authority sweep changes nothing
        let err = directory.trigger_sweep(&donor1()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        let err = treasury.sweep(&admin1(), &admin1()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(treasury.reserve_balance().unwrap(), 40_000);

        // Contributors cash out
        let payout1 = treasury.redeem(minted1, &donor1()).unwrap().payout;
        let payout2 = treasury.redeem(minted2, &donor2()).unwrap().payout;
        assert!(payout1 + payout2 <= 30_000);
        assert_eq!(treasury.share_supply().unwrap(), 100_000);

        let remaining = treasury.reserve_balance().unwrap();
        assert!(remaining >= 10_000);

        let receipt = directory.trigger_sweep(&owner()).unwrap();
        assert_eq!(receipt.amount, remaining);
        assert_eq!(receipt.transfer, CurrencyTransfer { to: owner(), amount: remaining });
        assert_eq!(treasury.reserve_balance().unwrap(), 0);
    }

    #[test]
    fn test_renounced_admin_cannot_disburse() {
        let directory = create_directory();
        let cause = directory.at(0).unwrap();
        cause.contribute(&donor1(), 100_000).unwrap();

        cause.renounce_administrator(&admin2()).unwrap();
        let err = cause
            .disburse(&admin2(), 10_000, &supplier(), "QmPumpInvoice")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(cause.custodial_balance().unwrap(), 90_000);

        // The remaining administrator still can
        let receipt = cause
            .disburse(&admin1(), 10_000, &supplier(), "QmPumpInvoice")
            .unwrap();
        assert_eq!(receipt.transfer.to, supplier());
        assert_eq!(cause.custodial_balance().unwrap(), 80_000);
    }

    #[test]
    fn test_causes_share_one_treasury() {
        let directory = create_directory();
        let water = directory.at(0).unwrap();
        let meals = directory.at(1).unwrap();

        water.contribute(&donor1(), 100_000).unwrap();
        meals.contribute(&donor1(), 100_000).unwrap();

        assert_eq!(water.custodial_balance().unwrap(), 90_000);
        assert_eq!(meals.custodial_balance().unwrap(), 80_000);
        assert_eq!(directory.treasury().reserve_balance().unwrap(), 40_000);

        // Administrators are per cause
        let err = meals.disburse(&admin1(), 1, &supplier(), "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    // ============================================================================
    // Quotes
    // ============================================================================

    #[test]
    fn test_reward_quote_matches_contribution() {
        let directory = create_directory();
        let cause = directory.at(1).unwrap();

        for value in [1_000u64, 77_777, 250_000] {
            let quote = cause.my_reward(&donor1(), value).unwrap();
            let receipt = cause.contribute(&donor1(), value).unwrap();
            assert_eq!(quote, receipt.minted);
        }
    }

    #[test]
    fn test_return_quote_matches_redeem() {
        let directory = create_directory();
        let cause = directory.at(0).unwrap();
        let minted = cause.contribute(&donor1(), 500_000).unwrap().minted;

        let half = minted / 2;
        let quote = cause.my_return(&donor1(), half).unwrap();
        let receipt = directory.treasury().redeem(half, &donor1()).unwrap();
        assert_eq!(quote, receipt.payout);
    }

    proptest! {
        #[test]
        fn reward_quote_is_exact(first in 1u64..10_000_000, second in 1u64..10_000_000) {
            let directory = create_directory();
            let cause = directory.at(0).unwrap();
            cause.contribute(&donor1(), first).unwrap();
            let quote = cause.my_reward(&donor2(), second).unwrap();
            let receipt = cause.contribute(&donor2(), second).unwrap();
            prop_assert_eq!(quote, receipt.minted);
        }
    }

    // ============================================================================
    // Enumeration & Converter
    // ============================================================================

    #[test]
    fn test_enumeration() {
        let directory = create_directory();
        assert_eq!(directory.count(), 2);
        assert_eq!(directory.owner(), owner());

        let meals = directory.at(1).unwrap();
        assert_eq!(meals.name().unwrap(), "School meals");
        let found = directory.cause(&meals.cause_id()).unwrap();
        assert_eq!(found.cause_id(), meals.cause_id());
        assert!(directory.cause(&[0xEE; 32]).is_none());

        let err = directory.at(2).err().unwrap();
        assert!(matches!(err, BondFundError::IndexOutOfRange { index: 2, count: 2 }));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_currency_converter_slot() {
        let directory = create_directory();
        assert!(matches!(
            directory.convert(1_000),
            Err(BondFundError::ConverterNotRegistered)
        ));

        let converter = Arc::new(FixedRateConverter::new("eur", 11, 10).unwrap());
        let err = directory
            .set_currency_converter(&donor1(), converter.clone())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(directory.converter_name().unwrap(), None);

        directory.set_currency_converter(&owner(), converter).unwrap();
        assert_eq!(directory.convert(1_000).unwrap(), 1_100);
        assert_eq!(directory.converter_name().unwrap().as_deref(), Some("eur"));

        directory
            .set_currency_converter(&owner(), Arc::new(FixedRateConverter::identity()))
            .unwrap();
        assert_eq!(directory.convert(1_000).unwrap(), 1_000);

        let changes = directory.events().unwrap();
        assert_eq!(changes.len(), 2);
        assert!(changes
            .iter()
            .all(|e| e.event_type() == EventType::CurrencyConverterChanged));
    }

    // ============================================================================
    // Atomicity & Concurrency
    // ============================================================================

    #[test]
    fn test_failed_contribution_leaves_no_trace() {
        let directory = create_directory();
        let cause = directory.at(0).unwrap();
        cause.contribute(&donor1(), 100_000).unwrap();
        directory.trigger_sweep(&owner()).unwrap();
        let supply_before = directory.treasury().share_supply().unwrap();
        directory.take_events().unwrap();

        let err = cause.contribute(&donor2(), 100_000).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Arithmetic);

        assert_eq!(cause.custodial_balance().unwrap(), 90_000);
        assert_eq!(directory.treasury().share_supply().unwrap(), supply_before);
        assert_eq!(directory.treasury().balance_of(&donor2()).unwrap(), 0);
        assert!(directory.take_events().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_contributions_serialize() {
        let directory = create_directory();
        let donors: Vec<Address> = (0u8..4).map(|i| [40 + i; 32]).collect();

        thread::scope(|scope| {
            for donor in &donors {
                let directory = &directory;
                scope.spawn(move || {
                    let cause = directory.at(0).unwrap();
                    for _ in 0..25 {
                        cause.contribute(donor, 1_000).unwrap();
                    }
                });
            }
        });

        let cause = directory.at(0).unwrap();
        let treasury = directory.treasury();
        assert_eq!(cause.custodial_balance().unwrap(), 90_000);
        assert_eq!(treasury.reserve_balance().unwrap(), 20_000);

        let held: u64 = donors
            .iter()
            .map(|d| treasury.balance_of(d).unwrap())
            .sum::<u64>()
            + treasury.balance_of(&owner()).unwrap();
        assert_eq!(held, treasury.share_supply().unwrap());

        let recorded = cause
            .events()
            .unwrap()
            .iter()
            .filter(|e| e.event_type() == EventType::ContributionRecorded)
            .count();
        assert_eq!(recorded, 100);
    }

    #[test]
    fn test_event_stream_order() {
        let directory = create_directory();
        let cause = directory.at(0).unwrap();
        directory
            .set_currency_converter(&owner(), Arc::new(FixedRateConverter::identity()))
            .unwrap();
        cause.contribute(&donor1(), 100_000).unwrap();
        cause.disburse(&admin1(), 5_000, &supplier(), "QmReceipt").unwrap();

        let types: Vec<EventType> = directory
            .take_events()
            .unwrap()
            .iter()
            .map(|e| e.event_type())
            .collect();
        assert_eq!(
            types,
            vec![
                EventType::CurrencyConverterChanged,
                EventType::SharesIssued,
                EventType::ContributionRecorded,
                EventType::Disbursed,
            ]
        );
    }

    #[test]
    fn test_converter_swap_rolls_back_on_poisoned_log() {
        let directory = create_directory();
        let poisoned = thread::scope(|scope| {
            scope
                .spawn(|| {
                    let _held = directory.events.lock().unwrap();
                    panic!("writer died holding the event log");
                })
                .join()
        });
        assert!(poisoned.is_err());

        let err = directory
            .set_currency_converter(&owner(), Arc::new(FixedRateConverter::identity()))
            .unwrap_err();
        assert!(matches!(err, BondFundError::LockPoisoned));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(directory.converter_name().unwrap(), None);
        assert!(matches!(
            directory.convert(1_000),
            Err(BondFundError::ConverterNotRegistered)
        ));
    }

    // ============================================================================
    // Persistence
    // ============================================================================

    #[test]
    fn test_snapshot_restore_continues_identically() {
        let directory = create_directory();
        let cause = directory.at(0).unwrap();
        cause.contribute(&donor1(), 100_000).unwrap();
        cause.add_administrator(&admin1(), &admin3()).unwrap();
        cause.disburse(&admin3(), 20_000, &supplier(), "QmFilter").unwrap();

        let (snapshot, ledger) = directory.snapshot().unwrap();
        let bytes = snapshot.to_bytes();
        let snapshot = DirectorySnapshot::from_bytes(&bytes).unwrap();
        let restored = Directory::restore(snapshot, ledger).unwrap();

        assert_eq!(restored.snapshot().unwrap(), directory.snapshot().unwrap());
        assert_eq!(restored.count(), 2);
        assert!(restored.at(0).unwrap().is_administrator(&admin3()).unwrap());

        let original = cause.contribute(&donor2(), 60_000).unwrap();
        let replayed = restored.at(0).unwrap().contribute(&donor2(), 60_000).unwrap();
        assert_eq!(original, replayed);
    }

    #[test]
    fn test_snapshots_during_contributions_always_restore() {
        let directory = create_directory();
        let donors: Vec<Address> = (0u8..3).map(|i| [50 + i; 32]).collect();

        let snapshots = thread::scope(|scope| {
            for (slot, donor) in donors.iter().enumerate() {
                let directory = &directory;
                scope.spawn(move || {
                    let cause = directory.at(slot % 2).unwrap();
                    for _ in 0..40 {
                        cause.contribute(donor, 7_000).unwrap();
                        directory.treasury().redeem(1, donor).unwrap();
                    }
                });
            }
            let taker = scope.spawn(|| {
                (0..40)
                    .map(|_| directory.snapshot().unwrap())
                    .collect::<Vec<_>>()
            });
            taker.join().unwrap()
        });

        for (snapshot, ledger) in snapshots {
            let custodial: u64 = snapshot.causes.iter().map(|c| c.fund.balance()).sum();
            let restored = Directory::restore(snapshot, ledger).unwrap();
            assert_eq!(
                restored.treasury().share_supply().unwrap(),
                restored.treasury().ledger().unwrap().total_supply()
            );
            let held: u64 = (0..restored.count())
                .map(|i| restored.at(i).unwrap().custodial_balance().unwrap())
                .sum();
            assert_eq!(held, custodial);
        }
    }

    #[test]
    fn test_restore_rejects_inconsistent_state() {
        let directory = create_directory();
        directory.at(0).unwrap().contribute(&donor1(), 100_000).unwrap();
        let (snapshot, ledger) = directory.snapshot().unwrap();

        // Supply mirror out of step with the ledger
        let mut bad = snapshot.clone();
        bad.treasury.share_supply += 1;
        let err = Directory::restore(bad, ledger.clone()).err().unwrap();
        assert!(matches!(err, BondFundError::SupplyMismatch { .. }));

        // Cause moved to another slot
        let mut snapshot = snapshot;
        snapshot.causes.swap(0, 1);
        assert!(matches!(
            Directory::restore(snapshot, ledger),
            Err(BondFundError::InvalidStateEncoding)
        ));

        assert!(matches!(
            DirectorySnapshot::from_bytes(&[1, 2, 3]),
            Err(BondFundError::InvalidStateEncoding)
        ));
    }
}
