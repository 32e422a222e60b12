//! Property-based tests for the item lifecycle state machine
//!
//! These pin the invariants that hold regardless of the specific inputs: a
//! terminal transition lands at most once, financial fields are written
//! exactly once and stay frozen afterwards, and a record survives its trip
//! through the CBOR codec unchanged.

use proptest::prelude::*;

use ewaste_exchange::{
    error::MarketError,
    item::{Condition, ItemDraft, ItemRecord, ItemStatus},
    lifecycle::{Decision, RECYCLE_RESALE_VALUE},
};

const RATE: f64 = 250_000.0;

fn decision_strategy() -> impl Strategy<Value = Decision> {
    prop_oneof![
        Just(Decision::Recycle),
        Just(Decision::Refurbish),
        Just(Decision::Scrap),
    ]
}

fn condition_strategy() -> impl Strategy<Value = Condition> {
    prop_oneof![
        Just(Condition::Working),
        Just(Condition::Repairable),
        Just(Condition::Scrap),
    ]
}

fn submitted_item_strategy() -> impl Strategy<Value = ItemRecord> {
    (condition_strategy(), 1.0f64..10_000.0).prop_map(|(condition, quoted)| {
        ItemDraft::new()
            .seller("user_seller")
            .category("Lot")
            .condition(condition)
            .quoted_price(quoted)
            .submit(RATE)
            .unwrap()
    })
}

proptest! {
    /// Property: one decision is all an item ever takes; the second attempt
    /// is rejected whatever it is
    #[test]
    fn prop_second_decision_is_always_rejected(
        item in submitted_item_strategy(),
        first in decision_strategy(),
        second in decision_strategy(),
        payout in 0.0f64..5_000.0,
    ) {
        let processed = item
            .apply_decision("user_official", first, payout, Some(10.0), Some(500.0), RATE)
            .unwrap();

        let err = processed
            .apply_decision("user_other", second, payout + 1.0, None, Some(700.0), RATE)
            .unwrap_err();

        prop_assert!(matches!(err, MarketError::InvalidTransition { .. }), "expected InvalidTransition");
    }

    /// Property: the decision writes every financial field once, at the
    /// rate in effect, and the branch effects match the decision taken
    #[test]
    fn prop_decision_effects_match_branch(
        item in submitted_item_strategy(),
        decision in decision_strategy(),
        payout in 0.0f64..5_000.0,
        repair in 0.0f64..2_000.0,
        selling in 1.0f64..20_000.0,
        rate in 1_000.0f64..1e6,
    ) {
        let processed = item
            .apply_decision("user_official", decision, payout, Some(repair), Some(selling), rate)
            .unwrap();

        prop_assert_eq!(processed.final_payout, payout);
        if payout > 0.0 {
            prop_assert!((processed.final_payout_eth - payout / rate).abs() < 1e-9);
        } else {
            prop_assert_eq!(processed.final_payout_eth, 0.0);
        }
        prop_assert_eq!(processed.processed_by.as_deref(), Some("user_official"));
        prop_assert_eq!(processed.current_branch.as_str(), decision.branch_label());

        match decision {
            Decision::Recycle => {
                prop_assert_eq!(processed.status, ItemStatus::Recycled);
                prop_assert_eq!(processed.selling_price, RECYCLE_RESALE_VALUE);
                prop_assert_eq!(processed.repair_cost, 0.0);
            }
            Decision::Refurbish => {
                prop_assert_eq!(processed.status, ItemStatus::ReadyToSell);
                prop_assert_eq!(processed.selling_price, selling);
                prop_assert_eq!(processed.repair_cost, repair);
            }
            Decision::Scrap => {
                prop_assert_eq!(processed.status, ItemStatus::Scrapped);
                prop_assert_eq!(processed.selling_price, 0.0);
                prop_assert_eq!(processed.repair_cost, 0.0);
            }
        }
    }

    /// Property: purchase succeeds from ReadyToSell and nowhere else, and
    /// the buyer lands exactly once
    #[test]
    fn prop_purchase_only_from_ready_to_sell(
        item in submitted_item_strategy(),
        decision in decision_strategy(),
        payout in 0.0f64..5_000.0,
    ) {
        let processed = item
            .apply_decision("user_official", decision, payout, None, Some(800.0), RATE)
            .unwrap();

        match processed.status {
            ItemStatus::ReadyToSell => {
                let sold = processed.apply_purchase("user_buyer").unwrap();
                prop_assert_eq!(sold.status, ItemStatus::Sold);
                prop_assert_eq!(sold.buyer_id.as_deref(), Some("user_buyer"));

                // sold is terminal, the next buyer bounces
                let err = sold.apply_purchase("user_late").unwrap_err();
                prop_assert!(matches!(err, MarketError::InvalidTransition { .. }), "expected InvalidTransition");
            }
            _ => {
                let err = processed.apply_purchase("user_buyer").unwrap_err();
                prop_assert!(matches!(err, MarketError::InvalidTransition { .. }), "expected InvalidTransition");
            }
        }
    }

    /// Property: terminal states admit no transition of either kind
    #[test]
    fn prop_terminal_states_are_stable(
        item in submitted_item_strategy(),
        decision in decision_strategy(),
        late_decision in decision_strategy(),
        payout in 0.0f64..5_000.0,
    ) {
        let mut record = item
            .apply_decision("user_official", decision, payout, None, Some(800.0), RATE)
            .unwrap();
        if record.status == ItemStatus::ReadyToSell {
            record = record.apply_purchase("user_buyer").unwrap();
        }

        prop_assert!(record.status.is_terminal());

        let before = record.clone();
        prop_assert!(record
            .apply_decision("user_other", late_decision, 1.0, None, Some(1.0), RATE)
            .is_err());
        prop_assert!(record.apply_purchase("user_other").is_err());
        // pure transitions: the rejected attempts touched nothing
        prop_assert_eq!(record, before);
    }

    /// Property: the CBOR codec round-trips any record bit for bit
    #[test]
    fn prop_cbor_roundtrip_preserves_record(
        item in submitted_item_strategy(),
        decision in decision_strategy(),
        payout in 0.0f64..5_000.0,
        process in prop::bool::ANY,
    ) {
        let record = if process {
            item.apply_decision("user_official", decision, payout, Some(25.0), Some(640.0), RATE)
                .unwrap()
        } else {
            item
        };

        let encoded = minicbor::to_vec(&record).unwrap();
        let decoded: ItemRecord = minicbor::decode(&encoded).unwrap();

        prop_assert_eq!(record, decoded);
    }

    /// Property: updated_at never moves backwards through a transition
    #[test]
    fn prop_updated_at_is_monotonic(
        item in submitted_item_strategy(),
        decision in decision_strategy(),
        payout in 0.0f64..5_000.0,
    ) {
        let processed = item
            .apply_decision("user_official", decision, payout, None, Some(800.0), RATE)
            .unwrap();
        prop_assert!(processed.updated_at >= item.updated_at);

        if processed.status == ItemStatus::ReadyToSell {
            let sold = processed.apply_purchase("user_buyer").unwrap();
            prop_assert!(sold.updated_at >= processed.updated_at);
        }
    }
}
