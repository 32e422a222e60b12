//! Financial aggregation across a snapshot of item records.

use super::item::{ItemRecord, ItemStatus};
use super::lifecycle::RECYCLE_RESALE_VALUE;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FinancialSummary {
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
}

/// Folds every item's contribution into one summary. Pure function of the
/// snapshot: order-independent, and re-aggregating an unchanged collection
/// yields the same figures.
///
/// Repair cost counts wherever it was incurred, not only on sold items.
pub fn aggregate(items: &[ItemRecord]) -> FinancialSummary {
    let mut revenue = 0.0;
    let mut cost = 0.0;

    for item in items {
        match item.status {
            ItemStatus::Sold => {
                revenue += item.selling_price;
                cost += item.final_payout + item.repair_cost;
            }
            ItemStatus::Recycled => {
                revenue += RECYCLE_RESALE_VALUE;
                cost += item.final_payout;
            }
            // acquired but nothing recovered, a sunk cost
            _ if item.final_payout > 0.0 => {
                cost += item.final_payout + item.repair_cost;
            }
            _ => {}
        }
    }

    FinancialSummary {
        revenue,
        cost,
        profit: revenue - cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Condition, ItemDraft};
    use crate::lifecycle::Decision;

    const RATE: f64 = 250_000.0;

    fn submitted(price: f64) -> ItemRecord {
        ItemDraft::new()
            .seller("user_seller")
            .category("Mixed")
            .condition(Condition::Repairable)
            .quoted_price(price)
            .submit(RATE)
            .unwrap()
    }

    #[test]
    fn awaiting_items_contribute_nothing() {
        let summary = aggregate(&[submitted(1_000.0), submitted(2_000.0)]);
        assert_eq!(summary, FinancialSummary::default());
    }

    #[test]
    fn recycled_item_books_fixed_revenue() {
        let item = submitted(1_000.0)
            .apply_decision("user_official", Decision::Recycle, 500.0, None, None, RATE)
            .unwrap();

        let summary = aggregate(&[item]);
        assert_eq!(summary.revenue, 150.0);
        assert_eq!(summary.cost, 500.0);
        assert_eq!(summary.profit, -350.0);
    }

    #[test]
    fn sold_item_books_full_margin() {
        let item = submitted(2_000.0)
            .apply_decision(
                "user_official",
                Decision::Refurbish,
                800.0,
                Some(200.0),
                Some(3_000.0),
                RATE,
            )
            .unwrap()
            .apply_purchase("user_buyer")
            .unwrap();

        let summary = aggregate(&[item]);
        assert_eq!(summary.revenue, 3_000.0);
        assert_eq!(summary.cost, 1_000.0);
        assert_eq!(summary.profit, 2_000.0);
    }

    #[test]
    fn unsold_listing_is_sunk_acquisition_cost() {
        // refurbished but nobody bought it yet
        let item = submitted(2_000.0)
            .apply_decision(
                "user_official",
                Decision::Refurbish,
                800.0,
                Some(200.0),
                Some(3_000.0),
                RATE,
            )
            .unwrap();

        let summary = aggregate(&[item]);
        assert_eq!(summary.revenue, 0.0);
        assert_eq!(summary.cost, 1_000.0);
    }
}
