//! State machine for item processing and purchase transitions.
//!
//! Transitions are pure: they take the current record and return the
//! successor, leaving the input untouched. The repository's conditional
//! commit needs both images, and a failed transition must not leave a
//! half-mutated record behind.

use super::currency::rs_to_eth;
use super::error::{MarketError, ValidationError};
use super::item::{ItemRecord, ItemStatus};
use std::str::FromStr;

/// Resale value of recycled material. Standardised market value, not a
/// negotiated input.
pub const RECYCLE_RESALE_VALUE: f64 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Recycle,
    Refurbish,
    Scrap,
}

impl Decision {
    pub fn branch_label(&self) -> &'static str {
        match self {
            Decision::Recycle => "Recycle",
            Decision::Refurbish => "Refurbish & Sell",
            Decision::Scrap => "Scrap/Not Usable",
        }
    }
}

impl FromStr for Decision {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "recycle" => Ok(Decision::Recycle),
            "refurbish" => Ok(Decision::Refurbish),
            "scrap" => Ok(Decision::Scrap),
            _ => Err(MarketError::InvalidDecision(s.to_owned())),
        }
    }
}

impl ItemRecord {
    /// Applies an official's processing decision. Only legal from
    /// AwaitingValuation; every financial field this sets is set exactly
    /// once, at the rate passed in.
    pub fn apply_decision(
        &self,
        official_id: &str,
        decision: Decision,
        final_payout: f64,
        repair_cost: Option<f64>,
        selling_price: Option<f64>,
        rate: f64,
    ) -> Result<ItemRecord, MarketError> {
        if self.status != ItemStatus::AwaitingValuation {
            return Err(MarketError::InvalidTransition {
                from: self.status,
                operation: "process",
            });
        }
        if final_payout < 0.0 {
            return Err(ValidationError::NegativeAmount {
                field: "final_payout",
                value: final_payout,
            }
            .into());
        }
        if let Some(value) = repair_cost {
            if value < 0.0 {
                return Err(ValidationError::NegativeAmount {
                    field: "repair_cost",
                    value,
                }
                .into());
            }
        }
        if let Some(value) = selling_price {
            if value < 0.0 {
                return Err(ValidationError::NegativeAmount {
                    field: "selling_price",
                    value,
                }
                .into());
            }
        }

        let mut next = self.clone();
        next.final_payout = final_payout;
        next.final_payout_eth = rs_to_eth(final_payout, rate);
        next.processed_by = Some(official_id.to_owned());
        next.current_branch = decision.branch_label().to_owned();

        match decision {
            Decision::Recycle => {
                next.status = ItemStatus::Recycled;
                next.selling_price = RECYCLE_RESALE_VALUE;
                next.selling_price_eth = rs_to_eth(RECYCLE_RESALE_VALUE, rate);
                next.repair_cost = 0.0;
                next.repair_cost_eth = 0.0;
            }
            Decision::Refurbish => {
                let selling = selling_price.ok_or(ValidationError::MissingSellingPrice)?;
                next.status = ItemStatus::ReadyToSell;
                next.repair_cost = repair_cost.unwrap_or(0.0);
                next.repair_cost_eth = rs_to_eth(next.repair_cost, rate);
                next.selling_price = selling;
                next.selling_price_eth = rs_to_eth(selling, rate);
            }
            Decision::Scrap => {
                next.status = ItemStatus::Scrapped;
                next.repair_cost = 0.0;
                next.repair_cost_eth = 0.0;
                next.selling_price = 0.0;
                next.selling_price_eth = 0.0;
            }
        }

        next.touch();
        Ok(next)
    }

    /// Applies a buyer's purchase. Only legal from ReadyToSell, and a seller
    /// cannot buy back their own listing.
    pub fn apply_purchase(&self, buyer_id: &str) -> Result<ItemRecord, MarketError> {
        if self.status != ItemStatus::ReadyToSell {
            return Err(MarketError::InvalidTransition {
                from: self.status,
                operation: "purchase",
            });
        }
        if buyer_id == self.seller_id {
            return Err(ValidationError::BuyerIsSeller.into());
        }

        let mut next = self.clone();
        next.status = ItemStatus::Sold;
        next.buyer_id = Some(buyer_id.to_owned());
        next.touch();
        Ok(next)
    }
}
