//! Append-only settlement ledger for simulated crypto payments.
//!
//! The item record stays the source of truth for current state; the ledger
//! exists so an auditor can reconstruct every payment event that ever
//! happened, including reversals for payments whose commit lost a race.

use super::item::TimeStamp;
use super::utils;
use chrono::Utc;
use std::sync::Arc;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq)]
pub enum SettlementKind {
    #[n(0)]
    Payout,
    #[n(1)]
    Purchase,
    #[n(2)]
    Reversal,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq)]
pub enum SettlementStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    Confirmed,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct SettlementEntry {
    #[n(0)]
    pub id: String, // uuid7, bech32 "stl_" prefix
    #[n(1)]
    pub item_id: String,
    #[n(2)]
    pub kind: SettlementKind,
    #[n(3)]
    pub from_address: String,
    #[n(4)]
    pub to_address: String,
    #[n(5)]
    pub amount_rs: f64,
    #[n(6)]
    pub amount_eth: f64,
    #[n(7)]
    pub exchange_rate: f64,
    #[n(8)]
    pub tx_reference: String,
    #[n(9)]
    pub status: SettlementStatus,
    #[n(10)]
    pub confirmed_at: Option<TimeStamp<Utc>>,
    #[n(11)]
    pub logged_at: TimeStamp<Utc>,
}

impl SettlementEntry {
    /// A gateway-supplied reference means the transfer confirmed; without
    /// one the entry is logged pending under a local placeholder.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        item_id: &str,
        kind: SettlementKind,
        from_address: &str,
        to_address: &str,
        amount_rs: f64,
        amount_eth: f64,
        exchange_rate: f64,
        tx_reference: Option<String>,
    ) -> anyhow::Result<Self> {
        let (tx_reference, status, confirmed_at) = match tx_reference {
            Some(hash) => (hash, SettlementStatus::Confirmed, Some(TimeStamp::new())),
            None => (
                utils::placeholder_reference(),
                SettlementStatus::Pending,
                None,
            ),
        };

        Ok(Self {
            id: utils::new_uuid_to_bech32("stl_")?,
            item_id: item_id.to_owned(),
            kind,
            from_address: from_address.to_owned(),
            to_address: to_address.to_owned(),
            amount_rs,
            amount_eth,
            exchange_rate,
            tx_reference,
            status,
            confirmed_at,
            logged_at: TimeStamp::new(),
        })
    }

    /// Compensation entry for a settled payment whose record commit was
    /// lost: same amounts, addresses swapped.
    pub fn reversal_of(&self) -> anyhow::Result<Self> {
        Ok(Self {
            id: utils::new_uuid_to_bech32("stl_")?,
            item_id: self.item_id.clone(),
            kind: SettlementKind::Reversal,
            from_address: self.to_address.clone(),
            to_address: self.from_address.clone(),
            amount_rs: self.amount_rs,
            amount_eth: self.amount_eth,
            exchange_rate: self.exchange_rate,
            tx_reference: format!("reversal_{}", self.tx_reference),
            status: SettlementStatus::Confirmed,
            confirmed_at: Some(TimeStamp::new()),
            logged_at: TimeStamp::new(),
        })
    }
}

/// Ledger over a dedicated sled tree. Entries are keyed by a monotonic
/// sequence number so iteration replays them in append order; there is no
/// update or delete path.
pub struct SettlementLog {
    db: Arc<sled::Db>,
    tree: sled::Tree,
}

impl SettlementLog {
    pub fn open(db: Arc<sled::Db>) -> anyhow::Result<Self> {
        let tree = db.open_tree("settlements")?;
        Ok(Self { db, tree })
    }

    pub fn append(&self, entry: &SettlementEntry) -> anyhow::Result<()> {
        let seq = self.db.generate_id()?;
        self.tree
            .insert(seq.to_be_bytes(), minicbor::to_vec(entry)?)?;
        Ok(())
    }

    pub fn entries(&self) -> anyhow::Result<Vec<SettlementEntry>> {
        let mut out = Vec::new();
        for pair in self.tree.iter() {
            let (_, raw) = pair?;
            out.push(minicbor::decode(&raw)?);
        }
        Ok(out)
    }

    pub fn entries_for_item(&self, item_id: &str) -> anyhow::Result<Vec<SettlementEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|entry| entry.item_id == item_id)
            .collect())
    }
}
