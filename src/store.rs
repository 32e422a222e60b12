//! Item repository with optimistic concurrency on terminal transitions.
//!
//! All writes to an existing item go through [`ItemStore::try_commit`],
//! a compare-and-swap against the record bytes read at the start of the
//! attempt. Reads never block and different items never contend.

use super::error::MarketError;
use super::item::{ItemRecord, ItemStatus};

pub struct ItemStore {
    tree: sled::Tree,
}

fn encode(item: &ItemRecord) -> Result<Vec<u8>, MarketError> {
    minicbor::to_vec(item).map_err(|e| MarketError::Codec(e.to_string()))
}

fn decode(raw: &[u8]) -> Result<ItemRecord, MarketError> {
    minicbor::decode(raw).map_err(|e| MarketError::Codec(e.to_string()))
}

impl ItemStore {
    pub fn open(db: &sled::Db) -> Result<Self, MarketError> {
        let tree = db.open_tree("items")?;
        Ok(Self { tree })
    }

    /// Inserts a freshly submitted record. Ids are unique, so this never
    /// replaces an existing item.
    pub fn insert(&self, item: &ItemRecord) -> Result<(), MarketError> {
        self.tree.insert(item.id.as_bytes(), encode(item)?)?;
        Ok(())
    }

    pub fn get(&self, item_id: &str) -> Result<ItemRecord, MarketError> {
        let raw = self
            .tree
            .get(item_id.as_bytes())?
            .ok_or_else(|| MarketError::UnknownItem(item_id.to_owned()))?;
        decode(&raw)
    }

    pub fn items(&self) -> Result<Vec<ItemRecord>, MarketError> {
        let mut out = Vec::new();
        for pair in self.tree.iter() {
            let (_, raw) = pair?;
            out.push(decode(&raw)?);
        }
        Ok(out)
    }

    pub fn items_by_status(&self, status: ItemStatus) -> Result<Vec<ItemRecord>, MarketError> {
        Ok(self
            .items()?
            .into_iter()
            .filter(|item| item.status == status)
            .collect())
    }

    /// Change feed over the whole item tree, for dashboards that keep
    /// themselves current without polling.
    pub fn watch(&self) -> sled::Subscriber {
        self.tree.watch_prefix(vec![])
    }

    /// At-most-one winner per terminal transition. The mutation runs on the
    /// record as read at the start of the attempt; the swap succeeds only
    /// if nobody replaced those bytes in the meantime.
    ///
    /// A stale `expected` status fails with `InvalidTransition` (the caller
    /// must re-fetch); a swap miss fails with `Conflict` (the race was lost
    /// at the commit instant). Neither is retried here, and an external
    /// payment made before the attempt is not reversed here either - that
    /// reconciliation belongs to the caller.
    pub fn try_commit<F>(
        &self,
        item_id: &str,
        expected: ItemStatus,
        operation: &'static str,
        mutate: F,
    ) -> Result<ItemRecord, MarketError>
    where
        F: FnOnce(&ItemRecord) -> Result<ItemRecord, MarketError>,
    {
        let raw = self
            .tree
            .get(item_id.as_bytes())?
            .ok_or_else(|| MarketError::UnknownItem(item_id.to_owned()))?;
        let current = decode(&raw)?;

        if current.status != expected {
            return Err(MarketError::InvalidTransition {
                from: current.status,
                operation,
            });
        }

        let next = mutate(&current)?;
        let swap = self
            .tree
            .compare_and_swap(item_id.as_bytes(), Some(raw), Some(encode(&next)?))?;

        match swap {
            Ok(()) => Ok(next),
            Err(_) => Err(MarketError::Conflict(item_id.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Condition, ItemDraft};
    use crate::lifecycle::Decision;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, ItemStore) {
        let dir = tempdir().unwrap();
        let db = Arc::new(sled::open(dir.path().join("store_test.db")).unwrap());
        (dir, ItemStore::open(&db).unwrap())
    }

    fn submitted() -> ItemRecord {
        ItemDraft::new()
            .seller("user_seller")
            .category("Monitor")
            .condition(Condition::Working)
            .quoted_price(700.0)
            .submit(250_000.0)
            .unwrap()
    }

    #[test]
    fn commit_applies_mutation_once() {
        let (_dir, store) = store();
        let item = submitted();
        store.insert(&item).unwrap();

        let committed = store
            .try_commit(&item.id, ItemStatus::AwaitingValuation, "process", |it| {
                it.apply_decision("user_official", Decision::Scrap, 50.0, None, None, 250_000.0)
            })
            .unwrap();
        assert_eq!(committed.status, ItemStatus::Scrapped);

        // the stored image moved on, so the same expectation is now stale
        let err = store
            .try_commit(&item.id, ItemStatus::AwaitingValuation, "process", |it| {
                it.apply_decision("user_official", Decision::Scrap, 50.0, None, None, 250_000.0)
            })
            .unwrap_err();
        assert!(matches!(err, MarketError::InvalidTransition { .. }));
    }

    #[test]
    fn unknown_item_is_reported() {
        let (_dir, store) = store();
        let err = store
            .try_commit("item_missing", ItemStatus::ReadyToSell, "purchase", |it| {
                it.apply_purchase("user_buyer")
            })
            .unwrap_err();
        assert!(matches!(err, MarketError::UnknownItem(_)));
    }

    #[test]
    fn failed_mutation_leaves_record_untouched() {
        let (_dir, store) = store();
        let item = submitted();
        store.insert(&item).unwrap();

        let err = store
            .try_commit(&item.id, ItemStatus::AwaitingValuation, "process", |it| {
                it.apply_decision(
                    "user_official",
                    Decision::Refurbish,
                    -5.0,
                    None,
                    Some(100.0),
                    250_000.0,
                )
            })
            .unwrap_err();
        assert!(matches!(err, MarketError::Validation(_)));
        assert_eq!(store.get(&item.id).unwrap(), item);
    }
}
