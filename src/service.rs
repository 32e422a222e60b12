//! Service layer API for marketplace workflow operations
use super::currency::{DEFAULT_RS_PER_ETH, format_dual};
use super::error::{MarketError, ValidationError};
use super::finance::{FinancialSummary, aggregate};
use super::item::{ItemDraft, ItemRecord, ItemStatus};
use super::ledger::{SettlementEntry, SettlementKind, SettlementLog};
use super::lifecycle::Decision;
use super::store::ItemStore;
use super::wallet::{COMPANY_WALLET_ADDRESS, PaymentGateway, SimulatedGateway, WalletProfile};
use std::sync::Arc;

const RATE_KEY: &[u8] = b"rs_to_eth_rate";

pub struct MarketService {
    items: ItemStore,
    ledger: SettlementLog,
    profiles: sled::Tree,
    config: sled::Tree,
    gateway: Box<dyn PaymentGateway>,
}

impl MarketService {
    pub fn new(instance: Arc<sled::Db>) -> anyhow::Result<Self> {
        Self::with_gateway(instance, Box::new(SimulatedGateway))
    }

    pub fn with_gateway(
        instance: Arc<sled::Db>,
        gateway: Box<dyn PaymentGateway>,
    ) -> anyhow::Result<Self> {
        let items = ItemStore::open(&instance)?;
        let profiles = instance.open_tree("profiles")?;
        let config = instance.open_tree("config")?;
        let ledger = SettlementLog::open(instance)?;

        Ok(Self {
            items,
            ledger,
            profiles,
            config,
            gateway,
        })
    }

    // PROFILES

    pub fn upsert_profile(&self, profile: &WalletProfile) -> anyhow::Result<()> {
        self.profiles
            .insert(profile.user_id.as_bytes(), minicbor::to_vec(profile)?)?;
        Ok(())
    }

    pub fn profile(&self, user_id: &str) -> anyhow::Result<Option<WalletProfile>> {
        match self.profiles.get(user_id.as_bytes())? {
            Some(raw) => Ok(Some(minicbor::decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// Stores a wallet address for an actor and marks it verified. The
    /// address must satisfy the 0x-plus-40-hex contract.
    pub fn verify_wallet(&self, user_id: &str, address: &str) -> anyhow::Result<WalletProfile> {
        let profile = self
            .profile(user_id)?
            .ok_or_else(|| MarketError::UnknownActor(user_id.to_owned()))?;
        let profile = profile
            .with_verified_wallet(address)
            .map_err(MarketError::from)?;
        self.upsert_profile(&profile)?;
        Ok(profile)
    }

    fn verified_wallet_of(&self, user_id: &str) -> anyhow::Result<String> {
        let profile = self
            .profile(user_id)?
            .ok_or_else(|| MarketError::UnknownActor(user_id.to_owned()))?;
        match profile.verified_address() {
            Some(address) => Ok(address.to_owned()),
            None => Err(MarketError::WalletNotVerified(user_id.to_owned()).into()),
        }
    }

    // EXCHANGE RATE

    /// Current Rs-per-ETH rate from config, falling back to the default.
    pub fn exchange_rate(&self) -> anyhow::Result<f64> {
        match self.config.get(RATE_KEY)? {
            Some(raw) => {
                let text = std::str::from_utf8(&raw)?;
                Ok(text.parse::<f64>().unwrap_or(DEFAULT_RS_PER_ETH))
            }
            None => Ok(DEFAULT_RS_PER_ETH),
        }
    }

    pub fn set_exchange_rate(&self, rate: f64) -> anyhow::Result<()> {
        if rate <= 0.0 {
            return Err(MarketError::from(ValidationError::NonPositiveRate(rate)).into());
        }
        self.config.insert(RATE_KEY, rate.to_string().as_bytes())?;
        tracing::info!("exchange rate set to 1 ETH = Rs {rate}");
        Ok(())
    }

    // WORKFLOW OPERATIONS

    /// Submit a new item for valuation
    pub fn submit_item(&self, draft: ItemDraft) -> anyhow::Result<ItemRecord> {
        let rate = self.exchange_rate()?;
        let item = draft.submit(rate)?;
        self.items.insert(&item)?;

        tracing::info!(
            "item {} ({}) submitted by {}, awaiting valuation",
            item.id,
            item.category,
            item.seller_id
        );
        Ok(item)
    }

    /// Apply an official's processing decision to an item awaiting
    /// valuation, paying the seller out in simulated ETH.
    ///
    /// Order matters: inputs and the source state are validated first, then
    /// the seller's wallet, and only then is the payout initiated. The
    /// record commit comes last; if it is lost to a concurrent processor the
    /// already-settled payout is compensated with a reversal ledger entry
    /// and the caller sees the failure.
    pub fn process_item(
        &self,
        official_id: &str,
        item_id: &str,
        decision: Decision,
        final_payout: f64,
        repair_cost: Option<f64>,
        selling_price: Option<f64>,
    ) -> anyhow::Result<ItemRecord> {
        let current = self.items.get(item_id)?;
        let rate = self.exchange_rate()?;

        // dry run against the snapshot: full validation, no side effects
        let staged = current.apply_decision(
            official_id,
            decision,
            final_payout,
            repair_cost,
            selling_price,
            rate,
        )?;

        let seller_wallet = self.verified_wallet_of(&current.seller_id)?;

        tracing::info!(
            "paying out {} to seller {} for item {}",
            format_dual(staged.final_payout, staged.final_payout_eth),
            current.seller_id,
            item_id
        );
        let tx_hash = self
            .gateway
            .transfer(COMPANY_WALLET_ADDRESS, &seller_wallet, staged.final_payout_eth)
            .map_err(|e| MarketError::Gateway(e.to_string()))?;

        let entry = SettlementEntry::new(
            item_id,
            SettlementKind::Payout,
            COMPANY_WALLET_ADDRESS,
            &seller_wallet,
            staged.final_payout,
            staged.final_payout_eth,
            rate,
            Some(tx_hash),
        )?;

        let commit = self
            .items
            .try_commit(item_id, ItemStatus::AwaitingValuation, "process", |item| {
                item.apply_decision(
                    official_id,
                    decision,
                    final_payout,
                    repair_cost,
                    selling_price,
                    rate,
                )
            });

        let committed = match commit {
            Ok(item) => item,
            Err(err @ (MarketError::Conflict(_) | MarketError::InvalidTransition { .. })) => {
                tracing::warn!(
                    "payout for item {item_id} settled but the commit was lost: {err}"
                );
                self.ledger.append(&entry)?;
                self.ledger.append(&entry.reversal_of()?)?;
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };

        self.ledger.append(&entry)?;
        tracing::info!(
            "item {} processed as {} by {}",
            item_id,
            committed.status,
            official_id
        );
        Ok(committed)
    }

    /// Purchase a listed item with a simulated ETH payment from the buyer.
    ///
    /// The price charged is the one frozen on the record at processing
    /// time, not a live reconversion. Same saga shape as processing: the
    /// payment precedes the commit, and a lost race is compensated on the
    /// ledger and surfaced as a conflict.
    pub fn purchase_item(&self, buyer_id: &str, item_id: &str) -> anyhow::Result<ItemRecord> {
        let current = self.items.get(item_id)?;

        // dry run: state and buyer checks before anything external
        current.apply_purchase(buyer_id)?;

        let buyer_wallet = self.verified_wallet_of(buyer_id)?;
        let rate = self.exchange_rate()?;

        tracing::info!(
            "buyer {} paying {} for item {}",
            buyer_id,
            format_dual(current.selling_price, current.selling_price_eth),
            item_id
        );
        let tx_hash = self
            .gateway
            .transfer(&buyer_wallet, COMPANY_WALLET_ADDRESS, current.selling_price_eth)
            .map_err(|e| MarketError::Gateway(e.to_string()))?;

        let entry = SettlementEntry::new(
            item_id,
            SettlementKind::Purchase,
            &buyer_wallet,
            COMPANY_WALLET_ADDRESS,
            current.selling_price,
            current.selling_price_eth,
            rate,
            Some(tx_hash),
        )?;

        let commit = self
            .items
            .try_commit(item_id, ItemStatus::ReadyToSell, "purchase", |item| {
                item.apply_purchase(buyer_id)
            });

        let committed = match commit {
            Ok(item) => item,
            Err(err @ (MarketError::Conflict(_) | MarketError::InvalidTransition { .. })) => {
                tracing::warn!(
                    "purchase payment for item {item_id} settled but the commit was lost: {err}"
                );
                self.ledger.append(&entry)?;
                self.ledger.append(&entry.reversal_of()?)?;
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };

        self.ledger.append(&entry)?;
        tracing::info!("item {item_id} sold to {buyer_id}");
        Ok(committed)
    }

    // READS

    pub fn item(&self, item_id: &str) -> anyhow::Result<ItemRecord> {
        Ok(self.items.get(item_id)?)
    }

    pub fn items(&self) -> anyhow::Result<Vec<ItemRecord>> {
        Ok(self.items.items()?)
    }

    pub fn items_by_status(&self, status: ItemStatus) -> anyhow::Result<Vec<ItemRecord>> {
        Ok(self.items.items_by_status(status)?)
    }

    /// Revenue, cost and profit over the full item snapshot.
    pub fn financial_summary(&self) -> anyhow::Result<FinancialSummary> {
        Ok(aggregate(&self.items.items()?))
    }

    /// Blocking change feed over the item store.
    pub fn subscribe_items(&self) -> sled::Subscriber {
        self.items.watch()
    }

    pub fn settlements(&self) -> anyhow::Result<Vec<SettlementEntry>> {
        self.ledger.entries()
    }

    pub fn settlements_for_item(&self, item_id: &str) -> anyhow::Result<Vec<SettlementEntry>> {
        self.ledger.entries_for_item(item_id)
    }
}
