//! End-to-end walk through the marketplace workflow against a throwaway
//! sled database: two sellers submit items, an official processes them,
//! a buyer purchases the refurbished one, then the books are printed.

use std::sync::Arc;

use ewaste_exchange::currency::format_dual;
use ewaste_exchange::item::{Condition, ItemDraft};
use ewaste_exchange::lifecycle::Decision;
use ewaste_exchange::service::MarketService;
use ewaste_exchange::utils;
use ewaste_exchange::wallet::{Role, WalletProfile};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let dir = tempfile::tempdir()?;
    let db = Arc::new(sled::open(dir.path().join("market.db"))?);
    let service = MarketService::new(db)?;

    let seller_id = utils::new_uuid_to_bech32("user_")?;
    let buyer_id = utils::new_uuid_to_bech32("user_")?;
    let official_id = utils::new_uuid_to_bech32("user_")?;

    service.upsert_profile(&WalletProfile::new(&seller_id, Role::User))?;
    service.upsert_profile(&WalletProfile::new(&buyer_id, Role::User))?;
    service.upsert_profile(&WalletProfile::new(&official_id, Role::Official))?;
    service.verify_wallet(&seller_id, "0x1111111111111111111111111111111111111111")?;
    service.verify_wallet(&buyer_id, "0x2222222222222222222222222222222222222222")?;

    let laptop = service.submit_item(
        ItemDraft::new()
            .seller(&seller_id)
            .category("Laptop")
            .condition(Condition::Repairable)
            .quoted_price(2_000.0)
            .attach_media("item-media/laptop-front.jpg"),
    )?;
    let charger = service.submit_item(
        ItemDraft::new()
            .seller(&seller_id)
            .category("Charger")
            .condition(Condition::Scrap)
            .quoted_price(300.0),
    )?;

    let laptop = service.process_item(
        &official_id,
        &laptop.id,
        Decision::Refurbish,
        800.0,
        Some(200.0),
        Some(3_000.0),
    )?;
    service.process_item(&official_id, &charger.id, Decision::Recycle, 100.0, None, None)?;

    let laptop = service.purchase_item(&buyer_id, &laptop.id)?;
    println!(
        "laptop sold to {} for {}",
        laptop.buyer_id.as_deref().unwrap_or("-"),
        format_dual(laptop.selling_price, laptop.selling_price_eth)
    );

    let summary = service.financial_summary()?;
    println!(
        "revenue Rs {:.2}, cost Rs {:.2}, profit Rs {:.2}",
        summary.revenue, summary.cost, summary.profit
    );

    for entry in service.settlements()? {
        println!(
            "{:?} {} -> {} {}",
            entry.kind,
            entry.from_address,
            entry.to_address,
            format_dual(entry.amount_rs, entry.amount_eth)
        );
    }

    Ok(())
}
