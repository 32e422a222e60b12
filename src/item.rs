//! Core item record and submission draft types
use super::currency::rs_to_eth;
use super::error::ValidationError;
use super::utils;
use chrono::{DateTime, TimeZone, Utc};
use std::str::FromStr;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, Ord, PartialEq, PartialOrd)]
pub enum Condition {
    #[n(0)]
    Working,
    #[n(1)]
    Repairable,
    #[n(2)]
    Scrap,
}

impl FromStr for Condition {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "working" => Ok(Condition::Working),
            "repairable" => Ok(Condition::Repairable),
            "scrap" => Ok(Condition::Scrap),
            _ => Err(ValidationError::UnknownCondition(s.to_owned())),
        }
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ItemStatus {
    #[n(0)]
    AwaitingValuation,
    #[n(1)]
    ReadyToSell,
    #[n(2)]
    Sold,
    #[n(3)]
    Recycled,
    #[n(4)]
    Scrapped,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::AwaitingValuation => "awaiting_valuation",
            ItemStatus::ReadyToSell => "ready_to_sell",
            ItemStatus::Sold => "sold",
            ItemStatus::Recycled => "recycled",
            ItemStatus::Scrapped => "scrapped",
        }
    }

    /// Sold, Recycled and Scrapped admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ItemStatus::Sold | ItemStatus::Recycled | ItemStatus::Scrapped
        )
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl PartialOrd for TimeStamp<Utc> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeStamp<Utc> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// One piece of e-waste and its full financial and state history. Items are
/// never deleted; a record is the permanent audit trail for its lifecycle.
///
/// Every Rs field carries an ETH counterpart frozen at the rate in effect
/// when the value was set.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct ItemRecord {
    #[n(0)]
    pub id: String, // uuid7, bech32 "item_" prefix
    #[n(1)]
    pub category: String, // free text, deliberately not an enum
    #[n(2)]
    pub condition: Condition,
    #[n(3)]
    pub seller_quoted_price: f64,
    #[n(4)]
    pub seller_quoted_price_eth: f64,
    #[n(5)]
    pub final_payout: f64,
    #[n(6)]
    pub final_payout_eth: f64,
    #[n(7)]
    pub repair_cost: f64,
    #[n(8)]
    pub repair_cost_eth: f64,
    #[n(9)]
    pub selling_price: f64,
    #[n(10)]
    pub selling_price_eth: f64,
    #[n(11)]
    pub status: ItemStatus,
    #[n(12)]
    pub current_branch: String,
    #[n(13)]
    pub seller_id: String,
    #[n(14)]
    pub buyer_id: Option<String>,
    #[n(15)]
    pub processed_by: Option<String>,
    #[n(16)]
    pub created_at: TimeStamp<Utc>,
    #[n(17)]
    pub updated_at: TimeStamp<Utc>,
    #[n(18)]
    pub media: Vec<String>, // opaque storage paths
}

impl ItemRecord {
    /// Advances updated_at. Never moves it backwards.
    pub fn touch(&mut self) {
        let now = TimeStamp::new();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

/// Draft for a seller submission. Built up with chained setters, validated
/// on submit.
#[derive(Debug, Default)]
pub struct ItemDraft {
    seller_id: Option<String>,
    category: Option<String>,
    condition: Option<Condition>,
    quoted_price: f64,
    media: Vec<String>,
}

impl ItemDraft {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn seller(mut self, seller_id: &str) -> Self {
        self.seller_id = Some(seller_id.to_owned());
        self
    }
    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_owned());
        self
    }
    pub fn condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
    pub fn quoted_price(mut self, amount_rs: f64) -> Self {
        self.quoted_price = amount_rs;
        self
    }
    pub fn attach_media(mut self, path: &str) -> Self {
        self.media.push(path.to_owned());
        self
    }

    /// Checks fields and builds the record in its initial state. The quoted
    /// price's ETH counterpart is frozen at the submission-time rate.
    pub fn submit(self, rate: f64) -> anyhow::Result<ItemRecord> {
        let Some(seller_id) = self.seller_id else {
            return Err(ValidationError::MissingField("seller").into());
        };
        let category = match self.category {
            Some(c) if !c.trim().is_empty() => c,
            _ => return Err(ValidationError::MissingField("category").into()),
        };
        let Some(condition) = self.condition else {
            return Err(ValidationError::MissingField("condition").into());
        };
        if self.quoted_price <= 0.0 {
            return Err(ValidationError::NonPositiveQuote(self.quoted_price).into());
        }

        let created = TimeStamp::new();
        Ok(ItemRecord {
            id: utils::new_uuid_to_bech32("item_")?,
            category,
            condition,
            seller_quoted_price: self.quoted_price,
            seller_quoted_price_eth: rs_to_eth(self.quoted_price, rate),
            final_payout: 0.0,
            final_payout_eth: 0.0,
            repair_cost: 0.0,
            repair_cost_eth: 0.0,
            selling_price: 0.0,
            selling_price_eth: 0.0,
            status: ItemStatus::AwaitingValuation,
            current_branch: "N/A".to_owned(),
            seller_id,
            buyer_id: None,
            processed_by: None,
            created_at: created.clone(),
            updated_at: created,
            media: self.media,
        })
    }
}
