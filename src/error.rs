use crate::item::ItemStatus;

/// Malformed input, rejected before any external call is made.
#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("{0} is not set")]
    MissingField(&'static str),
    #[error("unknown condition: {0:?}")]
    UnknownCondition(String),
    #[error("{field} must not be negative, got {value}")]
    NegativeAmount { field: &'static str, value: f64 },
    #[error("quoted price must be positive, got {0}")]
    NonPositiveQuote(f64),
    #[error("refurbish requires a selling price")]
    MissingSellingPrice,
    #[error("malformed wallet address: {0:?}")]
    InvalidWalletAddress(String),
    #[error("exchange rate must be positive, got {0}")]
    NonPositiveRate(f64),
    #[error("buyer and seller must be distinct")]
    BuyerIsSeller,
}

#[derive(thiserror::Error, Debug)]
pub enum MarketError {
    #[error("{operation} is not allowed while item is {from:?}")]
    InvalidTransition {
        from: ItemStatus,
        operation: &'static str,
    },
    #[error("unknown processing decision: {0:?}")]
    InvalidDecision(String),
    #[error("lost the commit race for item {0}")]
    Conflict(String),
    #[error("no verified crypto wallet for {0}")]
    WalletNotVerified(String),
    #[error("unknown item: {0}")]
    UnknownItem(String),
    #[error("no profile for actor {0}")]
    UnknownActor(String),
    #[error("payment gateway failure: {0}")]
    Gateway(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("storage failure")]
    Store(#[from] sled::Error),
    #[error("codec failure: {0}")]
    Codec(String),
}
