//! Dual-currency conversion between Rs and simulated Sepolia ETH.
//!
//! The converter keeps no state. Callers pass the exchange rate that was in
//! effect when the financial event happened, so values recorded on an item
//! stay stable when the configured rate later changes.

/// Fallback Rs-per-ETH rate when no rate has been configured.
pub const DEFAULT_RS_PER_ETH: f64 = 250_000.0;

/// Converts Rs to ETH. Non-positive amounts or rates yield 0 rather than
/// an error.
pub fn rs_to_eth(amount_rs: f64, rate: f64) -> f64 {
    if amount_rs <= 0.0 || rate <= 0.0 {
        return 0.0;
    }
    amount_rs / rate
}

/// Converts ETH back to Rs under the same guard.
pub fn eth_to_rs(amount_eth: f64, rate: f64) -> f64 {
    if amount_eth <= 0.0 || rate <= 0.0 {
        return 0.0;
    }
    amount_eth * rate
}

pub fn format_rs(amount: f64) -> String {
    format!("{amount:.2}")
}

pub fn format_eth(amount: f64) -> String {
    format!("{amount:.8}")
}

pub fn format_dual(amount_rs: f64, amount_eth: f64) -> String {
    format!("Rs {} / {} ETH", format_rs(amount_rs), format_eth(amount_eth))
}
