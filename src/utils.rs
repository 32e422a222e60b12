//! Utility functions for id generation and simulated transaction references

use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

// fake 32-byte transaction hash in the shape the wallet provider would return
pub fn simulated_tx_hash() -> String {
    format!("0x{}", sha256::digest(uuid7().as_bytes()))
}

// reference for settlement entries that never reached the wallet provider
pub fn placeholder_reference() -> String {
    format!("simulated_{}", uuid7())
}
