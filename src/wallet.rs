//! Wallet address contract, actor profiles and the payment-provider seam.

use super::error::ValidationError;
use super::utils;

/// Company wallet, receives purchase payments and sends payouts.
pub const COMPANY_WALLET_ADDRESS: &str = "0xd1b6d088b8f3e291ced23419302f15b4f1f88530";

/// Exactly 42 characters: `0x` followed by 40 hex digits. Anything else
/// blocks every operation that needs a verified wallet.
pub fn validate_wallet_address(address: &str) -> bool {
    let Some(body) = address.strip_prefix("0x") else {
        return false;
    };
    body.len() == 40 && hex::decode(body).is_ok()
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq)]
pub enum Role {
    #[n(0)]
    User,
    #[n(1)]
    Official,
}

/// Actor profile as handed over by the identity layer. The engine trusts
/// the id and role; it only enforces the wallet contract.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Eq, PartialEq)]
pub struct WalletProfile {
    #[n(0)]
    pub user_id: String,
    #[n(1)]
    pub wallet_address: Option<String>,
    #[n(2)]
    pub is_verified: bool,
    #[n(3)]
    pub role: Role,
}

impl WalletProfile {
    pub fn new(user_id: &str, role: Role) -> Self {
        Self {
            user_id: user_id.to_owned(),
            wallet_address: None,
            is_verified: false,
            role,
        }
    }

    /// The address, but only when verified and still well-formed.
    pub fn verified_address(&self) -> Option<&str> {
        match &self.wallet_address {
            Some(addr) if self.is_verified && validate_wallet_address(addr) => Some(addr),
            _ => None,
        }
    }

    pub fn with_verified_wallet(mut self, address: &str) -> Result<Self, ValidationError> {
        if !validate_wallet_address(address) {
            return Err(ValidationError::InvalidWalletAddress(address.to_owned()));
        }
        self.wallet_address = Some(address.to_owned());
        self.is_verified = true;
        Ok(self)
    }
}

/// Seam to the wallet provider. The engine only ever asks it to move an
/// ETH amount between two addresses and hand back a transaction reference.
pub trait PaymentGateway: Send + Sync {
    fn transfer(&self, from: &str, to: &str, amount_eth: f64) -> anyhow::Result<String>;
}

/// Stand-in for the browser wallet on the Sepolia testnet. Transfers always
/// succeed and return a fake transaction hash.
pub struct SimulatedGateway;

impl PaymentGateway for SimulatedGateway {
    fn transfer(&self, from: &str, to: &str, _amount_eth: f64) -> anyhow::Result<String> {
        if !validate_wallet_address(from) {
            anyhow::bail!("invalid sender wallet address: {from:?}");
        }
        if !validate_wallet_address(to) {
            anyhow::bail!("invalid recipient wallet address: {to:?}");
        }

        Ok(utils::simulated_tx_hash())
    }
}
