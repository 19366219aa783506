//! Chain (network) configuration.
//!
//! Carries the metadata the wallet needs for a switch/add round trip.
//! RPC endpoints come from configuration, never from source.

use serde::{Deserialize, Serialize};

/// Polygon Amoy chain id, the network the records contract is deployed
/// to by default.
pub const POLYGON_AMOY_CHAIN_ID: u64 = 80_002;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    pub currency_name: String,
    pub currency_symbol: String,
    pub currency_decimals: u8,
    pub explorer_url: Option<String>,
}

impl ChainConfig {
    /// Polygon Amoy testnet metadata with a caller-supplied RPC endpoint.
    pub fn polygon_amoy(rpc_url: impl Into<String>) -> Self {
        ChainConfig {
            chain_id: POLYGON_AMOY_CHAIN_ID,
            name: "Polygon Amoy Testnet".to_string(),
            rpc_url: rpc_url.into(),
            currency_name: "POL".to_string(),
            currency_symbol: "POL".to_string(),
            currency_decimals: 18,
            explorer_url: Some("https://amoy.polygonscan.com/".to_string()),
        }
    }

    /// Hexadecimal chain id, the form the wallet switch/add calls expect.
    pub fn hex_chain_id(&self) -> String {
        format!("{:#x}", self.chain_id)
    }
}
