//! Portal configuration, sourced from the environment.
//!
//! - `MEDREC_RPC_URL`          wallet/chain JSON-RPC endpoint (required)
//! - `MEDREC_CONTRACT_ADDRESS` deployed records contract (required)
//! - `MEDREC_CACHE_DIR`        record-id cache directory (optional)
//!
//! Pinning credentials live in `medrec_pinning::PinningConfig`.

use std::path::PathBuf;

use medrec_chain::ChainConfig;
use medrec_core::Address;

use crate::error::PortalError;

const DEFAULT_CACHE_DIR: &str = ".medrec-cache";

#[derive(Clone, Debug)]
pub struct PortalConfig {
    pub chain: ChainConfig,
    pub contract_address: Address,
    pub cache_dir: PathBuf,
}

impl PortalConfig {
    /// Environment-driven configuration with optional explicit
    /// overrides (CLI flags win over the environment).
    pub fn from_env(
        rpc_override: Option<String>,
        contract_override: Option<String>,
    ) -> Result<Self, PortalError> {
        let rpc_url = rpc_override
            .or_else(|| non_empty_var("MEDREC_RPC_URL"))
            .ok_or_else(|| PortalError::Config("MEDREC_RPC_URL is not set".to_string()))?;

        let contract_raw = contract_override
            .or_else(|| non_empty_var("MEDREC_CONTRACT_ADDRESS"))
            .ok_or_else(|| {
                PortalError::Config("MEDREC_CONTRACT_ADDRESS is not set".to_string())
            })?;
        let contract_address = contract_raw
            .parse::<Address>()
            .map_err(PortalError::Core)?;

        let cache_dir = non_empty_var("MEDREC_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR));

        Ok(PortalConfig {
            chain: ChainConfig::polygon_amoy(rpc_url),
            contract_address,
            cache_dir,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
