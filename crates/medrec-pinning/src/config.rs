//! Pinning service configuration.

use crate::error::PinningError;

/// Default public API endpoint (Pinata-shaped service).
pub const DEFAULT_API_URL: &str = "https://api.pinata.cloud";
/// Default gateway prefix for fetches by content identifier.
pub const DEFAULT_GATEWAY_URL: &str = "https://gateway.pinata.cloud/ipfs/";

#[derive(Clone, Debug)]
pub struct PinningConfig {
    pub api_url: String,
    pub gateway_url: String,
    pub api_key: String,
    pub api_secret: String,
}

impl PinningConfig {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        PinningConfig {
            api_url: DEFAULT_API_URL.to_string(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Read credentials (and optional endpoint overrides) from the
    /// environment. Keys must be present and non-empty.
    pub fn from_env() -> Result<Self, PinningError> {
        let api_key = std::env::var("MEDREC_PIN_API_KEY").unwrap_or_default();
        let api_secret = std::env::var("MEDREC_PIN_API_SECRET").unwrap_or_default();
        if api_key.is_empty() || api_secret.is_empty() {
            return Err(PinningError::MissingCredentials);
        }
        let mut config = PinningConfig::new(api_key, api_secret);
        if let Ok(url) = std::env::var("MEDREC_PIN_API_URL") {
            if !url.is_empty() {
                config.api_url = url;
            }
        }
        if let Ok(url) = std::env::var("MEDREC_PIN_GATEWAY_URL") {
            if !url.is_empty() {
                config.gateway_url = url;
            }
        }
        Ok(config)
    }

    pub(crate) fn pin_json_endpoint(&self) -> String {
        format!("{}/pinning/pinJSONToIPFS", self.api_url.trim_end_matches('/'))
    }

    pub(crate) fn pin_file_endpoint(&self) -> String {
        format!("{}/pinning/pinFileToIPFS", self.api_url.trim_end_matches('/'))
    }

    pub(crate) fn gateway_endpoint(&self, cid: &str) -> String {
        let base = self.gateway_url.trim_end_matches('/');
        format!("{base}/{cid}")
    }
}
