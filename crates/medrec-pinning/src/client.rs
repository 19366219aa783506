//! HTTP client for the pinning service and its gateway.

use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::PinningConfig;
use crate::error::PinningError;

/// Header pair the service authenticates with.
const API_KEY_HEADER: &str = "pinata_api_key";
const API_SECRET_HEADER: &str = "pinata_secret_api_key";

/// The seam the dashboards program against. The live implementation is
/// [`PinningClient`]; tests use an in-memory store.
pub trait PinStore: Send + Sync {
    /// Pin a JSON payload, returning its content identifier.
    fn pin_json(&self, payload: Value) -> BoxFuture<'_, Result<String, PinningError>>;

    /// Pin an attachment blob via multipart upload.
    fn pin_file(
        &self,
        file_name: String,
        bytes: Vec<u8>,
    ) -> BoxFuture<'_, Result<String, PinningError>>;

    /// Fetch a pinned JSON payload back through the gateway.
    fn fetch_json(&self, cid: String) -> BoxFuture<'_, Result<Value, PinningError>>;
}

impl<S: PinStore + ?Sized> PinStore for std::sync::Arc<S> {
    fn pin_json(&self, payload: Value) -> BoxFuture<'_, Result<String, PinningError>> {
        (**self).pin_json(payload)
    }
    fn pin_file(
        &self,
        file_name: String,
        bytes: Vec<u8>,
    ) -> BoxFuture<'_, Result<String, PinningError>> {
        (**self).pin_file(file_name, bytes)
    }
    fn fetch_json(&self, cid: String) -> BoxFuture<'_, Result<Value, PinningError>> {
        (**self).fetch_json(cid)
    }
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: Option<String>,
}

pub struct PinningClient {
    http: reqwest::Client,
    config: PinningConfig,
}

impl PinningClient {
    pub fn new(config: PinningConfig) -> Self {
        PinningClient {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn read_cid(response: reqwest::Response) -> Result<String, PinningError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "pin upload rejected");
            return Err(PinningError::ServiceStatus {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: PinResponse = response.json().await?;
        parsed.ipfs_hash.filter(|h| !h.is_empty()).ok_or(PinningError::MissingCid)
    }
}

impl PinStore for PinningClient {
    fn pin_json(&self, payload: Value) -> BoxFuture<'_, Result<String, PinningError>> {
        Box::pin(async move {
            let response = self
                .http
                .post(self.config.pin_json_endpoint())
                .header(API_KEY_HEADER, &self.config.api_key)
                .header(API_SECRET_HEADER, &self.config.api_secret)
                .json(&payload)
                .send()
                .await?;
            let cid = Self::read_cid(response).await?;
            debug!(%cid, "pinned json payload");
            Ok(cid)
        })
    }

    fn pin_file(
        &self,
        file_name: String,
        bytes: Vec<u8>,
    ) -> BoxFuture<'_, Result<String, PinningError>> {
        Box::pin(async move {
            let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.clone());
            let form = reqwest::multipart::Form::new().part("file", part);
            let response = self
                .http
                .post(self.config.pin_file_endpoint())
                .header(API_KEY_HEADER, &self.config.api_key)
                .header(API_SECRET_HEADER, &self.config.api_secret)
                .multipart(form)
                .send()
                .await?;
            let cid = Self::read_cid(response).await?;
            debug!(%cid, file = %file_name, "pinned attachment");
            Ok(cid)
        })
    }

    fn fetch_json(&self, cid: String) -> BoxFuture<'_, Result<Value, PinningError>> {
        Box::pin(async move {
            let response = self
                .http
                .get(self.config.gateway_endpoint(&cid))
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(PinningError::GatewayStatus {
                    cid,
                    status: status.as_u16(),
                });
            }
            let body = response.text().await?;
            Ok(serde_json::from_str(&body)?)
        })
    }
}
