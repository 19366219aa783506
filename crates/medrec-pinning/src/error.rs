//! Pinning-side error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PinningError {
    /// API credentials were not configured.
    #[error("pinning credentials are not configured (set MEDREC_PIN_API_KEY / MEDREC_PIN_API_SECRET)")]
    MissingCredentials,

    /// The service answered an upload with a non-success status.
    #[error("pinning service returned {status}: {body}")]
    ServiceStatus { status: u16, body: String },

    /// The gateway answered a fetch with a non-success status.
    #[error("gateway returned {status} for {cid}")]
    GatewayStatus { cid: String, status: u16 },

    /// The upload response did not carry a content identifier.
    #[error("pinning response carried no content identifier")]
    MissingCid,

    /// Transport-level HTTP failure.
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// A fetched payload was not the JSON document we expected.
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
