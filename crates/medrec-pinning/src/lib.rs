//! Medrec Pinning - Off-Chain Payload Store Client
//!
//! Uploads JSON manifests and binary attachments to a content-addressed
//! pinning service and retrieves them by content identifier. A payload
//! is immutable once pinned; "updating" always means pinning a new
//! payload and repointing the on-chain record.
//!
//! Credentials and endpoints come from configuration, never from
//! source. Service keys in a shipped artifact leak to every user of
//! that artifact.

pub mod client;
pub mod config;
pub mod error;

pub use client::{PinStore, PinningClient};
pub use config::PinningConfig;
pub use error::PinningError;
