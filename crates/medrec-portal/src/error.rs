//! Portal-level error type.
//!
//! Wraps the chain, pinning, and domain errors and adds the local
//! guards the dashboards enforce before any network call.

use thiserror::Error;

use medrec_core::{Address, CoreError};

#[derive(Debug, Error)]
pub enum PortalError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Chain(#[from] medrec_chain::ChainError),

    #[error(transparent)]
    Pinning(#[from] medrec_pinning::PinningError),

    #[error("manifest encoding failed: {0}")]
    Manifest(#[from] serde_json::Error),

    /// The connected account is not the contract administrator.
    #[error("caller is not the contract administrator")]
    NotAdmin,

    /// Authorize was asked for an address that is already in the set.
    #[error("doctor {0} is already authorized")]
    AlreadyAuthorized(Address),

    /// Revoke was asked for an address that is not in the set.
    #[error("doctor {0} is not currently authorized")]
    NotAuthorized(Address),

    /// A record creation was attempted by a non-authorized account.
    #[error("account {0} is not an authorized doctor")]
    UnauthorizedCaller(Address),

    /// Deactivate was asked for a record that is already inactive.
    #[error("record {0} is already inactive")]
    AlreadyInactive(u64),

    /// Update was asked for an inactive record.
    #[error("record {0} is inactive and cannot be updated")]
    UpdateOnInactive(u64),

    #[error("configuration: {0}")]
    Config(String),
}
