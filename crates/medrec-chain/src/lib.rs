//! Medrec Chain - Wallet Session and Contract Proxy
//!
//! Everything that talks to the chain side of the system lives here:
//!
//! - [`WalletProvider`] / [`RpcWallet`]: the wallet endpoint (account
//!   access, chain switch/add, change notifications by polling).
//! - [`WalletSession`]: one process-wide session object with explicit
//!   connect and teardown, emitting [`SessionEvent`]s on changes.
//! - [`RecordRegistry`] / [`Web3Registry`]: the typed handle bound to
//!   one deployed records contract. Reads are plain queries; writes are
//!   estimated first and submitted with the fixed gas margin.
//!
//! The contract itself is an external collaborator, reachable only
//! through its interface description (`abi/patient_records.json`).

pub mod config;
pub mod error;
pub mod provider;
pub mod registry;
pub mod session;

pub use config::ChainConfig;
pub use error::ChainError;
pub use provider::{RpcWallet, WalletProvider};
pub use registry::{RecordRegistry, Web3Registry, REGISTRY_ABI};
pub use session::{SessionEvent, WalletSession};
