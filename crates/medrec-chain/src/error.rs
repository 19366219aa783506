//! Chain-side error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    /// The wallet endpoint could not be reached at all.
    #[error("wallet provider is unreachable: {0}")]
    WalletUnavailable(String),

    /// The user declined the account-access request (code 4001).
    #[error("wallet connection rejected by the user")]
    ConnectionRejected,

    /// The wallet granted access but exposed an empty account list.
    #[error("wallet exposed no accounts")]
    NoAccounts,

    /// The wallet does not know the requested chain (code 4902); the
    /// caller is expected to add it and retry.
    #[error("chain 0x{0:x} is not known to the wallet")]
    UnknownChain(u64),

    /// A provider reply did not have the documented shape.
    #[error("malformed provider response: {0}")]
    InvalidResponse(String),

    /// A read-only contract query (or a gas estimate) failed.
    #[error("contract query {method} failed: {source}")]
    Query {
        method: &'static str,
        #[source]
        source: web3::contract::Error,
    },

    /// A state-changing submission failed before or while mining.
    #[error("transaction {method} failed: {source}")]
    Transaction {
        method: &'static str,
        #[source]
        source: web3::Error,
    },

    /// The transaction was mined but the contract reverted it.
    #[error("transaction {method} reverted on chain")]
    Reverted { method: &'static str },

    /// The contract rejected a call; carries the revert reason when the
    /// registry implementation can supply one.
    #[error("contract rejected the call: {0}")]
    Rejected(String),

    /// The embedded interface description failed to parse.
    #[error("contract interface: {0}")]
    Abi(#[from] web3::ethabi::Error),

    /// Any other provider-level failure.
    #[error("provider error: {0}")]
    Provider(#[from] web3::Error),
}
