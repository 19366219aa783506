//! Wallet provider interface.
//!
//! The wallet owns accounts and network selection; this client only
//! asks. [`RpcWallet`] speaks the provider JSON-RPC surface
//! (`eth_requestAccounts`, `eth_accounts`, `eth_chainId`,
//! `wallet_switchEthereumChain`, `wallet_addEthereumChain`) over a web3
//! transport. Change notifications are produced by polling in
//! [`crate::session`], since a plain RPC endpoint has no push channel.

use futures::future::BoxFuture;
use serde_json::{json, Value};
use web3::Transport;

use medrec_core::Address;

use crate::config::ChainConfig;
use crate::error::ChainError;

/// Provider error code for a user-rejected request (EIP-1193).
const USER_REJECTED: i64 = 4001;
/// Provider error code for a chain the wallet does not know (EIP-3085).
const UNRECOGNIZED_CHAIN: i64 = 4902;

pub trait WalletProvider: Send + Sync {
    /// Ask the wallet for account access; may prompt the user.
    fn request_accounts(&self) -> BoxFuture<'_, Result<Vec<Address>, ChainError>>;

    /// Currently exposed accounts, without prompting.
    fn accounts(&self) -> BoxFuture<'_, Result<Vec<Address>, ChainError>>;

    /// The chain the wallet is currently on.
    fn chain_id(&self) -> BoxFuture<'_, Result<u64, ChainError>>;

    /// Switch the wallet to `chain`; fails with
    /// [`ChainError::UnknownChain`] when the wallet has never seen it.
    fn switch_chain(&self, chain: ChainConfig) -> BoxFuture<'_, Result<(), ChainError>>;

    /// Register `chain` with the wallet (metadata included).
    fn add_chain(&self, chain: ChainConfig) -> BoxFuture<'_, Result<(), ChainError>>;
}

/// JSON-RPC wallet endpoint over any web3 transport.
#[derive(Clone, Debug)]
pub struct RpcWallet<T> {
    transport: T,
}

impl<T: Transport> RpcWallet<T> {
    pub fn new(transport: T) -> Self {
        RpcWallet { transport }
    }
}

impl<T> WalletProvider for RpcWallet<T>
where
    T: Transport + Send + Sync + 'static,
    T::Out: Send,
{
    fn request_accounts(&self) -> BoxFuture<'_, Result<Vec<Address>, ChainError>> {
        Box::pin(async move {
            let raw = self
                .transport
                .execute("eth_requestAccounts", vec![])
                .await
                .map_err(map_provider_error)?;
            parse_accounts(&raw)
        })
    }

    fn accounts(&self) -> BoxFuture<'_, Result<Vec<Address>, ChainError>> {
        Box::pin(async move {
            let raw = self
                .transport
                .execute("eth_accounts", vec![])
                .await
                .map_err(map_provider_error)?;
            parse_accounts(&raw)
        })
    }

    fn chain_id(&self) -> BoxFuture<'_, Result<u64, ChainError>> {
        Box::pin(async move {
            let raw = self
                .transport
                .execute("eth_chainId", vec![])
                .await
                .map_err(map_provider_error)?;
            parse_chain_id(&raw)
        })
    }

    fn switch_chain(&self, chain: ChainConfig) -> BoxFuture<'_, Result<(), ChainError>> {
        Box::pin(async move {
            let params = vec![json!({ "chainId": chain.hex_chain_id() })];
            match self
                .transport
                .execute("wallet_switchEthereumChain", params)
                .await
            {
                Ok(_) => Ok(()),
                Err(web3::Error::Rpc(rpc)) if rpc.code.code() == UNRECOGNIZED_CHAIN => {
                    Err(ChainError::UnknownChain(chain.chain_id))
                }
                Err(err) => Err(map_provider_error(err)),
            }
        })
    }

    fn add_chain(&self, chain: ChainConfig) -> BoxFuture<'_, Result<(), ChainError>> {
        Box::pin(async move {
            let explorers: Vec<&str> = chain.explorer_url.iter().map(String::as_str).collect();
            let params = vec![json!({
                "chainId": chain.hex_chain_id(),
                "chainName": chain.name,
                "nativeCurrency": {
                    "name": chain.currency_name,
                    "symbol": chain.currency_symbol,
                    "decimals": chain.currency_decimals,
                },
                "rpcUrls": [chain.rpc_url],
                "blockExplorerUrls": explorers,
            })];
            self.transport
                .execute("wallet_addEthereumChain", params)
                .await
                .map_err(map_provider_error)?;
            Ok(())
        })
    }
}

fn map_provider_error(err: web3::Error) -> ChainError {
    match &err {
        web3::Error::Rpc(rpc) if rpc.code.code() == USER_REJECTED => {
            ChainError::ConnectionRejected
        }
        web3::Error::Transport(_) | web3::Error::Unreachable => {
            ChainError::WalletUnavailable(err.to_string())
        }
        _ => ChainError::Provider(err),
    }
}

fn parse_accounts(raw: &Value) -> Result<Vec<Address>, ChainError> {
    let list = raw
        .as_array()
        .ok_or_else(|| ChainError::InvalidResponse(raw.to_string()))?;
    list.iter()
        .map(|entry| {
            entry
                .as_str()
                .and_then(|s| s.parse::<Address>().ok())
                .ok_or_else(|| ChainError::InvalidResponse(entry.to_string()))
        })
        .collect()
}

fn parse_chain_id(raw: &Value) -> Result<u64, ChainError> {
    if let Some(text) = raw.as_str() {
        let digits = text.strip_prefix("0x").unwrap_or(text);
        return u64::from_str_radix(digits, 16)
            .map_err(|_| ChainError::InvalidResponse(text.to_string()));
    }
    raw.as_u64()
        .ok_or_else(|| ChainError::InvalidResponse(raw.to_string()))
}
