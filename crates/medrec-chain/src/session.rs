//! Wallet session lifecycle.
//!
//! One session object per process: explicit `connect`, explicit
//! `disconnect`, and a polling watcher in between that turns provider
//! state changes into [`SessionEvent`]s. An account change means the
//! caller must re-classify the role; a chain change invalidates the
//! session entirely, and callers reconnect rather than reconcile
//! incrementally.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use medrec_core::Address;

use crate::config::ChainConfig;
use crate::error::ChainError;
use crate::provider::WalletProvider;

/// Notifications produced by the session watcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The wallet switched to a different first account.
    AccountChanged(Address),
    /// The wallet no longer exposes any account.
    Disconnected,
    /// The wallet moved to another chain; the session is stale.
    ChainChanged(u64),
}

pub struct WalletSession<W> {
    provider: W,
    chain: ChainConfig,
    account: Option<Address>,
    watcher: Option<JoinHandle<()>>,
}

impl<W> WalletSession<W>
where
    W: WalletProvider + Clone + 'static,
{
    pub fn new(provider: W, chain: ChainConfig) -> Self {
        WalletSession {
            provider,
            chain,
            account: None,
            watcher: None,
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    /// Request account access and make sure the wallet sits on the
    /// configured chain. Adopts the first exposed account.
    pub async fn connect(&mut self) -> Result<Address, ChainError> {
        let accounts = self.provider.request_accounts().await?;
        let account = accounts.first().copied().ok_or(ChainError::NoAccounts)?;
        self.ensure_network().await?;
        self.account = Some(account);
        info!(account = %account, chain = self.chain.chain_id, "wallet connected");
        Ok(account)
    }

    /// Switch to the configured chain; when the wallet has never seen
    /// it, add it with full metadata (the 4902 round trip).
    pub async fn ensure_network(&self) -> Result<(), ChainError> {
        match self.provider.switch_chain(self.chain.clone()).await {
            Err(ChainError::UnknownChain(id)) => {
                warn!(chain = id, "wallet does not know the chain, adding it");
                self.provider.add_chain(self.chain.clone()).await
            }
            other => other,
        }
    }

    /// Start the change watcher. Events arrive on the returned channel
    /// until `disconnect` tears the watcher down or the receiver is
    /// dropped.
    pub fn watch(&mut self, poll_interval: Duration) -> mpsc::Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel(8);
        let provider = self.provider.clone();
        let mut current_account = self.account;
        let mut current_chain = self.chain.chain_id;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick fires immediately; skip it so the initial state
            // is not reported as a change.
            ticker.tick().await;
            loop {
                ticker.tick().await;

                match provider.chain_id().await {
                    Ok(id) if id != current_chain => {
                        current_chain = id;
                        if tx.send(SessionEvent::ChainChanged(id)).await.is_err() {
                            return;
                        }
                    }
                    Ok(_) => {}
                    Err(err) => debug!(error = %err, "chain poll failed"),
                }

                match provider.accounts().await {
                    Ok(accounts) => {
                        let next = accounts.first().copied();
                        if next != current_account {
                            current_account = next;
                            let event = match next {
                                Some(account) => SessionEvent::AccountChanged(account),
                                None => SessionEvent::Disconnected,
                            };
                            if tx.send(event).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(err) => debug!(error = %err, "account poll failed"),
                }
            }
        });
        self.watcher = Some(handle);
        rx
    }

    /// Drop the account and stop the watcher.
    pub fn disconnect(&mut self) {
        self.account = None;
        if let Some(handle) = self.watcher.take() {
            handle.abort();
        }
    }
}

impl<W> Drop for WalletSession<W> {
    fn drop(&mut self) {
        if let Some(handle) = self.watcher.take() {
            handle.abort();
        }
    }
}
