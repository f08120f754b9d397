//! Connecting to the signing agent and keeping it on the required network.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::error::{PedigreeError, PedigreeResult};
use crate::observability::metrics;
use crate::types::ChainId;
use crate::wallet::provider::{AccountsChanged, WalletProvider};
use crate::wallet::session::WalletSession;

/// Result of [`WalletConnector::ensure_network`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    /// The agent was already on the required chain; nothing was requested.
    AlreadyActive(ChainId),
    /// One switch request was issued and accepted.
    Switched { from: ChainId, to: ChainId },
}

impl NetworkStatus {
    pub fn chain_id(self) -> ChainId {
        match self {
            NetworkStatus::AlreadyActive(chain_id) => chain_id,
            NetworkStatus::Switched { to, .. } => to,
        }
    }
}

/// Handle on the (possibly absent) signing agent.
#[derive(Clone, Default)]
pub struct WalletConnector {
    provider: Option<Arc<dyn WalletProvider>>,
}

impl WalletConnector {
    /// `None` models a client without any injected agent.
    pub fn new(provider: Option<Arc<dyn WalletProvider>>) -> Self {
        Self { provider }
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    fn provider(&self) -> PedigreeResult<&Arc<dyn WalletProvider>> {
        self.provider.as_ref().ok_or(PedigreeError::NoWalletDetected)
    }

    /// Request account access and open a session for the primary account.
    pub async fn connect(&self) -> PedigreeResult<WalletSession> {
        let provider = self.provider()?;

        let accounts = provider.request_accounts().await?;
        // An agent that answers with no account behaves like a dismissed prompt.
        let address = accounts.first().copied().ok_or(PedigreeError::UserCancelled)?;
        let chain_id = provider.chain_id().await?;

        tracing::info!(address = %address, chain_id = %chain_id, "Wallet connected");
        Ok(WalletSession::connected(address, chain_id))
    }

    /// Make sure the agent is on `required`, issuing at most one switch request.
    pub async fn ensure_network(&self, required: ChainId) -> PedigreeResult<NetworkStatus> {
        let provider = self.provider()?;

        let current = provider.chain_id().await?;
        if current == required {
            tracing::debug!(chain_id = %required, "Wallet already on required network");
            return Ok(NetworkStatus::AlreadyActive(required));
        }

        tracing::warn!(
            expected = %required,
            actual = %current,
            chain_hex = %required.to_hex(),
            "Wallet on wrong network, requesting switch"
        );

        match provider.switch_chain(required).await {
            Ok(()) => {
                metrics::record_network_switch(true);
                tracing::info!(from = %current, to = %required, "Wallet switched network");
                Ok(NetworkStatus::Switched {
                    from: current,
                    to: required,
                })
            }
            Err(err) => {
                metrics::record_network_switch(false);
                tracing::error!(chain_id = %required, error = %err, "Network switch failed");
                Err(PedigreeError::NetworkSwitchFailed {
                    chain_id: required,
                    reason: err.display_message().to_string(),
                })
            }
        }
    }

    /// Account-change notifications, `None` without an agent.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<AccountsChanged>> {
        self.provider.as_ref().map(|provider| provider.subscribe_accounts())
    }
}

impl std::fmt::Debug for WalletConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConnector")
            .field("available", &self.is_available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockWallet;
    use alloy::primitives::Address;

    fn connector(wallet: &Arc<MockWallet>) -> WalletConnector {
        WalletConnector::new(Some(wallet.clone() as Arc<dyn WalletProvider>))
    }

    #[tokio::test]
    async fn test_connect_without_agent() {
        let result = WalletConnector::new(None).connect().await;
        assert_eq!(result.unwrap_err(), PedigreeError::NoWalletDetected);
    }

    #[tokio::test]
    async fn test_connect_returns_primary_account() {
        let alice = Address::repeat_byte(0xa1);
        let wallet = Arc::new(MockWallet::new(vec![alice, Address::repeat_byte(2)], ChainId(1)));
        let session = connector(&wallet).connect().await.unwrap();
        assert_eq!(session, WalletSession::connected(alice, ChainId(1)));
    }

    #[tokio::test]
    async fn test_dismissed_prompt_is_user_cancelled() {
        let wallet = Arc::new(MockWallet::new(vec![Address::repeat_byte(1)], ChainId(1)));
        wallet.reject_account_requests(true);
        let result = connector(&wallet).connect().await;
        assert_eq!(result.unwrap_err(), PedigreeError::UserCancelled);
    }

    #[tokio::test]
    async fn test_matching_chain_is_a_no_op() {
        let wallet = Arc::new(MockWallet::new(vec![Address::repeat_byte(1)], ChainId(31337)));
        let connector = connector(&wallet);
        for _ in 0..3 {
            let status = connector.ensure_network(ChainId(31337)).await.unwrap();
            assert_eq!(status, NetworkStatus::AlreadyActive(ChainId(31337)));
        }
        assert_eq!(wallet.switch_requests(), 0);
    }

    #[tokio::test]
    async fn test_mismatch_issues_one_switch_request() {
        let wallet = Arc::new(MockWallet::new(vec![Address::repeat_byte(1)], ChainId(1)));
        let status = connector(&wallet).ensure_network(ChainId(31337)).await.unwrap();
        assert_eq!(
            status,
            NetworkStatus::Switched {
                from: ChainId(1),
                to: ChainId(31337)
            }
        );
        assert_eq!(status.chain_id(), ChainId(31337));
        assert_eq!(wallet.switch_requests(), 1);
    }

    #[tokio::test]
    async fn test_failed_switch_is_not_retried() {
        let wallet = Arc::new(MockWallet::new(vec![Address::repeat_byte(1)], ChainId(1)));
        wallet.reject_chain_switches(true);
        let connector = connector(&wallet);

        let err = connector.ensure_network(ChainId(31337)).await.unwrap_err();
        assert!(matches!(err, PedigreeError::NetworkSwitchFailed { chain_id, .. } if chain_id == ChainId(31337)));
        assert_eq!(wallet.switch_requests(), 1);

        let _ = connector.ensure_network(ChainId(31337)).await;
        assert_eq!(wallet.switch_requests(), 2);
    }
}
