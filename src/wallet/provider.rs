//! The signing agent capability.

use alloy::primitives::Address;
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::ProviderError;
use crate::types::ChainId;

/// Account list delivered by the agent's account-change notification.
///
/// An empty list means the user revoked access for this client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountsChanged(pub Vec<Address>);

impl AccountsChanged {
    /// The account the agent currently exposes first.
    pub fn primary(&self) -> Option<Address> {
        self.0.first().copied()
    }
}

/// A signing agent: holds keys, approves or rejects requests on the user's behalf.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// `eth_requestAccounts`. May prompt the user.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// `eth_chainId` of the network the agent is currently on.
    async fn chain_id(&self) -> Result<ChainId, ProviderError>;

    /// `wallet_switchEthereumChain`.
    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError>;

    /// `accountsChanged` event stream.
    fn subscribe_accounts(&self) -> broadcast::Receiver<AccountsChanged>;
}
