//! In-process signing agent backed by local private keys.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;
use url::Url;

use crate::config::schema::{NetworkConfig, WalletConfig};
use crate::error::{ProviderError, UNRECOGNIZED_CHAIN};
use crate::types::ChainId;
use crate::wallet::provider::{AccountsChanged, WalletProvider};

/// Environment variable read when the config does not name another one.
pub const PRIVATE_KEY_ENV_VAR: &str = "PEDIGREE_PRIVATE_KEY";

/// Errors building a [`LocalWallet`].
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Invalid private key format: {0}")]
    InvalidKey(String),

    #[error("Environment variable {0} not set")]
    MissingEnv(String),

    #[error("No private key configured")]
    NoAccounts,

    #[error("No networks configured")]
    NoNetworks,

    #[error("Chain {0} is not a configured network")]
    UnknownNetwork(ChainId),

    #[error("Invalid RPC URL '{url}': {reason}")]
    InvalidRpcUrl { url: String, reason: String },
}

/// A signing agent holding one or more local accounts and a table of known networks.
///
/// Approves every request; account and network changes are driven through
/// [`LocalWallet::select_account`], [`LocalWallet::disconnect`] and
/// [`WalletProvider::switch_chain`].
pub struct LocalWallet {
    signers: Vec<PrivateKeySigner>,
    /// Index of the account exposed first.
    selected: AtomicUsize,
    networks: HashMap<ChainId, Url>,
    chain_id: AtomicU64,
    accounts_tx: broadcast::Sender<AccountsChanged>,
}

impl LocalWallet {
    /// Create a wallet from hex-encoded private keys (with or without 0x prefix).
    pub fn from_private_keys<I, S>(
        keys: I,
        networks: &[NetworkConfig],
        initial_chain: Option<ChainId>,
    ) -> Result<Self, WalletError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let signers = keys
            .into_iter()
            .map(|key| {
                let key = key.as_ref().trim();
                let key_hex = key.strip_prefix("0x").unwrap_or(key);
                key_hex
                    .parse::<PrivateKeySigner>()
                    .map_err(|e| WalletError::InvalidKey(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if signers.is_empty() {
            return Err(WalletError::NoAccounts);
        }

        let mut table = HashMap::new();
        for network in networks {
            let url: Url = network.rpc_url.parse().map_err(|e: url::ParseError| {
                WalletError::InvalidRpcUrl {
                    url: network.rpc_url.clone(),
                    reason: e.to_string(),
                }
            })?;
            table.insert(ChainId(network.chain_id), url);
        }

        let chain_id = match initial_chain {
            Some(chain_id) if table.contains_key(&chain_id) => chain_id,
            Some(chain_id) => return Err(WalletError::UnknownNetwork(chain_id)),
            None => networks
                .first()
                .map(|network| ChainId(network.chain_id))
                .ok_or(WalletError::NoNetworks)?,
        };

        tracing::info!(
            address = %signers[0].address(),
            accounts = signers.len(),
            chain_id = %chain_id,
            "Local wallet initialized"
        );

        let (accounts_tx, _) = broadcast::channel(16);
        Ok(Self {
            signers,
            selected: AtomicUsize::new(0),
            networks: table,
            chain_id: AtomicU64::new(chain_id.0),
            accounts_tx,
        })
    }

    /// Load the wallet keys from the environment variable named in `config`.
    ///
    /// The variable may hold several comma-separated keys, one per account.
    pub fn from_env(config: &WalletConfig, networks: &[NetworkConfig]) -> Result<Self, WalletError> {
        let raw = std::env::var(&config.private_key_env)
            .map_err(|_| WalletError::MissingEnv(config.private_key_env.clone()))?;

        Self::from_private_keys(
            raw.split(',').filter(|key| !key.trim().is_empty()),
            networks,
            config.initial_chain_id.map(ChainId),
        )
    }

    /// Accounts in agent order: the selected account first.
    pub fn addresses(&self) -> Vec<Address> {
        let selected = self.selected.load(Ordering::SeqCst);
        let mut addresses: Vec<Address> = self.signers.iter().map(|s| s.address()).collect();
        addresses.rotate_left(selected);
        addresses
    }

    pub fn current_chain(&self) -> ChainId {
        ChainId(self.chain_id.load(Ordering::SeqCst))
    }

    /// RPC endpoint of the network the wallet is currently on.
    pub fn rpc_url(&self) -> Result<Url, ProviderError> {
        let chain_id = self.current_chain();
        self.networks.get(&chain_id).cloned().ok_or_else(|| {
            ProviderError::new(UNRECOGNIZED_CHAIN, format!("Unrecognized chain ID {}", chain_id.to_hex()))
        })
    }

    /// A signing provider for the current network.
    ///
    /// Every local account is registered; the selected one is the default signer.
    pub fn provider(&self) -> Result<DynProvider, ProviderError> {
        let url = self.rpc_url()?;
        let selected = self.selected.load(Ordering::SeqCst);

        let mut wallet = EthereumWallet::new(self.signers[selected].clone());
        for (index, signer) in self.signers.iter().enumerate() {
            if index != selected {
                wallet.register_signer(signer.clone());
            }
        }

        Ok(ProviderBuilder::new().wallet(wallet).connect_http(url).erased())
    }

    /// Make another account the active one and notify subscribers.
    pub fn select_account(&self, index: usize) -> Option<Address> {
        let signer = self.signers.get(index)?;
        self.selected.store(index, Ordering::SeqCst);
        tracing::info!(address = %signer.address(), "Local wallet account selected");
        let _ = self.accounts_tx.send(AccountsChanged(self.addresses()));
        Some(signer.address())
    }

    /// Revoke this client's access, delivering an empty account list.
    pub fn disconnect(&self) {
        tracing::info!("Local wallet access revoked");
        let _ = self.accounts_tx.send(AccountsChanged::default());
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        Ok(self.addresses())
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        Ok(self.current_chain())
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError> {
        if !self.networks.contains_key(&chain_id) {
            return Err(ProviderError::new(
                UNRECOGNIZED_CHAIN,
                format!("Unrecognized chain ID {}", chain_id.to_hex()),
            ));
        }
        self.chain_id.store(chain_id.0, Ordering::SeqCst);
        Ok(())
    }

    fn subscribe_accounts(&self) -> broadcast::Receiver<AccountsChanged> {
        self.accounts_tx.subscribe()
    }
}

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("addresses", &self.addresses())
            .field("chain_id", &self.current_chain())
            .finish()
    }
}
