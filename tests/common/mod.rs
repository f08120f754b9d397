//! Shared utilities for the integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use pedigree_pal::app::{AppState, Dapp, DappHandle, Intent};
use pedigree_pal::orchestrator::TransactionOrchestrator;
use pedigree_pal::registry::{DogForm, PedigreeClient};
use pedigree_pal::testing::{InMemoryRegistry, MockWallet};
use pedigree_pal::types::ChainId;
use pedigree_pal::wallet::{WalletConnector, WalletProvider};

pub const HARDHAT: ChainId = ChainId(31337);
pub const MAINNET: ChainId = ChainId(1);
pub const ALICE: Address = Address::repeat_byte(0xa1);
pub const BOB: Address = Address::repeat_byte(0xb0);

/// A running runtime wired to in-memory collaborators.
pub struct Harness {
    pub wallet: Arc<MockWallet>,
    pub registry: Arc<InMemoryRegistry>,
    pub orchestrator: TransactionOrchestrator,
    pub handle: DappHandle,
}

impl Harness {
    /// Runtime requiring Hardhat, with Alice's wallet on `wallet_chain`.
    pub fn start(wallet_chain: ChainId) -> Self {
        let wallet = Arc::new(MockWallet::new(vec![ALICE], wallet_chain));
        let registry = Arc::new(InMemoryRegistry::new());

        let provider: Arc<dyn WalletProvider> = wallet.clone();
        let client = PedigreeClient::new(registry.clone(), true);
        let dapp = Dapp::new(HARDHAT, WalletConnector::new(Some(provider)), client);
        let orchestrator = dapp.orchestrator().clone();

        Self {
            wallet,
            registry,
            orchestrator,
            handle: dapp.spawn(),
        }
    }

    pub async fn send(&self, intent: Intent) {
        assert!(self.handle.dispatch(intent).await, "runtime stopped");
    }

    /// Wait (bounded) for a snapshot matching `predicate`.
    pub async fn until(&self, predicate: impl FnMut(&AppState) -> bool) -> AppState {
        within(self.handle.wait_for(predicate))
            .await
            .expect("runtime stopped")
    }

    /// Connect and wait until the session is on the required chain.
    pub async fn connect(&self) -> AppState {
        self.send(Intent::Connect).await;
        self.until(|s| s.session.connected && s.on_required_chain()).await
    }

    /// Register a dog and wait until the attempt leaves a new outcome or error.
    pub async fn register(&self, form: DogForm) -> AppState {
        let before = self.handle.state();
        self.send(Intent::RegisterDog(form)).await;
        self.until(move |s| {
            s.transaction.is_idle()
                && (s.last_outcome != before.last_outcome || s.transaction_error != before.transaction_error)
        })
        .await
    }
}

/// Fail the test instead of hanging.
pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("timed out")
}

pub fn dog_form(name: &str, sex: &str, mother: u64, father: u64) -> DogForm {
    DogForm {
        name: Some(name.to_string()),
        breed: Some("Labrador".to_string()),
        sex: Some(sex.to_string()),
        age: Some("3".to_string()),
        mother: Some(mother.to_string()),
        father: Some(father.to_string()),
    }
}

pub fn rex() -> DogForm {
    dog_form("Rex", "M", 0, 0)
}
