//! In-memory stand-ins for the signing agent and the registry.
//!
//! Used by the unit and integration tests; also handy for driving the
//! orchestration layer without a node.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy::primitives::{keccak256, Address, TxHash};
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{broadcast, watch};

use crate::error::{ProviderError, UNRECOGNIZED_CHAIN};
use crate::registry::backend::{Registry, TxReceipt};
use crate::registry::pedigree::PedigreeGraph;
use crate::registry::types::{DogRecord, DogRegistration};
use crate::types::{ChainId, DogId};
use crate::wallet::provider::{AccountsChanged, WalletProvider};

/// Scriptable signing agent.
pub struct MockWallet {
    accounts: Mutex<Vec<Address>>,
    chain_id: AtomicU64,
    reject_accounts: AtomicBool,
    reject_switch: AtomicBool,
    account_requests: AtomicUsize,
    switch_requests: AtomicUsize,
    accounts_tx: broadcast::Sender<AccountsChanged>,
}

impl MockWallet {
    pub fn new(accounts: Vec<Address>, chain_id: ChainId) -> Self {
        let (accounts_tx, _) = broadcast::channel(16);
        Self {
            accounts: Mutex::new(accounts),
            chain_id: AtomicU64::new(chain_id.0),
            reject_accounts: AtomicBool::new(false),
            reject_switch: AtomicBool::new(false),
            account_requests: AtomicUsize::new(0),
            switch_requests: AtomicUsize::new(0),
            accounts_tx,
        }
    }

    /// Dismiss the account prompt (code 4001).
    pub fn reject_account_requests(&self, reject: bool) {
        self.reject_accounts.store(reject, Ordering::SeqCst);
    }

    /// Answer switch requests with "unrecognized chain" (code 4902).
    pub fn reject_chain_switches(&self, reject: bool) {
        self.reject_switch.store(reject, Ordering::SeqCst);
    }

    pub fn account_requests(&self) -> usize {
        self.account_requests.load(Ordering::SeqCst)
    }

    pub fn switch_requests(&self) -> usize {
        self.switch_requests.load(Ordering::SeqCst)
    }

    pub fn current_chain(&self) -> ChainId {
        ChainId(self.chain_id.load(Ordering::SeqCst))
    }

    /// Change the exposed accounts and fire `accountsChanged`.
    pub fn emit_accounts(&self, accounts: Vec<Address>) {
        if let Ok(mut current) = self.accounts.lock() {
            *current = accounts.clone();
        }
        let _ = self.accounts_tx.send(AccountsChanged(accounts));
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.account_requests.fetch_add(1, Ordering::SeqCst);
        if self.reject_accounts.load(Ordering::SeqCst) {
            return Err(ProviderError::user_rejected());
        }
        self.accounts
            .lock()
            .map(|accounts| accounts.clone())
            .map_err(|_| ProviderError::internal("account list poisoned"))
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        Ok(self.current_chain())
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError> {
        self.switch_requests.fetch_add(1, Ordering::SeqCst);
        if self.reject_switch.load(Ordering::SeqCst) {
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

/// Registry kept in memory.
///
/// Transactions are mined when their receipt is first awaited. Mining
/// enforces the pedigree invariants the way a strict contract would:
/// parents must already be registered, otherwise the receipt reports a revert.
pub struct InMemoryRegistry {
    dogs: DashMap<DogId, DogRecord>,
    count: AtomicU64,
    blocks: AtomicU64,
    nonce: AtomicU64,
    submitted: DashMap<TxHash, (DogRegistration, bool)>,
    receipts: DashMap<TxHash, TxReceipt>,
    submissions: AtomicUsize,
    next_failure: Mutex<Option<ProviderError>>,
    revert_next: AtomicBool,
    hold: AtomicBool,
    released: watch::Sender<HashSet<TxHash>>,
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        let (released, _) = watch::channel(HashSet::new());
        Self {
            dogs: DashMap::new(),
            count: AtomicU64::new(0),
            blocks: AtomicU64::new(0),
            nonce: AtomicU64::new(0),
            submitted: DashMap::new(),
            receipts: DashMap::new(),
            submissions: AtomicUsize::new(0),
            next_failure: Mutex::new(None),
            revert_next: AtomicBool::new(false),
            hold: AtomicBool::new(false),
            released,
        }
    }

    /// Number of `registerDog` calls that reached the registry.
    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Fail the next `registerDog` call with `err`.
    pub fn fail_next_submission(&self, err: ProviderError) {
        if let Ok(mut next) = self.next_failure.lock() {
            *next = Some(err);
        }
    }

    /// Make the next submitted transaction revert when mined.
    pub fn revert_next(&self) {
        self.revert_next.store(true, Ordering::SeqCst);
    }

    /// Keep receipts pending until [`InMemoryRegistry::release`] is called.
    pub fn hold_receipts(&self, hold: bool) {
        self.hold.store(hold, Ordering::SeqCst);
    }

    pub fn release(&self, hash: TxHash) {
        self.released.send_modify(|released| {
            released.insert(hash);
        });
    }

    /// Transactions submitted but not mined yet.
    pub fn unmined(&self) -> Vec<TxHash> {
        self.submitted.iter().map(|entry| *entry.key()).collect()
    }

    /// Store a record without any checks, e.g. to model a corrupt registry.
    pub fn insert_unchecked(&self, record: DogRecord) {
        self.count.fetch_max(record.id.0, Ordering::SeqCst);
        self.dogs.insert(record.id, record);
    }

    /// Snapshot of every stored record.
    pub fn graph(&self) -> PedigreeGraph {
        let mut graph = PedigreeGraph::new();
        for entry in self.dogs.iter() {
            graph.insert(entry.value().clone());
        }
        graph
    }

    fn mine(&self, hash: TxHash) -> Result<TxReceipt, ProviderError> {
        if let Some(receipt) = self.receipts.get(&hash) {
            return Ok(receipt.clone());
        }
        let (_, (dog, revert)) = self
            .submitted
            .remove(&hash)
            .ok_or_else(|| ProviderError::internal(format!("unknown transaction {hash}")))?;

        let id = DogId(self.count.load(Ordering::SeqCst) + 1);
        let valid = dog
            .parents()
            .all(|(_, parent)| parent != id && self.dogs.contains_key(&parent));

        let registered_id = if !revert && valid {
            self.count.store(id.0, Ordering::SeqCst);
            self.dogs.insert(id, dog.into_record(id));
            Some(id)
        } else {
            None
        };

        let receipt = TxReceipt {
            hash,
            success: registered_id.is_some(),
            block_number: Some(self.blocks.fetch_add(1, Ordering::SeqCst) + 1),
            registered_id,
        };
        self.receipts.insert(hash, receipt.clone());
        Ok(receipt)
    }
}

#[async_trait]
impl Registry for InMemoryRegistry {
    async fn register_dog(&self, _from: Address, dog: &DogRegistration) -> Result<TxHash, ProviderError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        let failure = self.next_failure.lock().ok().and_then(|mut next| next.take());
        if let Some(err) = failure {
            return Err(err);
        }

        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let hash = keccak256(nonce.to_be_bytes());
        let revert = self.revert_next.swap(false, Ordering::SeqCst);
        self.submitted.insert(hash, (dog.clone(), revert));
        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt, ProviderError> {
        if self.hold.load(Ordering::SeqCst) {
            let mut released = self.released.subscribe();
            if released.wait_for(|released| released.contains(&hash)).await.is_err() {
                return Err(ProviderError::internal("registry dropped"));
            }
        }
        self.mine(hash)
    }

    async fn retrieve_dog(&self, id: DogId) -> Result<Option<DogRecord>, ProviderError> {
        Ok(self.dogs.get(&id).map(|record| record.clone()))
    }

    async fn dog_count(&self) -> Result<u64, ProviderError> {
        Ok(self.count.load(Ordering::SeqCst))
    }
}
