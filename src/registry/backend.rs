//! The on-chain registry seam.

use std::sync::Arc;

use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;

use crate::error::ProviderError;
use crate::registry::types::{DogRecord, DogRegistration};
use crate::types::DogId;

/// Mined transaction outcome as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub hash: TxHash,
    /// `false` when execution reverted.
    pub success: bool,
    pub block_number: Option<u64>,
    /// Id carried by a `DogRegistered` event in the receipt, if any.
    pub registered_id: Option<DogId>,
}

/// Operations of the pedigree registry contract.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Send `registerDog` signed by `from`; resolves once the hash is known.
    async fn register_dog(&self, from: Address, dog: &DogRegistration) -> Result<TxHash, ProviderError>;

    /// Wait until the transaction is mined. No deadline is imposed.
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt, ProviderError>;

    /// `retrieveDog`; `None` when the registry has no record for `id`.
    async fn retrieve_dog(&self, id: DogId) -> Result<Option<DogRecord>, ProviderError>;

    /// Number of registered dogs; ids are assigned sequentially from 1.
    async fn dog_count(&self) -> Result<u64, ProviderError>;
}

/// A submitted write whose hash is known but which may not be mined yet.
pub struct TransactionHandle {
    hash: TxHash,
    registry: Arc<dyn Registry>,
}

impl TransactionHandle {
    pub fn new(hash: TxHash, registry: Arc<dyn Registry>) -> Self {
        Self { hash, registry }
    }

    pub fn hash(&self) -> TxHash {
        self.hash
    }

    /// Wait for the receipt.
    pub async fn wait(self) -> Result<TxReceipt, ProviderError> {
        self.registry.wait_for_receipt(self.hash).await
    }
}

impl std::fmt::Debug for TransactionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionHandle")
            .field("hash", &self.hash)
            .finish()
    }
}
