//! Typed facade over the registry operations.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{PedigreeError, PedigreeResult, ValidationError};
use crate::observability::metrics;
use crate::registry::backend::{Registry, TransactionHandle};
use crate::registry::pedigree::{Pedigree, PedigreeGraph};
use crate::registry::types::{DogRecord, DogRegistration};
use crate::types::DogId;
use crate::wallet::WalletSession;

/// Registry client used by the orchestration layer.
#[derive(Clone)]
pub struct PedigreeClient {
    registry: Arc<dyn Registry>,
    /// Check pedigree invariants locally before sending a write.
    validate_pedigree: bool,
}

impl PedigreeClient {
    pub fn new(registry: Arc<dyn Registry>, validate_pedigree: bool) -> Self {
        Self {
            registry,
            validate_pedigree,
        }
    }

    /// Send `registerDog` signed by the session's account.
    ///
    /// The returned handle carries the hash before the transaction is mined.
    pub async fn register_dog(
        &self,
        session: &WalletSession,
        dog: &DogRegistration,
    ) -> PedigreeResult<TransactionHandle> {
        let from = session
            .address
            .filter(|_| session.connected)
            .ok_or(PedigreeError::NotConnected)?;

        if self.validate_pedigree {
            self.check_parents(dog).await?;
        }

        let hash = self.registry.register_dog(from, dog).await?;
        tracing::info!(tx_hash = %hash, name = %dog.name, from = %from, "Dog registration submitted");
        Ok(TransactionHandle::new(hash, Arc::clone(&self.registry)))
    }

    /// Reject parent references that could make the new dog its own ancestor.
    ///
    /// Ids are assigned sequentially, so a new dog can only close a cycle by
    /// naming itself or an id that is not registered yet.
    pub async fn check_parents(&self, dog: &DogRegistration) -> PedigreeResult<()> {
        let forthcoming = DogId(self.registry.dog_count().await? + 1);

        for (parent, id) in dog.parents() {
            if id == forthcoming {
                return Err(ValidationError::SelfReference { parent, id }.into());
            }
            if id > forthcoming || self.registry.retrieve_dog(id).await?.is_none() {
                return Err(ValidationError::UnknownParent { parent, id }.into());
            }
        }
        Ok(())
    }

    /// `retrieveDog`; a miss is [`PedigreeError::NotFound`].
    pub async fn retrieve_dog(&self, id: DogId) -> PedigreeResult<DogRecord> {
        match self.registry.retrieve_dog(id).await {
            Ok(Some(record)) => {
                metrics::record_registry_read("found");
                Ok(record)
            }
            Ok(None) => {
                metrics::record_registry_read("not_found");
                Err(PedigreeError::NotFound(id))
            }
            Err(err) => {
                metrics::record_registry_read("error");
                tracing::error!(dog_id = %id, error = %err, "retrieveDog failed");
                Err(err.into())
            }
        }
    }

    /// Walk mother/father edges up to `generations` levels above `id`.
    ///
    /// Parents the registry does not know are left out. The result is
    /// validated, so a self-reference or cycle stored on chain is reported.
    pub async fn retrieve_pedigree(&self, id: DogId, generations: u32) -> PedigreeResult<Pedigree> {
        let mut graph = PedigreeGraph::new();
        graph.insert(self.retrieve_dog(id).await?);

        let mut queue = VecDeque::from([(id, 0u32)]);
        while let Some((current, depth)) = queue.pop_front() {
            if depth >= generations {
                continue;
            }
            let parents: Vec<DogId> = match graph.get(current) {
                Some(record) => record.parents().map(|(_, id)| id).collect(),
                None => continue,
            };
            for parent in parents {
                if graph.contains(parent) {
                    continue;
                }
                match self.retrieve_dog(parent).await {
                    Ok(record) => {
                        graph.insert(record);
                        queue.push_back((parent, depth + 1));
                    }
                    Err(PedigreeError::NotFound(missing)) => {
                        tracing::warn!(dog_id = %current, parent = %missing, "Parent not registered");
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        graph.validate()?;
        Ok(Pedigree {
            root: id,
            generations,
            graph,
        })
    }

    pub async fn dog_count(&self) -> PedigreeResult<u64> {
        Ok(self.registry.dog_count().await?)
    }
}

impl std::fmt::Debug for PedigreeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PedigreeClient")
            .field("validate_pedigree", &self.validate_pedigree)
            .finish()
    }
}
