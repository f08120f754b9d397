//! Single-slot transaction lifecycle.
//!
//! `Idle → Submitting → Pending(hash) → {Confirmed | ExecutionFailed |
//! UserCancelled | RpcError} → Idle`

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use alloy::primitives::TxHash;
use tokio::sync::watch;

use crate::error::{PedigreeError, PedigreeResult};
use crate::observability::metrics;
use crate::orchestrator::classify;
use crate::registry::TransactionHandle;
use crate::types::{DogId, SessionIdentity};

/// Status of the transaction occupying the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

/// The in-flight write, tagged with the session that submitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    pub hash: TxHash,
    pub submitted_at: SystemTime,
    pub status: TxStatus,
    pub identity: SessionIdentity,
}

/// What currently occupies the slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TxPhase {
    #[default]
    Idle,
    /// The write was requested; no hash yet.
    Submitting { identity: SessionIdentity },
    Pending(PendingTransaction),
}

impl TxPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, TxPhase::Idle)
    }

    pub fn pending(&self) -> Option<&PendingTransaction> {
        match self {
            TxPhase::Pending(tx) => Some(tx),
            _ => None,
        }
    }

    pub fn identity(&self) -> Option<SessionIdentity> {
        match self {
            TxPhase::Idle => None,
            TxPhase::Submitting { identity } => Some(*identity),
            TxPhase::Pending(tx) => Some(tx.identity),
        }
    }
}

/// Terminal result of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    Confirmed {
        hash: TxHash,
        block_number: Option<u64>,
        dog_id: Option<DogId>,
    },
    /// Mined but reverted.
    ExecutionFailed { hash: TxHash },
    /// The signer declined. Not an error from the user's point of view.
    UserCancelled,
    RpcError { message: String },
}

impl TxOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            TxOutcome::Confirmed { .. } => "confirmed",
            TxOutcome::ExecutionFailed { .. } => "execution_failed",
            TxOutcome::UserCancelled => "user_cancelled",
            TxOutcome::RpcError { .. } => "rpc_error",
        }
    }

    /// The error to show for this outcome, if any.
    pub fn visible_error(&self) -> Option<PedigreeError> {
        match self {
            TxOutcome::Confirmed { .. } | TxOutcome::UserCancelled => None,
            TxOutcome::ExecutionFailed { hash } => Some(PedigreeError::ExecutionFailed { hash: *hash }),
            TxOutcome::RpcError { message } => Some(PedigreeError::Rpc(message.clone())),
        }
    }
}

struct Slot {
    /// Bumped on every acquisition and reset; guards only touch their own generation.
    generation: u64,
    phase: TxPhase,
}

struct Inner {
    slot: Mutex<Slot>,
    phase_tx: watch::Sender<TxPhase>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        // A panic while holding the lock cannot leave the slot half-written.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, phase: TxPhase) {
        metrics::set_pending_transactions(usize::from(!phase.is_idle()));
        self.phase_tx.send_replace(phase);
    }
}

/// Owner of the single pending-transaction slot.
#[derive(Clone)]
pub struct TransactionOrchestrator {
    inner: Arc<Inner>,
}

impl Default for TransactionOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionOrchestrator {
    pub fn new() -> Self {
        let (phase_tx, _) = watch::channel(TxPhase::Idle);
        Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(Slot {
                    generation: 0,
                    phase: TxPhase::Idle,
                }),
                phase_tx,
            }),
        }
    }

    pub fn phase(&self) -> TxPhase {
        self.inner.lock().phase.clone()
    }

    pub fn is_idle(&self) -> bool {
        self.inner.lock().phase.is_idle()
    }

    /// Phase changes, for projections.
    pub fn subscribe(&self) -> watch::Receiver<TxPhase> {
        self.inner.phase_tx.subscribe()
    }

    /// Free the slot on session teardown.
    ///
    /// The in-flight attempt keeps running but can no longer touch the slot.
    pub fn reset(&self) {
        let mut slot = self.inner.lock();
        if !slot.phase.is_idle() {
            tracing::info!(phase = ?slot.phase, "Discarding pending transaction on session reset");
        }
        slot.generation += 1;
        slot.phase = TxPhase::Idle;
        self.inner.publish(TxPhase::Idle);
    }

    fn acquire(&self, identity: SessionIdentity) -> PedigreeResult<SlotGuard> {
        let mut slot = self.inner.lock();
        if !slot.phase.is_idle() {
            tracing::warn!(phase = ?slot.phase, "Rejecting submission, a transaction is already pending");
            return Err(PedigreeError::AlreadyPending);
        }
        slot.generation += 1;
        slot.phase = TxPhase::Submitting { identity };
        self.inner.publish(slot.phase.clone());

        Ok(SlotGuard {
            inner: Arc::clone(&self.inner),
            generation: slot.generation,
            identity,
        })
    }

    /// Run one write through the slot and classify its outcome.
    ///
    /// Fails with [`PedigreeError::AlreadyPending`] without invoking `call`
    /// when the slot is occupied. Errors `call` raises locally, such as
    /// validation failures, are returned as `Err`; every network outcome is
    /// `Ok`. The slot is released on every path.
    pub async fn submit<F, Fut>(&self, identity: SessionIdentity, call: F) -> PedigreeResult<TxOutcome>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = PedigreeResult<TransactionHandle>>,
    {
        let guard = self.acquire(identity)?;

        let handle = match call().await {
            Ok(handle) => handle,
            Err(err) => {
                let outcome = classify::submission_failure(err)?;
                metrics::record_transaction_outcome(outcome.label());
                return Ok(outcome);
            }
        };

        let hash = handle.hash();
        guard.set_pending(hash);
        tracing::info!(tx_hash = %hash, session = %identity, "Waiting for transaction to be mined");

        let outcome = match handle.wait().await {
            Ok(receipt) => classify::receipt_outcome(&receipt),
            Err(err) => classify::confirmation_failure(hash, err),
        };
        guard.set_status(match outcome {
            TxOutcome::Confirmed { .. } => TxStatus::Confirmed,
            _ => TxStatus::Failed,
        });

        metrics::record_transaction_outcome(outcome.label());
        Ok(outcome)
    }
}

impl std::fmt::Debug for TransactionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionOrchestrator")
            .field("phase", &self.phase())
            .finish()
    }
}

/// Occupancy of the slot; dropping it returns the slot to `Idle`.
struct SlotGuard {
    inner: Arc<Inner>,
    generation: u64,
    identity: SessionIdentity,
}

impl SlotGuard {
    fn update(&self, f: impl FnOnce(&mut TxPhase)) {
        let mut slot = self.inner.lock();
        if slot.generation != self.generation {
            return;
        }
        f(&mut slot.phase);
        self.inner.publish(slot.phase.clone());
    }

    fn set_pending(&self, hash: TxHash) {
        let identity = self.identity;
        self.update(|phase| {
            *phase = TxPhase::Pending(PendingTransaction {
                hash,
                submitted_at: SystemTime::now(),
                status: TxStatus::Pending,
                identity,
            })
        });
    }

    fn set_status(&self, status: TxStatus) {
        self.update(|phase| {
            if let TxPhase::Pending(tx) = phase {
                tx.status = status;
            }
        });
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.update(|phase| *phase = TxPhase::Idle);
    }
}
