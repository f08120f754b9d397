//! Transaction orchestration.
//!
//! # Data Flow
//! ```text
//! submit(identity, call)
//!     → acquire slot (AlreadyPending if occupied)
//!     → call() → TransactionHandle (hash known, slot becomes Pending)
//!     → wait for receipt
//!     → classify.rs (TxOutcome)
//!     → slot released (guard drop)
//! ```
//!
//! # Design Decisions
//! - At most one pending write per orchestrator
//! - `reset()` bumps a generation so an abandoned attempt cannot free a newer one
//! - User rejection is an outcome, not an error

pub mod classify;
pub mod transaction;

pub use transaction::{PendingTransaction, TransactionOrchestrator, TxOutcome, TxPhase, TxStatus};
