//! Pedigree registry subsystem.
//!
//! # Data Flow
//! ```text
//! DogForm (raw input)
//!     → types.rs (DogRegistration: field validation, no network)
//!     → client.rs (PedigreeClient: pedigree checks, registerDog / retrieveDog)
//!     → backend.rs (Registry trait, TransactionHandle)
//!     → contract.rs (alloy bindings, JSON-RPC, receipt polling)
//! ```
//!
//! # Design Decisions
//! - The registry stays the source of truth; local pedigree checks are a fast-fail
//! - Records are read on demand and never cached across sessions
//! - Receipt waits have no deadline

pub mod backend;
pub mod client;
pub mod contract;
pub mod pedigree;
pub mod types;

pub use backend::{Registry, TransactionHandle, TxReceipt};
pub use client::PedigreeClient;
pub use contract::ContractRegistry;
pub use pedigree::{Pedigree, PedigreeGraph};
pub use types::{DogForm, DogRecord, DogRegistration};
