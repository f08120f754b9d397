//! PedigreePal client library
//!
//! Connects a signing wallet to the on-chain dog pedigree registry, keeps the
//! wallet on the registry's network and runs registrations one at a time.
//!
//! # Architecture Overview
//!
//! ```text
//!   Intent ──▶ app::update ──▶ Effect ──▶ app::runtime
//!                 ▲                          │
//!                 │                          ├─▶ wallet::WalletConnector ──▶ WalletProvider
//!                 │                          ├─▶ orchestrator (single pending slot)
//!                 │                          └─▶ registry::PedigreeClient ──▶ Registry
//!                 └──────── Message (tagged with SessionIdentity) ◀──┘
//! ```

// Domain
pub mod error;
pub mod types;

// Collaborators
pub mod registry;
pub mod wallet;

// Orchestration
pub mod app;
pub mod orchestrator;
pub mod view;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub mod testing;

pub use app::{AppState, Dapp, DappHandle, Intent};
pub use config::PedigreeConfig;
pub use error::{PedigreeError, PedigreeResult};
