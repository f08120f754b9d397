//! Wallet session subsystem.
//!
//! # Data Flow
//! ```text
//! signing agent (WalletProvider: request accounts, switch chain, account events)
//!     → connector.rs (connect, ensure network; classifies agent errors once)
//!     → session.rs (WalletSession snapshot + pure transitions)
//!     → app::update (account changes arrive as messages)
//! ```
//!
//! # Design Decisions
//! - The agent is an injected capability, absent when no wallet is installed
//! - WalletSession is an immutable value; every change produces a new snapshot
//! - Private keys of the local agent come only from environment variables

pub mod connector;
pub mod local;
pub mod provider;
pub mod session;

pub use connector::{NetworkStatus, WalletConnector};
pub use local::LocalWallet;
pub use provider::{AccountsChanged, WalletProvider};
pub use session::{AccountTransition, WalletSession};
