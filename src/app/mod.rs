//! Application layer: state, messages, transitions and the runtime.
//!
//! # Data Flow
//! ```text
//! Intent / effect result / accountsChanged
//!     → Message
//!     → update.rs (pure: AppState × Message → AppState, [Effect])
//!     → runtime.rs (runs effects as tasks, publishes AppState on a watch channel)
//! ```
//!
//! Effects are tagged with the [`SessionIdentity`](crate::types::SessionIdentity)
//! current at dispatch; `update` drops results whose identity is stale.

pub mod message;
pub mod runtime;
pub mod state;
pub mod update;

pub use message::{Effect, Intent, Message};
pub use runtime::{Dapp, DappHandle};
pub use state::AppState;
pub use update::update;
