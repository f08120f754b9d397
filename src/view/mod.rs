//! View state machine.

pub mod state;

pub use state::{ViewEvent, ViewState, ViewStateController};
