//! Which panel the application shows.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    /// No signing agent was detected.
    NoWallet,
    #[default]
    Disconnected,
    ConnectedIdle,
    RegisterMode,
    CheckMode,
}

/// Inputs that move the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    Connected,
    ShowRegister,
    ShowCheck,
    /// Leave the current panel.
    Back,
    /// The session was torn down.
    SessionReset,
}

impl ViewState {
    /// Pure transition. Events that do not apply leave the state unchanged.
    pub fn next(self, event: ViewEvent) -> ViewState {
        use ViewEvent::*;
        use ViewState::*;

        match (self, event) {
            (NoWallet, _) => NoWallet,
            (_, SessionReset) => Disconnected,
            (Disconnected, Connected) => ConnectedIdle,
            (Disconnected, _) => Disconnected,
            // Register and check panels are exclusive; picking one replaces the other.
            (ConnectedIdle | RegisterMode | CheckMode, ShowRegister) => RegisterMode,
            (ConnectedIdle | RegisterMode | CheckMode, ShowCheck) => CheckMode,
            (RegisterMode | CheckMode, Back) => ConnectedIdle,
            (state, _) => state,
        }
    }

    pub fn is_connected(self) -> bool {
        matches!(self, ViewState::ConnectedIdle | ViewState::RegisterMode | ViewState::CheckMode)
    }
}

/// Tracks the view and whether a signing agent exists at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewStateController {
    wallet_present: bool,
    state: ViewState,
}

impl ViewStateController {
    pub fn new(wallet_present: bool) -> Self {
        Self {
            wallet_present,
            state: ViewState::Disconnected,
        }
    }

    /// The state to render. Agent absence wins over everything else.
    pub fn current(&self) -> ViewState {
        if self.wallet_present {
            self.state
        } else {
            ViewState::NoWallet
        }
    }

    pub fn apply(&mut self, event: ViewEvent) -> ViewState {
        self.state = self.state.next(event);
        self.current()
    }
}
