//! Application state snapshot.

use crate::error::PedigreeError;
use crate::orchestrator::{TxOutcome, TxPhase};
use crate::registry::DogRecord;
use crate::types::ChainId;
use crate::view::{ViewEvent, ViewState, ViewStateController};
use crate::wallet::WalletSession;

/// Everything a front end needs to render. Replaced wholesale by `update`.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    /// Chain the registry lives on.
    pub required_chain: ChainId,
    pub session: WalletSession,
    pub(super) view: ViewStateController,
    /// Projection of the orchestrator slot.
    pub transaction: TxPhase,
    /// The one visible transaction-level error.
    pub transaction_error: Option<PedigreeError>,
    /// Network problems; kept until dismissed.
    pub network_error: Option<PedigreeError>,
    /// Result of the last successful lookup.
    pub last_dog: Option<DogRecord>,
    /// Informational message, e.g. a lookup miss.
    pub notice: Option<String>,
    pub last_outcome: Option<TxOutcome>,
    /// Number of the latest submission; results of any other attempt are stale.
    pub attempt: u64,
}

impl AppState {
    pub fn new(required_chain: ChainId, wallet_present: bool) -> Self {
        Self {
            required_chain,
            session: WalletSession::default(),
            view: ViewStateController::new(wallet_present),
            transaction: TxPhase::Idle,
            transaction_error: None,
            network_error: None,
            last_dog: None,
            notice: None,
            last_outcome: None,
            attempt: 0,
        }
    }

    pub fn view(&self) -> ViewState {
        self.view.current()
    }

    pub fn wallet_present(&self) -> bool {
        self.view.current() != ViewState::NoWallet
    }

    pub(super) fn apply_view(&mut self, event: ViewEvent) {
        self.view.apply(event);
    }

    /// The state right after start-up, keeping only what survives a reset.
    ///
    /// The attempt counter survives so a result from before the reset can
    /// never match a later submission.
    pub fn reset(&self) -> Self {
        let mut view = self.view;
        view.apply(ViewEvent::SessionReset);
        Self {
            view,
            attempt: self.attempt,
            ..Self::new(self.required_chain, self.wallet_present())
        }
    }

    /// Start a new submission attempt and return its number.
    pub(super) fn begin_attempt(&mut self) -> u64 {
        self.attempt += 1;
        self.attempt
    }

    /// Whether the session is on the registry's chain.
    pub fn on_required_chain(&self) -> bool {
        self.session.is_on(self.required_chain)
    }
}
