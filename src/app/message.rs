//! Messages and effects of the update loop.

use crate::error::PedigreeError;
use crate::orchestrator::{PendingTransaction, TxOutcome};
use crate::registry::{DogForm, DogRecord, DogRegistration};
use crate::types::{ChainId, DogId, SessionIdentity};
use crate::wallet::{AccountsChanged, WalletSession};

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Connect,
    ShowRegister,
    ShowCheck,
    Back,
    RegisterDog(DogForm),
    CheckDog(DogId),
    DismissTransactionError,
    DismissNetworkError,
}

/// Input to [`update`](super::update::update).
///
/// Every effect result carries the identity of the session that dispatched it;
/// transaction results also carry their attempt number.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Intent(Intent),

    Connected(WalletSession),
    ConnectFailed(PedigreeError),

    NetworkReady {
        identity: SessionIdentity,
        chain_id: ChainId,
    },
    NetworkSwitchFailed {
        identity: SessionIdentity,
        error: PedigreeError,
    },

    /// `accountsChanged` from the signing agent.
    AccountsChanged(AccountsChanged),

    /// The orchestrator slot now holds a hash.
    TransactionPending(PendingTransaction),
    TransactionFinished {
        identity: SessionIdentity,
        attempt: u64,
        outcome: TxOutcome,
    },
    /// Refused before anything reached the network.
    TransactionRejected {
        identity: SessionIdentity,
        attempt: u64,
        error: PedigreeError,
    },

    DogLoaded {
        identity: SessionIdentity,
        id: DogId,
        result: Result<DogRecord, PedigreeError>,
    },
}

impl From<Intent> for Message {
    fn from(intent: Intent) -> Self {
        Message::Intent(intent)
    }
}

/// Work the runtime performs on behalf of `update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Connect,
    EnsureNetwork {
        identity: SessionIdentity,
    },
    Submit {
        identity: SessionIdentity,
        /// Echoed back on the result.
        attempt: u64,
        session: WalletSession,
        registration: DogRegistration,
    },
    RetrieveDog {
        identity: SessionIdentity,
        id: DogId,
    },
    /// Free the orchestrator slot.
    ResetTransactions,
}
