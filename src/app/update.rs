//! Pure state transitions.

use crate::app::message::{Effect, Intent, Message};
use crate::app::state::AppState;
use crate::error::PedigreeError;
use crate::orchestrator::{TxOutcome, TxPhase};
use crate::registry::{DogForm, DogRegistration};
use crate::types::SessionIdentity;
use crate::view::ViewEvent;
use crate::wallet::AccountTransition;

/// Apply `message` to `state`, returning the next state and the effects to run.
pub fn update(state: &AppState, message: Message) -> (AppState, Vec<Effect>) {
    let mut next = state.clone();
    let effects = match message {
        Message::Intent(intent) => handle_intent(&mut next, intent),

        Message::Connected(session) => {
            let Some(identity) = session.identity() else {
                return (next, vec![]);
            };
            next.session = session;
            next.apply_view(ViewEvent::Connected);
            vec![Effect::EnsureNetwork { identity }]
        }

        Message::ConnectFailed(error) => {
            if error.is_visible() {
                next.transaction_error = Some(error);
            }
            vec![]
        }

        Message::NetworkReady { identity, chain_id } => {
            if is_current(state, &identity) {
                next.session = state.session.with_chain(chain_id);
            }
            vec![]
        }

        Message::NetworkSwitchFailed { identity, error } => {
            if is_current(state, &identity) {
                next.network_error = Some(error);
            }
            vec![]
        }

        Message::AccountsChanged(event) => match state.session.on_accounts_changed(&event) {
            AccountTransition::Reset => {
                tracing::info!("Wallet access revoked, resetting session");
                next = state.reset();
                vec![Effect::ResetTransactions]
            }
            AccountTransition::Reinitialized(session) => {
                tracing::info!(address = ?session.address, "Active account changed");
                let Some(identity) = session.identity() else {
                    return (next, vec![]);
                };
                next.session = session;
                next.transaction = TxPhase::Idle;
                next.transaction_error = None;
                next.last_dog = None;
                next.notice = None;
                next.apply_view(ViewEvent::Connected);
                vec![Effect::ResetTransactions, Effect::EnsureNetwork { identity }]
            }
            AccountTransition::Selected(address) => {
                tracing::info!(address = %address, "Account selected without a session, connecting");
                if !next.wallet_present() {
                    return (next, vec![]);
                }
                next.transaction_error = None;
                vec![Effect::Connect]
            }
            AccountTransition::Unchanged => vec![],
        },

        Message::TransactionPending(tx) => {
            // Only a slot this state is waiting on may advance.
            let awaited = matches!(&state.transaction, TxPhase::Submitting { identity } if *identity == tx.identity);
            if awaited && is_current(state, &tx.identity) {
                next.transaction = TxPhase::Pending(tx);
            }
            vec![]
        }

        Message::TransactionFinished {
            identity,
            attempt,
            outcome,
        } => {
            if is_awaited(state, &identity, attempt) {
                next.transaction = TxPhase::Idle;
                next.transaction_error = outcome.visible_error();
                if let TxOutcome::Confirmed {
                    dog_id: Some(id), ..
                } = &outcome
                {
                    next.notice = Some(format!("Dog registered with id {id}"));
                }
                next.last_outcome = Some(outcome);
            }
            vec![]
        }

        Message::TransactionRejected {
            identity,
            attempt,
            error,
        } => {
            if is_awaited(state, &identity, attempt) {
                next.transaction = TxPhase::Idle;
                if error.is_visible() {
                    next.transaction_error = Some(error);
                }
            }
            vec![]
        }

        Message::DogLoaded { identity, id, result } => {
            if is_current(state, &identity) {
                match result {
                    Ok(record) => {
                        next.last_dog = Some(record);
                        next.notice = None;
                    }
                    Err(err @ PedigreeError::NotFound(_)) => {
                        tracing::debug!(dog_id = %id, "Lookup miss");
                        next.last_dog = None;
                        next.notice = Some(err.to_string());
                    }
                    Err(err) => {
                        next.last_dog = None;
                        next.transaction_error = Some(err);
                    }
                }
            }
            vec![]
        }
    };
    (next, effects)
}

fn is_current(state: &AppState, identity: &SessionIdentity) -> bool {
    let current = state.session.is_current(identity);
    if !current {
        tracing::debug!(stale = %identity, "Discarding result for a previous session");
    }
    current
}

/// Whether a transaction result belongs to the attempt this state waits on.
fn is_awaited(state: &AppState, identity: &SessionIdentity, attempt: u64) -> bool {
    if attempt != state.attempt || state.transaction.is_idle() {
        tracing::debug!(attempt, current = state.attempt, "Discarding result of a superseded attempt");
        return false;
    }
    is_current(state, identity)
}

fn handle_intent(next: &mut AppState, intent: Intent) -> Vec<Effect> {
    match intent {
        Intent::Connect => {
            if !next.wallet_present() {
                next.transaction_error = Some(PedigreeError::NoWalletDetected);
                return vec![];
            }
            if next.session.connected {
                return vec![];
            }
            next.transaction_error = None;
            vec![Effect::Connect]
        }

        Intent::ShowRegister => {
            next.apply_view(ViewEvent::ShowRegister);
            vec![]
        }

        Intent::ShowCheck => {
            next.apply_view(ViewEvent::ShowCheck);
            vec![]
        }

        Intent::Back => {
            next.apply_view(ViewEvent::Back);
            vec![]
        }

        Intent::RegisterDog(form) => {
            next.transaction_error = None;
            match admit_registration(next, &form) {
                Ok((identity, registration)) => {
                    next.transaction = TxPhase::Submitting { identity };
                    vec![Effect::Submit {
                        identity,
                        attempt: next.begin_attempt(),
                        session: next.session.clone(),
                        registration,
                    }]
                }
                Err(err) if err.is_sticky() => {
                    next.network_error = Some(err);
                    vec![]
                }
                Err(err) => {
                    next.transaction_error = Some(err);
                    vec![]
                }
            }
        }

        Intent::CheckDog(id) => {
            let Some(identity) = next.session.identity() else {
                next.transaction_error = Some(PedigreeError::NotConnected);
                return vec![];
            };
            next.notice = None;
            vec![Effect::RetrieveDog { identity, id }]
        }

        Intent::DismissTransactionError => {
            next.transaction_error = None;
            vec![]
        }

        Intent::DismissNetworkError => {
            next.network_error = None;
            vec![]
        }
    }
}

/// Checks that need no network call, in the order they are reported.
fn admit_registration(
    state: &AppState,
    form: &DogForm,
) -> Result<(SessionIdentity, DogRegistration), PedigreeError> {
    let identity = state.session.identity().ok_or(PedigreeError::NotConnected)?;
    if !state.transaction.is_idle() {
        return Err(PedigreeError::AlreadyPending);
    }
    if !state.on_required_chain() {
        return Err(PedigreeError::NetworkMismatch {
            expected: state.required_chain,
            actual: identity.chain_id,
        });
    }
    let registration = DogRegistration::from_form(form)?;
    Ok((identity, registration))
}
