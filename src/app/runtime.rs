//! Event loop driving [`update`] on Tokio.

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};

use crate::app::message::{Effect, Intent, Message};
use crate::app::state::AppState;
use crate::app::update::update;
use crate::orchestrator::{TransactionOrchestrator, TxPhase};
use crate::registry::PedigreeClient;
use crate::types::ChainId;
use crate::wallet::{AccountsChanged, WalletConnector};

const INTENT_BUFFER: usize = 32;

/// The application: wallet connector, registry client and transaction slot.
#[derive(Clone, Debug)]
pub struct Dapp {
    required_chain: ChainId,
    connector: WalletConnector,
    client: PedigreeClient,
    orchestrator: TransactionOrchestrator,
}

/// One turn of the loop.
enum Input {
    Message(Message),
    AccountsClosed,
    Idle,
    Shutdown,
}

impl Dapp {
    pub fn new(required_chain: ChainId, connector: WalletConnector, client: PedigreeClient) -> Self {
        Self {
            required_chain,
            connector,
            client,
            orchestrator: TransactionOrchestrator::new(),
        }
    }

    pub fn orchestrator(&self) -> &TransactionOrchestrator {
        &self.orchestrator
    }

    /// Start the loop. It stops once every [`DappHandle`] is gone.
    pub fn spawn(self) -> DappHandle {
        let initial = AppState::new(self.required_chain, self.connector.is_available());
        let (intent_tx, intent_rx) = mpsc::channel(INTENT_BUFFER);
        let (state_tx, state_rx) = watch::channel(initial.clone());

        let task = tokio::spawn(self.run(initial, intent_rx, state_tx));
        DappHandle {
            intents: intent_tx,
            state: state_rx,
            task,
        }
    }

    async fn run(
        self,
        mut state: AppState,
        mut intents: mpsc::Receiver<Intent>,
        state_tx: watch::Sender<AppState>,
    ) {
        tracing::info!(required_chain = %self.required_chain, "Dapp runtime started");

        let mut effects: JoinSet<Message> = JoinSet::new();
        let mut accounts: Option<broadcast::Receiver<AccountsChanged>> = None;
        let mut phases = self.orchestrator.subscribe();

        loop {
            let input = tokio::select! {
                intent = intents.recv() => match intent {
                    Some(intent) => Input::Message(intent.into()),
                    None => Input::Shutdown,
                },
                Some(joined) = effects.join_next(), if !effects.is_empty() => match joined {
                    Ok(message) => Input::Message(message),
                    Err(err) => {
                        tracing::error!(error = %err, "Effect task failed");
                        Input::Idle
                    }
                },
                event = next_accounts(&mut accounts) => match event {
                    Ok(event) => Input::Message(Message::AccountsChanged(event)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Missed account notifications");
                        Input::Idle
                    }
                    Err(broadcast::error::RecvError::Closed) => Input::AccountsClosed,
                },
                Ok(()) = phases.changed() => match phases.borrow_and_update().clone() {
                    TxPhase::Pending(tx) => Input::Message(Message::TransactionPending(tx)),
                    _ => Input::Idle,
                },
            };

            let message = match input {
                Input::Message(message) => message,
                Input::AccountsClosed => {
                    tracing::warn!("Account notifications closed");
                    accounts = None;
                    continue;
                }
                Input::Idle => continue,
                Input::Shutdown => break,
            };

            let (next, produced) = update(&state, message);
            state = next;

            if accounts.is_none() && state.session.connected {
                accounts = self.connector.subscribe();
            }
            for effect in produced {
                self.dispatch(effect, &mut effects);
            }
            state_tx.send_replace(state.clone());
        }

        effects.abort_all();
        tracing::info!("Dapp runtime stopped");
    }

    fn dispatch(&self, effect: Effect, effects: &mut JoinSet<Message>) {
        match effect {
            Effect::ResetTransactions => self.orchestrator.reset(),

            Effect::Connect => {
                let connector = self.connector.clone();
                effects.spawn(async move {
                    match connector.connect().await {
                        Ok(session) => Message::Connected(session),
                        Err(err) => Message::ConnectFailed(err),
                    }
                });
            }

            Effect::EnsureNetwork { identity } => {
                let connector = self.connector.clone();
                let required = self.required_chain;
                effects.spawn(async move {
                    match connector.ensure_network(required).await {
                        Ok(status) => Message::NetworkReady {
                            identity,
                            chain_id: status.chain_id(),
                        },
                        Err(error) => Message::NetworkSwitchFailed { identity, error },
                    }
                });
            }

            Effect::Submit {
                identity,
                attempt,
                session,
                registration,
            } => {
                let client = self.client.clone();
                let orchestrator = self.orchestrator.clone();
                effects.spawn(async move {
                    let result = orchestrator
                        .submit(identity, || async {
                            client.register_dog(&session, &registration).await
                        })
                        .await;
                    match result {
                        Ok(outcome) => Message::TransactionFinished {
                            identity,
                            attempt,
                            outcome,
                        },
                        Err(error) => Message::TransactionRejected {
                            identity,
                            attempt,
                            error,
                        },
                    }
                });
            }

            Effect::RetrieveDog { identity, id } => {
                let client = self.client.clone();
                effects.spawn(async move {
                    let result = client.retrieve_dog(id).await;
                    Message::DogLoaded { identity, id, result }
                });
            }
        }
    }
}

async fn next_accounts(
    accounts: &mut Option<broadcast::Receiver<AccountsChanged>>,
) -> Result<AccountsChanged, broadcast::error::RecvError> {
    match accounts {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Front-end side of a running [`Dapp`].
pub struct DappHandle {
    intents: mpsc::Sender<Intent>,
    state: watch::Receiver<AppState>,
    task: JoinHandle<()>,
}

impl DappHandle {
    /// Queue an intent. Returns `false` if the runtime has stopped.
    pub async fn dispatch(&self, intent: Intent) -> bool {
        match self.intents.send(intent).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(intent = ?err.0, "Dapp runtime is not running");
                false
            }
        }
    }

    /// Latest snapshot.
    pub fn state(&self) -> AppState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.clone()
    }

    /// Wait for the first snapshot matching `predicate`; `None` if the runtime stopped.
    pub async fn wait_for(&self, predicate: impl FnMut(&AppState) -> bool) -> Option<AppState> {
        let mut state = self.state.clone();
        let snapshot = state.wait_for(predicate).await.ok()?.clone();
        Some(snapshot)
    }

    /// Stop the loop and wait for it to finish.
    pub async fn shutdown(self) {
        drop(self.intents);
        if let Err(err) = self.task.await {
            tracing::error!(error = %err, "Dapp runtime panicked");
        }
    }
}
