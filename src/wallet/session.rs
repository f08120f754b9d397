//! Wallet session snapshot and its transitions.

use alloy::primitives::Address;

use crate::types::{ChainId, SessionIdentity};
use crate::wallet::provider::AccountsChanged;

/// Connection state between this client and the signing agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSession {
    pub address: Option<Address>,
    pub chain_id: Option<ChainId>,
    pub connected: bool,
}

/// Result of applying an account-change notification to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountTransition {
    /// Access revoked: tear the session down to its initial state.
    Reset,
    /// A different account is now active on a connected session.
    Reinitialized(WalletSession),
    /// An account appeared while no session was established; connect from scratch.
    Selected(Address),
    /// The notification repeats the active account.
    Unchanged,
}

impl WalletSession {
    /// A freshly connected session.
    pub fn connected(address: Address, chain_id: ChainId) -> Self {
        Self {
            address: Some(address),
            chain_id: Some(chain_id),
            connected: true,
        }
    }

    pub fn identity(&self) -> Option<SessionIdentity> {
        match (self.connected, self.address, self.chain_id) {
            (true, Some(address), Some(chain_id)) => Some(SessionIdentity { address, chain_id }),
            _ => None,
        }
    }

    /// Whether work dispatched under `identity` may still touch this session.
    pub fn is_current(&self, identity: &SessionIdentity) -> bool {
        self.identity().as_ref() == Some(identity)
    }

    pub fn is_on(&self, chain_id: ChainId) -> bool {
        self.chain_id == Some(chain_id)
    }

    pub fn with_chain(&self, chain_id: ChainId) -> Self {
        Self {
            chain_id: Some(chain_id),
            ..self.clone()
        }
    }

    pub fn on_accounts_changed(&self, event: &AccountsChanged) -> AccountTransition {
        match (event.primary(), self.identity()) {
            (None, _) => AccountTransition::Reset,
            (Some(address), None) => AccountTransition::Selected(address),
            (Some(address), Some(identity)) if identity.address == address => AccountTransition::Unchanged,
            (Some(address), Some(identity)) => {
                AccountTransition::Reinitialized(Self::connected(address, identity.chain_id))
            }
        }
    }
}
