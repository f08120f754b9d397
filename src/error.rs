//! Error taxonomy.
//!
//! Wallet and registry collaborators fail with [`ProviderError`], the EIP-1193
//! shaped error a signing agent or JSON-RPC node reports. It is classified
//! exactly once, by the `From<ProviderError>` conversion below, into the closed
//! [`PedigreeError`] set the rest of the crate matches on.

use alloy::primitives::TxHash;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ChainId, DogId, Parent};

/// EIP-1193: the user rejected the request.
pub const USER_REJECTED_REQUEST: i64 = 4001;

/// EIP-3326: the wallet does not know the requested chain.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

/// JSON-RPC internal error, used for failures without a code of their own.
pub const INTERNAL_ERROR: i64 = -32603;

/// Error reported by a signing agent or a JSON-RPC node.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message} (code {code})")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
    /// Structured payload; nodes such as Hardhat put the revert reason here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ProviderErrorData>,
}

/// Structured `data` member of a provider error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProviderErrorData {
    #[serde(default)]
    pub message: Option<String>,
}

/// Classification of a [`ProviderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    UserRejected,
    UnrecognizedChain,
    Other,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(USER_REJECTED_REQUEST, "User rejected the request.")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    pub fn with_data_message(mut self, message: impl Into<String>) -> Self {
        self.data = Some(ProviderErrorData {
            message: Some(message.into()),
        });
        self
    }

    pub fn kind(&self) -> ProviderErrorKind {
        match self.code {
            USER_REJECTED_REQUEST => ProviderErrorKind::UserRejected,
            UNRECOGNIZED_CHAIN => ProviderErrorKind::UnrecognizedChain,
            _ => ProviderErrorKind::Other,
        }
    }

    /// Human readable message, preferring the structured `data.message`.
    pub fn display_message(&self) -> &str {
        self.data
            .as_ref()
            .and_then(|data| data.message.as_deref())
            .unwrap_or(&self.message)
    }
}

/// Client-side input or pedigree violations. Never reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid value for `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("{parent} id {id} is the id of the dog itself")]
    SelfReference { parent: Parent, id: DogId },

    #[error("{parent} id {id} is not a registered dog")]
    UnknownParent { parent: Parent, id: DogId },

    #[error("pedigree of dog {0} contains a cycle")]
    Cycle(DogId),
}

/// Every failure the orchestration layer surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PedigreeError {
    #[error("No Ethereum wallet was detected. Please install a wallet.")]
    NoWalletDetected,

    /// Normal abandonment path; never shown to the user.
    #[error("Request cancelled by the user")]
    UserCancelled,

    #[error("Please connect your wallet to chain {expected} (currently on {actual})")]
    NetworkMismatch { expected: ChainId, actual: ChainId },

    #[error("Could not switch the wallet to chain {chain_id}: {reason}")]
    NetworkSwitchFailed { chain_id: ChainId, reason: String },

    /// The transaction was mined but reverted; the reason is not recoverable.
    #[error("Transaction {hash} failed")]
    ExecutionFailed { hash: TxHash },

    #[error("{0}")]
    Rpc(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No dog is registered with id {0}")]
    NotFound(DogId),

    #[error("A transaction is already pending")]
    AlreadyPending,

    #[error("Wallet is not connected")]
    NotConnected,
}

impl PedigreeError {
    /// Whether the error belongs in the visible error field.
    pub fn is_visible(&self) -> bool {
        !matches!(self, PedigreeError::UserCancelled)
    }

    /// Network errors stay visible until explicitly dismissed.
    pub fn is_sticky(&self) -> bool {
        matches!(
            self,
            PedigreeError::NetworkMismatch { .. } | PedigreeError::NetworkSwitchFailed { .. }
        )
    }
}

impl From<ProviderError> for PedigreeError {
    fn from(err: ProviderError) -> Self {
        match err.kind() {
            ProviderErrorKind::UserRejected => PedigreeError::UserCancelled,
            ProviderErrorKind::UnrecognizedChain | ProviderErrorKind::Other => {
                PedigreeError::Rpc(err.display_message().to_string())
            }
        }
    }
}

/// Result type for orchestration operations.
pub type PedigreeResult<T> = Result<T, PedigreeError>;
