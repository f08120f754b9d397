//! Map submission and confirmation failures onto [`TxOutcome`].

use alloy::primitives::TxHash;

use crate::error::{PedigreeError, PedigreeResult, ProviderError};
use crate::orchestrator::transaction::TxOutcome;
use crate::registry::TxReceipt;

/// Classify an error raised before a hash was known.
///
/// Signer rejections and node errors become outcomes. Anything raised
/// locally, such as a validation failure, is handed back unchanged.
pub fn submission_failure(err: PedigreeError) -> PedigreeResult<TxOutcome> {
    match err {
        PedigreeError::UserCancelled => {
            tracing::debug!("Transaction cancelled by the user");
            Ok(TxOutcome::UserCancelled)
        }
        PedigreeError::Rpc(message) => {
            tracing::error!(error = %message, "Transaction submission failed");
            Ok(TxOutcome::RpcError { message })
        }
        other => Err(other),
    }
}

/// Classify a mined receipt.
pub fn receipt_outcome(receipt: &TxReceipt) -> TxOutcome {
    if receipt.success {
        tracing::info!(
            tx_hash = %receipt.hash,
            block = ?receipt.block_number,
            dog_id = ?receipt.registered_id,
            "Transaction confirmed"
        );
        TxOutcome::Confirmed {
            hash: receipt.hash,
            block_number: receipt.block_number,
            dog_id: receipt.registered_id,
        }
    } else {
        tracing::error!(tx_hash = %receipt.hash, "Transaction reverted");
        TxOutcome::ExecutionFailed { hash: receipt.hash }
    }
}

/// Classify a failure while waiting for the receipt of `hash`.
pub fn confirmation_failure(hash: TxHash, err: ProviderError) -> TxOutcome {
    match PedigreeError::from(err) {
        PedigreeError::UserCancelled => TxOutcome::UserCancelled,
        other => {
            tracing::error!(tx_hash = %hash, error = %other, "Waiting for receipt failed");
            TxOutcome::RpcError {
                message: other.to_string(),
            }
        }
    }
}
