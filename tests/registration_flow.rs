//! End-to-end flows through the runtime with in-memory collaborators.

use pedigree_pal::app::Intent;
use pedigree_pal::error::{PedigreeError, ProviderError, ValidationError};
use pedigree_pal::orchestrator::{TxOutcome, TxPhase};
use pedigree_pal::types::{DogId, Parent};
use pedigree_pal::view::ViewState;

mod common;
use common::{dog_form, rex, Harness, HARDHAT, MAINNET};

#[tokio::test]
async fn test_wrong_network_is_switched_once() {
    let harness = Harness::start(MAINNET);

    let state = harness.connect().await;
    assert_eq!(state.session.chain_id, Some(HARDHAT));
    assert_eq!(harness.wallet.switch_requests(), 1);
    assert_eq!(harness.wallet.current_chain(), HARDHAT);
    assert_eq!(state.network_error, None);
    assert_eq!(state.view(), ViewState::ConnectedIdle);
}

#[tokio::test]
async fn test_no_switch_when_already_on_network() {
    let harness = Harness::start(HARDHAT);
    harness.connect().await;
    assert_eq!(harness.wallet.switch_requests(), 0);
}

#[tokio::test]
async fn test_rejected_switch_blocks_registration() {
    let harness = Harness::start(MAINNET);
    harness.wallet.reject_chain_switches(true);

    harness.send(Intent::Connect).await;
    let state = harness.until(|s| s.network_error.is_some()).await;
    assert!(matches!(
        state.network_error,
        Some(PedigreeError::NetworkSwitchFailed { chain_id, .. }) if chain_id == HARDHAT
    ));
    assert_eq!(harness.wallet.switch_requests(), 1);

    harness.send(Intent::DismissNetworkError).await;
    harness.until(|s| s.network_error.is_none()).await;
    harness.send(Intent::RegisterDog(rex())).await;
    let state = harness.until(|s| s.network_error.is_some()).await;
    assert_eq!(
        state.network_error,
        Some(PedigreeError::NetworkMismatch {
            expected: HARDHAT,
            actual: MAINNET
        })
    );
    assert_eq!(harness.registry.submissions(), 0);
    assert_eq!(harness.wallet.switch_requests(), 1);
}

#[tokio::test]
async fn test_registration_confirms() {
    let harness = Harness::start(HARDHAT);
    harness.connect().await;
    harness.registry.hold_receipts(true);

    harness.send(Intent::RegisterDog(rex())).await;
    let state = harness.until(|s| s.transaction.pending().is_some()).await;
    let hash = state.transaction.pending().unwrap().hash;
    assert!(matches!(harness.orchestrator.phase(), TxPhase::Pending(tx) if tx.hash == hash));

    harness.registry.release(hash);
    let state = harness.until(|s| s.last_outcome.is_some()).await;
    assert!(state.transaction.is_idle());
    assert!(harness.orchestrator.is_idle());
    assert_eq!(state.transaction_error, None);
    assert_eq!(
        state.last_outcome,
        Some(TxOutcome::Confirmed {
            hash,
            block_number: Some(1),
            dog_id: Some(DogId(1))
        })
    );
    assert_eq!(state.notice.as_deref(), Some("Dog registered with id 1"));
}

#[tokio::test]
async fn test_declined_signature_leaves_no_error() {
    let harness = Harness::start(HARDHAT);
    harness.connect().await;
    harness.registry.fail_next_submission(ProviderError::user_rejected());

    let state = harness.register(rex()).await;
    assert_eq!(state.last_outcome, Some(TxOutcome::UserCancelled));
    assert_eq!(state.transaction_error, None);
    assert!(harness.orchestrator.is_idle());
}

#[tokio::test]
async fn test_reverted_registration_reports_failure() {
    let harness = Harness::start(HARDHAT);
    harness.connect().await;
    harness.registry.revert_next();

    let state = harness.register(rex()).await;
    let Some(TxOutcome::ExecutionFailed { hash }) = state.last_outcome else {
        panic!("unexpected outcome {:?}", state.last_outcome);
    };
    assert_eq!(state.transaction_error, Some(PedigreeError::ExecutionFailed { hash }));

    // The next attempt starts from a clean error field.
    let state = harness.register(rex()).await;
    assert!(matches!(state.last_outcome, Some(TxOutcome::Confirmed { .. })));
    assert_eq!(state.transaction_error, None);
}

#[tokio::test]
async fn test_missing_dog_is_a_notice() {
    let harness = Harness::start(HARDHAT);
    harness.connect().await;
    harness.send(Intent::ShowCheck).await;

    harness.send(Intent::CheckDog(DogId(5))).await;
    let state = harness.until(|s| s.notice.is_some()).await;
    assert_eq!(state.notice.as_deref(), Some("No dog is registered with id 5"));
    assert_eq!(state.transaction_error, None);
    assert_eq!(state.last_dog, None);
    assert_eq!(state.view(), ViewState::CheckMode);
}

#[tokio::test]
async fn test_registered_dog_can_be_checked() {
    let harness = Harness::start(HARDHAT);
    harness.connect().await;
    harness.register(rex()).await;

    harness.send(Intent::CheckDog(DogId(1))).await;
    let state = harness.until(|s| s.last_dog.is_some()).await;
    let dog = state.last_dog.unwrap();
    assert_eq!(dog.name, "Rex");
    assert_eq!(dog.mother_id, None);
}

#[tokio::test]
async fn test_second_submission_while_pending() {
    let harness = Harness::start(HARDHAT);
    harness.connect().await;
    harness.registry.hold_receipts(true);

    harness.send(Intent::RegisterDog(rex())).await;
    let state = harness.until(|s| s.transaction.pending().is_some()).await;
    let hash = state.transaction.pending().unwrap().hash;

    harness.send(Intent::RegisterDog(dog_form("Bella", "F", 0, 0))).await;
    let state = harness.until(|s| s.transaction_error.is_some()).await;
    assert_eq!(state.transaction_error, Some(PedigreeError::AlreadyPending));
    assert_eq!(state.transaction.pending().map(|tx| tx.hash), Some(hash));
    assert_eq!(harness.registry.submissions(), 1);

    harness.registry.release(hash);
    let state = harness.until(|s| s.last_outcome.is_some()).await;
    assert!(matches!(state.last_outcome, Some(TxOutcome::Confirmed { .. })));
}

#[tokio::test]
async fn test_own_id_as_parent_rejected_before_submission() {
    let harness = Harness::start(HARDHAT);
    harness.connect().await;
    harness.register(dog_form("Bella", "F", 0, 0)).await;
    assert_eq!(harness.registry.submissions(), 1);

    // Rex would become #2.
    let state = harness.register(dog_form("Rex", "M", 2, 0)).await;
    assert_eq!(
        state.transaction_error,
        Some(PedigreeError::Validation(ValidationError::SelfReference {
            parent: Parent::Mother,
            id: DogId(2)
        }))
    );
    assert_eq!(harness.registry.submissions(), 1);
    assert!(harness.orchestrator.is_idle());
}

#[tokio::test]
async fn test_pedigree_stays_acyclic() {
    let harness = Harness::start(HARDHAT);
    harness.connect().await;
    harness.register(dog_form("Bella", "F", 0, 0)).await;
    harness.register(dog_form("Max", "M", 0, 0)).await;
    harness.register(dog_form("Rex", "M", 1, 2)).await;
    // Forward reference to an id nobody holds yet.
    let state = harness.register(dog_form("Luna", "F", 9, 3)).await;
    assert!(matches!(
        state.transaction_error,
        Some(PedigreeError::Validation(ValidationError::UnknownParent { .. }))
    ));

    let graph = harness.registry.graph();
    assert_eq!(graph.len(), 3);
    assert!(graph.validate().is_ok());
}

#[tokio::test]
async fn test_invalid_form_never_submits() {
    let harness = Harness::start(HARDHAT);
    harness.connect().await;

    let state = harness.register(dog_form("Rex", "X", 0, 0)).await;
    assert!(matches!(
        state.transaction_error,
        Some(PedigreeError::Validation(ValidationError::InvalidField { field: "sex", .. }))
    ));
    assert_eq!(harness.registry.submissions(), 0);
}
