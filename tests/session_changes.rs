//! Account changes racing with in-flight work.

use std::sync::Arc;

use pedigree_pal::app::{Dapp, Intent};
use pedigree_pal::error::PedigreeError;
use pedigree_pal::orchestrator::TxOutcome;
use pedigree_pal::registry::PedigreeClient;
use pedigree_pal::testing::InMemoryRegistry;
use pedigree_pal::types::DogId;
use pedigree_pal::view::ViewState;
use pedigree_pal::wallet::{WalletConnector, WalletSession};

mod common;
use common::{dog_form, rex, within, Harness, ALICE, BOB, HARDHAT};

#[tokio::test]
async fn test_revoked_access_resets_session_and_slot() {
    let harness = Harness::start(HARDHAT);
    harness.connect().await;
    harness.send(Intent::ShowRegister).await;
    harness.registry.hold_receipts(true);
    harness.send(Intent::RegisterDog(rex())).await;
    harness.until(|s| s.transaction.pending().is_some()).await;

    harness.wallet.emit_accounts(vec![]);
    let state = harness.until(|s| !s.session.connected).await;
    assert_eq!(state.session, WalletSession::default());
    assert!(state.transaction.is_idle());
    assert_eq!(state.transaction_error, None);
    assert_eq!(state.view(), ViewState::Disconnected);
    assert!(harness.orchestrator.is_idle());
}

#[tokio::test]
async fn test_account_selected_after_revocation_reconnects() {
    let harness = Harness::start(HARDHAT);
    harness.connect().await;
    harness.wallet.emit_accounts(vec![]);
    harness.until(|s| !s.session.connected).await;

    harness.wallet.emit_accounts(vec![BOB]);
    let state = harness
        .until(|s| s.session.address == Some(BOB) && s.on_required_chain())
        .await;
    assert_eq!(state.session, WalletSession::connected(BOB, HARDHAT));
    assert_eq!(state.view(), ViewState::ConnectedIdle);
    assert_eq!(harness.wallet.account_requests(), 2);

    let state = harness.register(rex()).await;
    assert!(matches!(state.last_outcome, Some(TxOutcome::Confirmed { .. })));
    assert_eq!(state.transaction_error, None);
}

#[tokio::test]
async fn test_switching_back_does_not_revive_old_attempt() {
    let harness = Harness::start(HARDHAT);
    harness.connect().await;
    harness.registry.hold_receipts(true);
    harness.registry.revert_next();

    harness.send(Intent::RegisterDog(rex())).await;
    let state = harness.until(|s| s.transaction.pending().is_some()).await;
    let stale = state.transaction.pending().unwrap().clone();

    harness.wallet.emit_accounts(vec![BOB]);
    harness.until(|s| s.session.address == Some(BOB)).await;
    harness.wallet.emit_accounts(vec![ALICE]);
    harness.until(|s| s.session.address == Some(ALICE)).await;

    harness.send(Intent::RegisterDog(dog_form("Bella", "F", 0, 0))).await;
    let state = harness
        .until(|s| s.transaction.pending().is_some_and(|tx| tx.hash != stale.hash))
        .await;
    let fresh = state.transaction.pending().unwrap().clone();
    assert_eq!(fresh.identity, stale.identity);

    // The first attempt reverts under the same identity as the second.
    harness.registry.release(stale.hash);
    within(async {
        while harness.registry.unmined().contains(&stale.hash) {
            tokio::task::yield_now().await;
        }
    })
    .await;
    harness.send(Intent::ShowCheck).await;
    let state = harness.until(|s| s.view() == ViewState::CheckMode).await;
    assert_eq!(state.transaction.pending().map(|tx| tx.hash), Some(fresh.hash));
    assert_eq!(state.transaction_error, None);
    assert_eq!(state.last_outcome, None);

    harness.registry.release(fresh.hash);
    let state = harness.until(|s| s.last_outcome.is_some()).await;
    assert!(matches!(
        state.last_outcome,
        Some(TxOutcome::Confirmed { hash, .. }) if hash == fresh.hash
    ));
    assert!(harness.orchestrator.is_idle());
}

#[tokio::test]
async fn test_account_switch_discards_stale_confirmation() {
    let harness = Harness::start(HARDHAT);
    harness.connect().await;
    harness.registry.hold_receipts(true);

    harness.send(Intent::RegisterDog(rex())).await;
    let state = harness.until(|s| s.transaction.pending().is_some()).await;
    let stale = state.transaction.pending().unwrap().clone();
    assert_eq!(stale.identity.address, ALICE);

    harness.wallet.emit_accounts(vec![BOB]);
    let state = harness.until(|s| s.session.address == Some(BOB)).await;
    assert!(state.transaction.is_idle());
    assert!(harness.orchestrator.is_idle());

    // The freed slot accepts Bob's registration while Alice's is still in flight.
    harness.send(Intent::RegisterDog(dog_form("Bella", "F", 0, 0))).await;
    let state = harness
        .until(|s| s.transaction.pending().is_some_and(|tx| tx.hash != stale.hash))
        .await;
    let fresh = state.transaction.pending().unwrap().clone();
    assert_eq!(fresh.identity.address, BOB);
    assert_eq!(harness.registry.submissions(), 2);

    // Alice's transaction is mined; its result must not touch Bob's session.
    harness.registry.release(stale.hash);
    within(async {
        while harness.registry.unmined().contains(&stale.hash) {
            tokio::task::yield_now().await;
        }
    })
    .await;
    harness.send(Intent::CheckDog(DogId(1))).await;
    let state = harness.until(|s| s.last_dog.is_some()).await;
    assert_eq!(state.last_dog.as_ref().map(|dog| dog.name.as_str()), Some("Rex"));
    assert_eq!(state.last_outcome, None);
    assert_eq!(state.transaction_error, None);
    assert_eq!(state.transaction.pending().map(|tx| tx.hash), Some(fresh.hash));

    harness.registry.release(fresh.hash);
    let state = harness.until(|s| s.last_outcome.is_some()).await;
    assert!(matches!(
        state.last_outcome,
        Some(TxOutcome::Confirmed { hash, dog_id: Some(DogId(2)), .. }) if hash == fresh.hash
    ));
    assert!(harness.orchestrator.is_idle());
}

#[tokio::test]
async fn test_repeated_account_notification_is_ignored() {
    let harness = Harness::start(HARDHAT);
    harness.connect().await;
    harness.registry.hold_receipts(true);
    harness.send(Intent::RegisterDog(rex())).await;
    let pending = harness.until(|s| s.transaction.pending().is_some()).await;

    harness.wallet.emit_accounts(vec![ALICE]);
    harness.send(Intent::ShowCheck).await;
    let state = harness.until(|s| s.view() == ViewState::CheckMode).await;
    assert_eq!(state.transaction, pending.transaction);
    assert!(!harness.orchestrator.is_idle());
}

#[tokio::test]
async fn test_missing_wallet() {
    let client = PedigreeClient::new(Arc::new(InMemoryRegistry::new()), true);
    let handle = Dapp::new(HARDHAT, WalletConnector::new(None), client).spawn();
    assert_eq!(handle.state().view(), ViewState::NoWallet);

    assert!(handle.dispatch(Intent::Connect).await);
    let state = within(handle.wait_for(|s| s.transaction_error.is_some()))
        .await
        .unwrap();
    assert_eq!(state.transaction_error, Some(PedigreeError::NoWalletDetected));
    assert_eq!(state.view(), ViewState::NoWallet);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_cancelled_connect_stays_disconnected() {
    let harness = Harness::start(HARDHAT);
    harness.wallet.reject_account_requests(true);
    harness.send(Intent::Connect).await;
    within(async {
        while harness.wallet.account_requests() == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await;

    harness.wallet.reject_account_requests(false);
    let state = harness.connect().await;
    assert_eq!(state.transaction_error, None);
    assert_eq!(harness.wallet.account_requests(), 2);
}
