mod common;

use std::rc::Rc;

use serde_json::json;
use tokio::task::LocalSet;

use wallet_link_core::{
    ConnectionStatus, ErrorClass, ManagerConfig, ProviderEventKind, SessionStore, WalletError,
    MOONBASE_ALPHA, MOONBEAM, MOONRIVER,
};

use common::{account_a, account_b, config, harness, installed_wallet, reasons, Harness};

async fn connected_on_moonbeam() -> (Harness, wallet_link_adapters::Eip1193Provider) {
    let (wallet, provider) = installed_wallet("Acme", "acme");
    let h = harness(vec![wallet], config("Acme", MOONBEAM));
    h.manager.connect(None).await.expect("connect acme");
    assert_eq!(h.manager.chain_id(), Some(MOONBEAM));
    (h, provider)
}

/// Yields to the local executor until `done` holds or the budget runs out.
async fn settle(mut done: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if done() {
            return true;
        }
        tokio::task::yield_now().await;
    }
    done()
}

fn updates(h: &Harness) -> usize {
    reasons(&h.manager)
        .into_iter()
        .filter(|r| *r == "provider_update")
        .count()
}

#[tokio::test]
async fn chain_changed_updates_only_the_chain() {
    let (h, provider) = connected_on_moonbeam().await;
    let before = h.manager.snapshot();

    provider
        .debug_inject_chain_changed(MOONBASE_ALPHA)
        .expect("inject chain");
    let processed = h.manager.process_events().await.expect("process events");

    let after = h.manager.snapshot();
    assert_eq!(processed, 1);
    assert_eq!(after.chain_id, Some(MOONBASE_ALPHA));
    assert_eq!(after.address, before.address);
    assert_eq!(after.connected_wallet_name, before.connected_wallet_name);
    assert_eq!(after.status, ConnectionStatus::Connected);
    assert_eq!(updates(&h), 1);
}

#[tokio::test]
async fn switch_then_matching_event_updates_once() {
    let (h, _provider) = connected_on_moonbeam().await;

    h.manager
        .switch_chain(MOONRIVER)
        .await
        .expect("switch to moonriver");
    assert_eq!(h.manager.chain_id(), Some(MOONRIVER));
    let revision = h.manager.snapshot().revision;

    // the wallet's own chainChanged notification is still queued
    let processed = h.manager.process_events().await.expect("process events");

    assert_eq!(processed, 1);
    assert_eq!(h.manager.chain_id(), Some(MOONRIVER));
    assert_eq!(h.manager.snapshot().revision, revision);
    assert_eq!(updates(&h), 1);
}

#[tokio::test]
async fn unconfirmed_chain_change_forces_disconnect() {
    let (h, provider) = connected_on_moonbeam().await;

    provider
        .dispatch_event(ProviderEventKind::ChainChanged, json!("0x505"))
        .expect("dispatch");
    let err = h
        .manager
        .process_events()
        .await
        .expect_err("chain not confirmed");

    assert_eq!(
        err,
        WalletError::NetworkMismatch {
            reported: MOONRIVER,
            confirmed: Some(MOONBEAM),
        }
    );
    assert_eq!(err.class(), ErrorClass::NetworkMismatch);
    assert_eq!(h.manager.status(), ConnectionStatus::Idle);
    assert_eq!(h.manager.address(), None);
    assert_eq!(h.manager.last_error(), Some(err));
    assert_eq!(h.store.load().expect("load session"), None);
    assert_eq!(provider.listener_count(), 0);
}

#[tokio::test]
async fn accounts_changed_moves_to_new_primary_account() {
    let (h, provider) = connected_on_moonbeam().await;

    provider
        .debug_inject_accounts_changed(vec![account_b(), account_a()])
        .expect("inject accounts");
    h.manager.process_events().await.expect("process events");

    assert_eq!(h.manager.address(), Some(account_b()));
    assert_eq!(h.manager.chain_id(), Some(MOONBEAM));
    assert!(h.manager.is_connected());
}

#[tokio::test]
async fn same_account_notification_is_a_no_op() {
    let (h, provider) = connected_on_moonbeam().await;
    let revision = h.manager.snapshot().revision;

    provider
        .debug_inject_accounts_changed(vec![account_a()])
        .expect("inject accounts");
    h.manager.process_events().await.expect("process events");

    assert_eq!(h.manager.snapshot().revision, revision);
}

#[tokio::test]
async fn empty_accounts_tear_the_connection_down() {
    let (h, provider) = connected_on_moonbeam().await;

    provider
        .debug_inject_accounts_changed(Vec::new())
        .expect("inject accounts");
    h.manager.process_events().await.expect("process events");

    assert_eq!(h.manager.status(), ConnectionStatus::Idle);
    assert_eq!(h.manager.connected_wallet_name(), None);
    assert_eq!(h.manager.last_error(), None);
    assert_eq!(h.store.load().expect("load session"), None);
    assert_eq!(provider.listener_count(), 0);
}

#[tokio::test]
async fn provider_disconnect_tears_the_connection_down() {
    let (h, provider) = connected_on_moonbeam().await;

    provider.debug_inject_disconnect().expect("inject disconnect");
    h.manager.process_events().await.expect("process events");

    assert_eq!(h.manager.status(), ConnectionStatus::Idle);
    assert_eq!(h.store.load().expect("load session"), None);
    assert_eq!(reasons(&h.manager).last().copied(), Some("teardown"));
}

#[tokio::test]
async fn events_are_applied_in_arrival_order() {
    let (h, provider) = connected_on_moonbeam().await;

    provider
        .debug_inject_accounts_changed(vec![account_b()])
        .expect("inject accounts");
    provider
        .debug_inject_chain_changed(MOONRIVER)
        .expect("inject chain");
    provider
        .debug_inject_accounts_changed(vec![account_a()])
        .expect("inject accounts");
    let processed = h.manager.process_events().await.expect("process events");

    assert_eq!(processed, 3);
    assert_eq!(h.manager.address(), Some(account_a()));
    assert_eq!(h.manager.chain_id(), Some(MOONRIVER));
    assert_eq!(updates(&h), 3);
}

#[tokio::test]
async fn malformed_payloads_are_dropped() {
    let (h, provider) = connected_on_moonbeam().await;
    let before = h.manager.snapshot();

    provider
        .dispatch_event(ProviderEventKind::AccountsChanged, json!("not-a-list"))
        .expect("dispatch accounts");
    provider
        .dispatch_event(ProviderEventKind::ChainChanged, json!({ "chain": 1 }))
        .expect("dispatch chain");
    let processed = h.manager.process_events().await.expect("process events");

    assert_eq!(processed, 2);
    assert_eq!(h.manager.snapshot(), before);
}

#[tokio::test]
async fn events_after_disconnect_are_never_seen() {
    let (h, provider) = connected_on_moonbeam().await;
    provider
        .debug_inject_accounts_changed(vec![account_b()])
        .expect("inject accounts");

    h.manager.disconnect().await.expect("disconnect");
    provider
        .debug_inject_chain_changed(MOONRIVER)
        .expect("inject chain");

    assert_eq!(h.manager.process_events().await.expect("process events"), 0);
    assert_eq!(h.manager.status(), ConnectionStatus::Idle);
    assert_eq!(h.manager.address(), None);
}

#[tokio::test]
async fn restored_session_receives_events() {
    let (wallet, provider) = installed_wallet("Acme", "acme");
    provider.debug_set_authorized(true).expect("authorize");
    let h = common::harness_with_store(
        vec![wallet],
        config("Acme", MOONBASE_ALPHA),
        wallet_link_adapters::MemorySessionStore::with_session("Acme"),
    );
    assert!(h.manager.restore().await.expect("restore"));

    provider
        .debug_inject_chain_changed(MOONBASE_ALPHA)
        .expect("inject chain");
    h.manager.process_events().await.expect("process events");

    assert_eq!(h.manager.chain_id(), Some(MOONBASE_ALPHA));
}

#[tokio::test]
async fn event_loop_applies_wallet_changes_without_polling() {
    let (h, provider) = connected_on_moonbeam().await;
    let Harness { manager, store, .. } = h;
    let manager = Rc::new(manager);

    LocalSet::new()
        .run_until(async {
            let driver = tokio::task::spawn_local({
                let manager = Rc::clone(&manager);
                async move { manager.run_events().await }
            });

            provider
                .debug_inject_accounts_changed(vec![account_b()])
                .expect("inject accounts");
            assert!(settle(|| manager.address() == Some(account_b())).await);

            provider.debug_inject_disconnect().expect("inject disconnect");
            assert!(settle(|| manager.status() == ConnectionStatus::Idle).await);
            assert_eq!(manager.address(), None);
            assert_eq!(store.load().expect("load session"), None);
            assert_eq!(provider.listener_count(), 0);

            manager.shutdown();
            driver.await.expect("event loop stopped");
        })
        .await;
}

#[tokio::test]
async fn event_loop_started_while_idle_follows_the_next_connection() {
    let (wallet, provider) = installed_wallet("Acme", "acme");
    let manager = Rc::new(harness(vec![wallet], config("Acme", MOONBEAM)).manager);

    LocalSet::new()
        .run_until(async {
            let driver = tokio::task::spawn_local({
                let manager = Rc::clone(&manager);
                async move { manager.run_events().await }
            });
            tokio::task::yield_now().await;

            manager.connect(None).await.expect("connect acme");
            provider
                .debug_inject_chain_changed(MOONRIVER)
                .expect("inject chain");
            assert!(settle(|| manager.chain_id() == Some(MOONRIVER)).await);
            assert!(manager.is_connected());

            manager.shutdown();
            driver.await.expect("event loop stopped");
        })
        .await;
}

#[tokio::test]
async fn transition_history_keeps_only_recent_records() {
    let (wallet, provider) = installed_wallet("Acme", "acme");
    let h = harness(
        vec![wallet],
        ManagerConfig {
            transition_history: 3,
            ..config("Acme", MOONBEAM)
        },
    );
    h.manager.connect(None).await.expect("connect acme");

    for account in [account_b(), account_a(), account_b()] {
        provider
            .debug_inject_accounts_changed(vec![account])
            .expect("inject accounts");
    }
    assert_eq!(h.manager.process_events().await.expect("process events"), 3);

    assert_eq!(reasons(&h.manager), vec!["provider_update"; 3]);
    assert_eq!(h.manager.snapshot().revision, 5);
}
