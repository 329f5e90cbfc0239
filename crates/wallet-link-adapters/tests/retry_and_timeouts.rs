mod common;

use std::time::Duration;

use wallet_link_adapters::{ApprovalMode, SwitchSupport};
use wallet_link_core::{
    rpc_codes, ConnectionStatus, ErrorClass, ProviderError, SessionStore, WalletError, MOONBEAM,
};

use common::{acme, reasons};

fn internal_error() -> ProviderError {
    ProviderError::rpc(rpc_codes::INTERNAL, "internal error")
}

#[tokio::test(start_paused = true)]
async fn transient_failures_retry_with_backoff() {
    let (h, provider) = acme();
    for _ in 0..2 {
        provider
            .debug_fail_next("eth_requestAccounts", internal_error())
            .expect("script failure");
    }

    h.manager.connect(Some("Acme")).await.expect("connect after retries");

    assert!(h.manager.is_connected());
    assert_eq!(h.timer.delays(), vec![500, 1_000]);
    assert_eq!(h.manager.snapshot().attempt_count, 3);
    assert_eq!(provider.prompt_count(), 3);
    assert_eq!(
        reasons(&h.manager),
        vec![
            "connect_requested",
            "transient_retry",
            "transient_retry",
            "wallet_approved"
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_settle_in_error_with_last_cause() {
    let (h, provider) = acme();
    for _ in 0..3 {
        provider
            .debug_fail_next("eth_requestAccounts", internal_error())
            .expect("script failure");
    }

    let err = h
        .manager
        .connect(Some("Acme"))
        .await
        .expect_err("retries exhausted");

    assert_eq!(err.class(), ErrorClass::Transient);
    assert_eq!(h.manager.status(), ConnectionStatus::Error);
    assert_eq!(h.manager.last_error(), Some(err));
    assert_eq!(h.manager.snapshot().attempt_count, 3);
    assert_eq!(h.timer.delays(), vec![500, 1_000]);
    assert_eq!(provider.prompt_count(), 3);
    assert_eq!(provider.listener_count(), 0);
    assert_eq!(h.store.load().expect("load session"), None);
}

#[tokio::test(start_paused = true)]
async fn user_rejection_is_never_retried() {
    let (h, provider) = acme();
    provider
        .debug_set_approval(ApprovalMode::Reject)
        .expect("set approval");

    let err = h
        .manager
        .connect(Some("Acme"))
        .await
        .expect_err("user rejected");

    assert_eq!(
        err,
        WalletError::UserRejected {
            wallet: "Acme".to_owned()
        }
    );
    assert_eq!(h.manager.snapshot().attempt_count, 1);
    assert_eq!(provider.prompt_count(), 1);
    assert!(h.timer.delays().is_empty());
    assert_eq!(h.manager.status(), ConnectionStatus::Error);
}

#[tokio::test(start_paused = true)]
async fn error_state_accepts_a_new_connect() {
    let (h, provider) = acme();
    provider
        .debug_set_approval(ApprovalMode::Reject)
        .expect("set approval");
    h.manager
        .connect(Some("Acme"))
        .await
        .expect_err("user rejected");

    provider
        .debug_set_approval(ApprovalMode::Approve)
        .expect("set approval");
    h.manager.connect(Some("Acme")).await.expect("second connect");

    assert!(h.manager.is_connected());
    assert_eq!(h.manager.last_error(), None);
    assert_eq!(h.manager.snapshot().attempt_count, 1);
}

#[tokio::test(start_paused = true)]
async fn unanswered_popup_times_out_without_retry() {
    let (h, provider) = acme();
    provider
        .debug_set_approval(ApprovalMode::Hang)
        .expect("set approval");

    let err = h
        .manager
        .connect(Some("Acme"))
        .await
        .expect_err("popup ignored");

    assert_eq!(
        err,
        WalletError::Timeout {
            wallet: "Acme".to_owned(),
            after_ms: 30_000,
        }
    );
    assert!(!err.is_retryable());
    assert_eq!(h.manager.status(), ConnectionStatus::Error);
    assert_eq!(h.manager.snapshot().attempt_count, 1);
    assert_eq!(h.timer.delays(), vec![30_000]);
    assert_eq!(provider.prompt_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn unanswered_switch_prompt_shares_the_connect_budget() {
    let (h, provider) = acme();
    provider
        .debug_set_switch_support(SwitchSupport::Hang)
        .expect("set switch support");

    let outcome = tokio::time::timeout(Duration::from_secs(60), h.manager.connect(Some("Acme")))
        .await
        .expect("connect resolves within its budget");

    outcome.expect("connect completes on the current network");
    assert!(h.manager.is_connected());
    assert_eq!(h.manager.chain_id(), Some(MOONBEAM));
    assert_eq!(
        h.manager.last_error(),
        Some(WalletError::Timeout {
            wallet: "Acme".to_owned(),
            after_ms: 30_000,
        })
    );
    assert_eq!(h.timer.delays(), vec![30_000]);
    assert_eq!(provider.prompt_count(), 1);
    assert_eq!(
        h.store.load().expect("load session").map(|s| s.wallet_name),
        Some("Acme".to_owned())
    );
}

#[tokio::test(start_paused = true)]
async fn concurrent_connect_is_rejected_without_second_popup() {
    let (h, provider) = acme();
    provider
        .debug_set_approval(ApprovalMode::Manual)
        .expect("set approval");

    let (first, second, resolved) = futures::join!(
        h.manager.connect(Some("Acme")),
        h.manager.connect(Some("Acme")),
        async { provider.debug_resolve_pending(true).expect("resolve popup") },
    );

    first.expect("first connect");
    assert_eq!(second, Err(WalletError::AlreadyConnecting));
    assert_eq!(resolved, 1);
    assert_eq!(provider.prompt_count(), 1);
    assert!(h.manager.is_connected());
}

#[tokio::test(start_paused = true)]
async fn late_approval_after_disconnect_is_discarded() {
    let (h, provider) = acme();
    provider
        .debug_set_approval(ApprovalMode::Manual)
        .expect("set approval");

    let (connected, disconnected, resolved) = futures::join!(
        h.manager.connect(Some("Acme")),
        h.manager.disconnect(),
        async { provider.debug_resolve_pending(true).expect("resolve popup") },
    );

    disconnected.expect("disconnect");
    assert_eq!(resolved, 1);
    assert!(matches!(connected, Err(WalletError::Cancelled { .. })));
    assert_eq!(h.manager.status(), ConnectionStatus::Idle);
    assert_eq!(h.manager.address(), None);
    assert_eq!(h.manager.connected_wallet_name(), None);
    assert_eq!(provider.listener_count(), 0);
    assert_eq!(h.store.load().expect("load session"), None);
}

#[tokio::test(start_paused = true)]
async fn disconnect_during_backoff_cancels_the_retry() {
    let (h, provider) = acme();
    provider
        .debug_fail_next("eth_requestAccounts", internal_error())
        .expect("script failure");

    let (connected, disconnected) = futures::join!(
        h.manager.connect(Some("Acme")),
        h.manager.disconnect(),
    );

    disconnected.expect("disconnect");
    assert!(matches!(connected, Err(WalletError::Cancelled { .. })));
    assert_eq!(provider.prompt_count(), 1);
    assert_eq!(h.timer.delays(), vec![500]);
    assert_eq!(h.manager.status(), ConnectionStatus::Idle);
}
