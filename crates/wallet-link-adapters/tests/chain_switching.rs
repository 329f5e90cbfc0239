mod common;

use wallet_link_adapters::{Eip1193Provider, SwitchSupport};
use wallet_link_core::{
    rpc, rpc_codes, ChainSwitcher, ConnectionStatus, ErrorClass, NetworkRegistry, ProviderError,
    SwitchOutcome, WalletError, MOONBASE_ALPHA, MOONBEAM, MOONRIVER,
};

use common::{config, harness, installed_wallet};

fn count(provider: &Eip1193Provider, method: &str) -> usize {
    provider.calls().iter().filter(|c| c.as_str() == method).count()
}

#[tokio::test]
async fn known_chain_switches_directly() {
    let networks = NetworkRegistry::default();
    let provider = Eip1193Provider::deterministic();

    let outcome = ChainSwitcher::new(&networks)
        .switch_chain(&provider, MOONRIVER)
        .await;

    assert_eq!(outcome, SwitchOutcome::Success);
    assert_eq!(count(&provider, "wallet_switchEthereumChain"), 1);
    assert_eq!(count(&provider, "wallet_addEthereumChain"), 0);
    assert_eq!(rpc::chain_id(&provider).await.expect("chain id"), MOONRIVER);
}

#[tokio::test]
async fn unknown_chain_is_added_then_switched_once() {
    let networks = NetworkRegistry::default();
    let provider = Eip1193Provider::deterministic();

    let outcome = ChainSwitcher::new(&networks)
        .switch_chain(&provider, MOONBASE_ALPHA)
        .await;

    assert_eq!(outcome, SwitchOutcome::Success);
    assert_eq!(count(&provider, "wallet_addEthereumChain"), 1);
    assert_eq!(count(&provider, "wallet_switchEthereumChain"), 2);
    assert_eq!(rpc::chain_id(&provider).await.expect("chain id"), MOONBASE_ALPHA);
}

#[tokio::test]
async fn chain_missing_from_registry_is_unsupported() {
    let networks = NetworkRegistry::new(Vec::new());
    let provider = Eip1193Provider::deterministic();

    let outcome = ChainSwitcher::new(&networks)
        .switch_chain(&provider, MOONBASE_ALPHA)
        .await;

    assert!(matches!(outcome, SwitchOutcome::UnsupportedByWallet(_)));
    assert_eq!(count(&provider, "wallet_addEthereumChain"), 0);
}

#[tokio::test]
async fn rejected_switch_is_not_retried() {
    let networks = NetworkRegistry::default();
    let provider = Eip1193Provider::deterministic();
    provider
        .debug_fail_next(
            "wallet_switchEthereumChain",
            ProviderError::rpc(rpc_codes::USER_REJECTED, "User rejected the request."),
        )
        .expect("script failure");

    let outcome = ChainSwitcher::new(&networks)
        .switch_chain(&provider, MOONRIVER)
        .await;

    assert_eq!(outcome, SwitchOutcome::UserRejected);
    assert_eq!(count(&provider, "wallet_switchEthereumChain"), 1);
}

#[tokio::test]
async fn rejected_add_stops_the_fallback() {
    let networks = NetworkRegistry::default();
    let provider = Eip1193Provider::deterministic();
    provider
        .debug_fail_next(
            "wallet_addEthereumChain",
            ProviderError::rpc(rpc_codes::USER_REJECTED, "User rejected the request."),
        )
        .expect("script failure");

    let outcome = ChainSwitcher::new(&networks)
        .switch_chain(&provider, MOONBASE_ALPHA)
        .await;

    assert_eq!(outcome, SwitchOutcome::UserRejected);
    assert_eq!(count(&provider, "wallet_switchEthereumChain"), 1);
}

#[tokio::test]
async fn chain_still_unknown_after_add_is_unsupported() {
    let networks = NetworkRegistry::default();
    let provider = Eip1193Provider::deterministic();
    for _ in 0..2 {
        provider
            .debug_fail_next(
                "wallet_switchEthereumChain",
                ProviderError::rpc(rpc_codes::UNRECOGNIZED_CHAIN, "Unrecognized chain ID"),
            )
            .expect("script failure");
    }

    let outcome = ChainSwitcher::new(&networks)
        .switch_chain(&provider, MOONRIVER)
        .await;

    assert!(matches!(outcome, SwitchOutcome::UnsupportedByWallet(_)));
    assert_eq!(count(&provider, "wallet_addEthereumChain"), 1);
    assert_eq!(count(&provider, "wallet_switchEthereumChain"), 2);
}

#[tokio::test]
async fn unrecognized_chain_message_without_code_triggers_add() {
    let networks = NetworkRegistry::default();
    let provider = Eip1193Provider::deterministic();
    provider
        .debug_fail_next(
            "wallet_switchEthereumChain",
            ProviderError::rpc(-32603, "Unrecognized chain ID \"0x505\". Try adding the chain"),
        )
        .expect("script failure");

    let outcome = ChainSwitcher::new(&networks)
        .switch_chain(&provider, MOONRIVER)
        .await;

    assert_eq!(outcome, SwitchOutcome::Success);
    assert_eq!(count(&provider, "wallet_addEthereumChain"), 1);
}

#[tokio::test]
async fn wallet_without_switch_support_is_unsupported() {
    let networks = NetworkRegistry::default();
    let provider = Eip1193Provider::deterministic();
    provider
        .debug_set_switch_support(SwitchSupport::Unsupported)
        .expect("set switch support");

    let outcome = ChainSwitcher::new(&networks)
        .switch_chain(&provider, MOONRIVER)
        .await;

    assert!(matches!(outcome, SwitchOutcome::UnsupportedByWallet(_)));
}

#[tokio::test]
async fn unexpected_switch_failure_is_unknown() {
    let networks = NetworkRegistry::default();
    let provider = Eip1193Provider::deterministic();
    provider
        .debug_fail_next(
            "wallet_switchEthereumChain",
            ProviderError::rpc(rpc_codes::RESOURCE_UNAVAILABLE, "request already pending"),
        )
        .expect("script failure");

    let outcome = ChainSwitcher::new(&networks)
        .switch_chain(&provider, MOONRIVER)
        .await;

    assert!(matches!(outcome, SwitchOutcome::Unknown(_)));
}

#[tokio::test]
async fn explicit_switch_failure_is_reported_and_keeps_connection() {
    let (wallet, provider) = installed_wallet("Acme", "acme");
    let h = harness(vec![wallet], config("Acme", MOONBEAM));
    h.manager.connect(None).await.expect("connect acme");
    provider
        .debug_set_switch_support(SwitchSupport::Unsupported)
        .expect("set switch support");

    let err = h
        .manager
        .switch_chain(MOONRIVER)
        .await
        .expect_err("switch unsupported");

    assert_eq!(err.class(), ErrorClass::UnsupportedByWallet);
    assert_eq!(h.manager.status(), ConnectionStatus::Connected);
    assert_eq!(h.manager.chain_id(), Some(MOONBEAM));
    assert_eq!(h.manager.last_error(), Some(err));
}

#[tokio::test]
async fn switch_requires_a_connection() {
    let (wallet, _) = installed_wallet("Acme", "acme");
    let h = harness(vec![wallet], config("Acme", MOONBEAM));

    assert_eq!(
        h.manager.switch_chain(MOONRIVER).await,
        Err(WalletError::NotConnected)
    );
}

#[tokio::test]
async fn switch_to_unsupported_chain_is_refused() {
    let (wallet, provider) = installed_wallet("Acme", "acme");
    let h = harness(vec![wallet], config("Acme", MOONBEAM));
    h.manager.connect(None).await.expect("connect acme");

    assert_eq!(
        h.manager.switch_chain(1).await,
        Err(WalletError::UnknownChain(1))
    );
    assert_eq!(count(&provider, "wallet_switchEthereumChain"), 0);
    assert!(h.manager.is_connected());
}
