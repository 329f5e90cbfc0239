#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;

use wallet_link_adapters::{Eip1193Provider, InjectedWallet, MemorySessionStore, WalletProfile};
use wallet_link_core::{
    ConnectionManager, ManagerConfig, NetworkRegistry, TimerPort, WalletRegistry, MOONBASE_ALPHA,
};

/// Tokio-backed timer that remembers every delay it was asked for.
#[derive(Debug, Clone, Default)]
pub struct RecordingTimer {
    delays: Arc<Mutex<Vec<u64>>>,
}

impl RecordingTimer {
    pub fn delays(&self) -> Vec<u64> {
        self.delays.lock().expect("timer lock").clone()
    }
}

#[async_trait(?Send)]
impl TimerPort for RecordingTimer {
    async fn sleep(&self, duration_ms: u64) {
        self.delays.lock().expect("timer lock").push(duration_ms);
        tokio::time::sleep(Duration::from_millis(duration_ms)).await;
    }
}

pub type TestManager = ConnectionManager<InjectedWallet, MemorySessionStore, RecordingTimer>;

pub struct Harness {
    pub manager: TestManager,
    pub store: MemorySessionStore,
    pub timer: RecordingTimer,
}

pub fn profile(name: &str, injection_key: &str) -> WalletProfile {
    WalletProfile {
        name: name.to_owned(),
        icon_ref: format!("icons/{}.svg", name.to_ascii_lowercase()),
        install_url: format!("https://{}.example/install", name.to_ascii_lowercase()),
        injection_key: injection_key.to_owned(),
        brand_flag: None,
        supports_revoke: false,
    }
}

/// Installed wallet backed by a deterministic provider. The returned
/// provider shares state with the one inside the adapter.
pub fn installed_wallet(name: &str, injection_key: &str) -> (InjectedWallet, Eip1193Provider) {
    let provider = Eip1193Provider::deterministic();
    let wallet = InjectedWallet::custom(profile(name, injection_key), Some(provider.clone()));
    (wallet, provider)
}

pub fn missing_wallet(name: &str) -> InjectedWallet {
    InjectedWallet::custom(profile(name, &name.to_ascii_lowercase()), None)
}

pub fn config(primary: &str, required_chain_id: u64) -> ManagerConfig {
    ManagerConfig {
        primary_wallet: primary.to_owned(),
        required_chain_id,
        ..ManagerConfig::default()
    }
}

pub fn harness(wallets: Vec<InjectedWallet>, config: ManagerConfig) -> Harness {
    harness_with_store(wallets, config, MemorySessionStore::new())
}

pub fn harness_with_store(
    wallets: Vec<InjectedWallet>,
    config: ManagerConfig,
    store: MemorySessionStore,
) -> Harness {
    let timer = RecordingTimer::default();
    let manager = ConnectionManager::new(
        WalletRegistry::new(wallets),
        NetworkRegistry::default(),
        store.clone(),
        timer.clone(),
        config,
    );
    Harness {
        manager,
        store,
        timer,
    }
}

/// Single installed "Acme" wallet, required network Moonbase Alpha.
pub fn acme() -> (Harness, Eip1193Provider) {
    let (wallet, provider) = installed_wallet("Acme", "acme");
    (harness(vec![wallet], config("Acme", MOONBASE_ALPHA)), provider)
}

pub fn reasons(manager: &TestManager) -> Vec<&'static str> {
    manager.transitions().iter().map(|t| t.reason).collect()
}

pub fn account_a() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("account a")
}

pub fn account_b() -> Address {
    "0x2000000000000000000000000000000000000002"
        .parse()
        .expect("account b")
}
