use alloy::primitives::Address;
use async_trait::async_trait;
use futures::channel::mpsc::UnboundedSender;
use serde_json::Value;

use crate::chain_switcher::ChainSwitcher;
use crate::domain::{ListenerId, PersistedSession, ProviderEvent, ProviderEventKind};
use crate::error::{PortError, ProviderError, WalletError};
use crate::networks::NetworkRegistry;

pub type EventSender = UnboundedSender<ProviderEvent>;

/// Vendor-supplied handle: JSON-RPC style requests plus an event emitter.
#[async_trait(?Send)]
pub trait RawProvider: Clone {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;
    fn on(&self, kind: ProviderEventKind, sink: EventSender) -> Result<ListenerId, PortError>;
    fn remove_listener(&self, id: ListenerId) -> Result<(), PortError>;
}

/// Uniform surface over one wallet brand.
#[async_trait(?Send)]
pub trait WalletAdapter {
    type Provider: RawProvider;

    fn name(&self) -> &str;
    fn icon_ref(&self) -> &str;
    fn install_url(&self) -> &str;
    /// Global the vendor injects into, e.g. `ethereum`.
    fn injection_key(&self) -> &str;
    fn installed(&self) -> bool;

    /// Prompts the user and resolves with the primary account once the
    /// vendor popup is dismissed.
    async fn connect(&self) -> Result<Address, WalletError>;

    /// Already-authorized accounts. Never opens a popup.
    async fn authorized_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Best-effort. Afterwards the adapter holds no local references, but the
    /// vendor may still consider the site authorized unless
    /// [`WalletAdapter::supports_programmatic_disconnect`] is true.
    async fn disconnect(&self) -> Result<(), WalletError>;

    fn raw_provider(&self) -> Option<Self::Provider>;

    fn supports_programmatic_disconnect(&self) -> bool {
        false
    }

    async fn switch_chain(
        &self,
        chain_id: u64,
        networks: &NetworkRegistry,
    ) -> Result<(), WalletError> {
        let provider = self.raw_provider().ok_or_else(|| WalletError::NotInstalled {
            wallet: self.name().to_owned(),
            install_url: self.install_url().to_owned(),
        })?;
        let outcome = ChainSwitcher::new(networks)
            .switch_chain(&provider, chain_id)
            .await;
        outcome.into_result(self.name(), chain_id)
    }
}

/// Durable storage for the last-connected wallet.
pub trait SessionStore {
    fn load(&self) -> Result<Option<PersistedSession>, PortError>;
    fn save(&self, session: &PersistedSession) -> Result<(), PortError>;
    fn clear(&self) -> Result<(), PortError>;
}

#[async_trait(?Send)]
pub trait TimerPort {
    async fn sleep(&self, duration_ms: u64);
}
