use std::task::{Context, Poll, Waker};

use alloy::primitives::Address;
use futures::channel::mpsc::{self, UnboundedReceiver};
use futures::StreamExt;

use crate::domain::{Connection, ListenerId, ProviderEvent, ProviderEventKind};
use crate::error::{PortError, ProviderError, WalletError};
use crate::ports::RawProvider;
use crate::rpc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeSignal {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownCause {
    AccountsCleared,
    ProviderDisconnected,
    NetworkMismatch(WalletError),
}

impl TeardownCause {
    pub fn reason(&self) -> &'static str {
        match self {
            TeardownCause::AccountsCleared => "accounts_cleared",
            TeardownCause::ProviderDisconnected => "provider_disconnected",
            TeardownCause::NetworkMismatch(_) => "network_mismatch",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEffect {
    Unchanged,
    Updated,
    Teardown(TeardownCause),
}

struct Binding<P: RawProvider> {
    provider: P,
    listeners: Vec<ListenerId>,
    receiver: UnboundedReceiver<ProviderEvent>,
}

/// Single consumer of the active provider's notifications.
///
/// At most one provider is bound at a time; binding a new one unbinds the
/// previous provider first. Unbinding drops the channel, so events still in
/// flight from an old provider are never seen.
pub struct EventBridge<P: RawProvider> {
    binding: Option<Binding<P>>,
    /// Task waiting in [`EventBridge::poll_event`]; woken whenever the
    /// binding changes so it re-registers on the new channel.
    driver: Option<Waker>,
}

impl<P: RawProvider> Default for EventBridge<P> {
    fn default() -> Self {
        Self {
            binding: None,
            driver: None,
        }
    }
}

impl<P: RawProvider> EventBridge<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, provider: P) -> Result<(), PortError> {
        self.detach();
        let (sender, receiver) = mpsc::unbounded();
        let mut listeners = Vec::with_capacity(ProviderEventKind::ALL.len());
        for kind in ProviderEventKind::ALL {
            match provider.on(kind, sender.clone()) {
                Ok(id) => listeners.push(id),
                Err(e) => {
                    for id in listeners {
                        let _ = provider.remove_listener(id);
                    }
                    return Err(e);
                }
            }
        }
        self.binding = Some(Binding {
            provider,
            listeners,
            receiver,
        });
        self.wake_driver();
        Ok(())
    }

    pub fn detach(&mut self) {
        let Some(binding) = self.binding.take() else {
            return;
        };
        for id in binding.listeners {
            if let Err(e) = binding.provider.remove_listener(id) {
                tracing::warn!(listener = id.0, error = %e, "failed to remove provider listener");
            }
        }
        self.wake_driver();
    }

    pub fn wake_driver(&mut self) {
        if let Some(waker) = self.driver.take() {
            waker.wake();
        }
    }

    pub fn is_attached(&self) -> bool {
        self.binding.is_some()
    }

    pub fn provider(&self) -> Option<&P> {
        self.binding.as_ref().map(|b| &b.provider)
    }

    /// Next queued notification, in arrival order.
    pub fn next_event(&mut self) -> Option<ProviderEvent> {
        let binding = self.binding.as_mut()?;
        binding.receiver.try_next().ok().flatten()
    }

    /// Polls for the next notification, registering `cx` to be woken when
    /// one arrives or when a provider is bound or unbound.
    pub fn poll_event(&mut self, cx: &mut Context<'_>) -> Poll<ProviderEvent> {
        self.driver = Some(cx.waker().clone());
        let Some(binding) = self.binding.as_mut() else {
            return Poll::Pending;
        };
        match binding.receiver.poll_next_unpin(cx) {
            Poll::Ready(Some(event)) => Poll::Ready(event),
            Poll::Ready(None) | Poll::Pending => Poll::Pending,
        }
    }

    pub fn translate(event: &ProviderEvent) -> Option<BridgeSignal> {
        let signal = match event.kind {
            ProviderEventKind::AccountsChanged => {
                rpc::parse_accounts(&event.payload).map(BridgeSignal::AccountsChanged)
            }
            ProviderEventKind::ChainChanged => {
                rpc::parse_chain_id(&event.payload).map(BridgeSignal::ChainChanged)
            }
            ProviderEventKind::Disconnect => Ok(BridgeSignal::Disconnected),
        };
        match signal {
            Ok(signal) => Some(signal),
            Err(e) => {
                tracing::warn!(
                    sequence = event.sequence,
                    event = event.kind.event_name(),
                    error = %e,
                    "dropping malformed provider event"
                );
                None
            }
        }
    }

    /// Re-reads the chain from the provider so a `chainChanged` payload is
    /// never trusted on its own.
    pub async fn confirm_chain(provider: &P) -> Result<u64, ProviderError> {
        rpc::chain_id(provider).await
    }

    pub fn apply_accounts(connection: &mut Connection<P>, accounts: &[Address]) -> BridgeEffect {
        match accounts.first() {
            None => BridgeEffect::Teardown(TeardownCause::AccountsCleared),
            Some(&first) if connection.address == Some(first) => BridgeEffect::Unchanged,
            Some(&first) => {
                connection.address = Some(first);
                BridgeEffect::Updated
            }
        }
    }

    pub fn apply_chain(
        connection: &mut Connection<P>,
        reported: u64,
        confirmed: Result<u64, ProviderError>,
    ) -> BridgeEffect {
        match confirmed {
            Ok(confirmed) if confirmed == reported => {
                if connection.chain_id == Some(reported) {
                    BridgeEffect::Unchanged
                } else {
                    connection.chain_id = Some(reported);
                    BridgeEffect::Updated
                }
            }
            Ok(confirmed) => BridgeEffect::Teardown(TeardownCause::NetworkMismatch(
                WalletError::NetworkMismatch {
                    reported,
                    confirmed: Some(confirmed),
                },
            )),
            Err(e) => {
                tracing::warn!(reported, error = %e, "could not confirm chain change");
                BridgeEffect::Teardown(TeardownCause::NetworkMismatch(
                    WalletError::NetworkMismatch {
                        reported,
                        confirmed: None,
                    },
                ))
            }
        }
    }
}

impl<P: RawProvider> Drop for EventBridge<P> {
    fn drop(&mut self) {
        self.detach();
    }
}
