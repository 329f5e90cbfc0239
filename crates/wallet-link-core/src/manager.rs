use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::task::Poll;

use alloy::primitives::Address;
use futures::future::{self, Either};

use crate::chain_switcher::ChainSwitcher;
use crate::config::ManagerConfig;
use crate::domain::{
    Connection, ConnectionSnapshot, ConnectionStatus, PersistedSession, ProviderEvent,
    TransitionRecord, WalletDescriptor,
};
use crate::error::WalletError;
use crate::event_bridge::{BridgeEffect, BridgeSignal, EventBridge, TeardownCause};
use crate::networks::NetworkRegistry;
use crate::ports::{RawProvider, SessionStore, TimerPort, WalletAdapter};
use crate::registry::WalletRegistry;
use crate::rpc;
use crate::state_machine::{connection_transition, ConnectionAction};

struct ManagerState<P: RawProvider> {
    connection: Connection<P>,
    bridge: EventBridge<P>,
    last_error: Option<WalletError>,
    /// Bumped on every connect start, restore and teardown. Async work
    /// captures it and only commits if it is unchanged.
    epoch: u64,
    attempt_count: u32,
    revision: u64,
    transitions: VecDeque<TransitionRecord>,
    history: usize,
    /// Set by `shutdown`; ends `run_events`.
    closed: bool,
}

impl<P: RawProvider> ManagerState<P> {
    fn new(history: usize) -> Self {
        Self {
            connection: Connection::default(),
            bridge: EventBridge::new(),
            last_error: None,
            epoch: 0,
            attempt_count: 0,
            revision: 0,
            transitions: VecDeque::with_capacity(history),
            history,
            closed: false,
        }
    }

    fn transition(&mut self, action: ConnectionAction) -> Result<(), WalletError> {
        let from = self.connection.status;
        let (to, reason) = connection_transition(from, action)?;
        self.connection.status = to;
        tracing::debug!(?from, ?to, reason, "connection transition");
        if self.history > 0 {
            if self.transitions.len() == self.history {
                self.transitions.pop_front();
            }
            self.transitions.push_back(TransitionRecord { from, to, reason });
        }
        self.revision = self.revision.saturating_add(1);
        Ok(())
    }

    fn teardown(&mut self, error: Option<WalletError>) {
        self.bridge.detach();
        self.connection.clear();
        if self.connection.status != ConnectionStatus::Idle {
            if let Err(e) = self.transition(ConnectionAction::Teardown) {
                tracing::error!(error = %e, "teardown transition rejected");
                self.connection.status = ConnectionStatus::Idle;
            }
        }
        self.epoch = self.epoch.wrapping_add(1);
        self.last_error = error;
    }

    fn is_current(&self, epoch: u64, status: ConnectionStatus) -> bool {
        self.epoch == epoch && self.connection.status == status
    }
}

struct Established<P> {
    address: Address,
    provider: P,
    chain_id: u64,
}

/// Owns the one wallet connection of an application session.
///
/// All methods take `&self`; state sits behind a mutex that is never held
/// across an `.await`, so a UI can call `disconnect` while a `connect` is
/// still waiting on a wallet popup.
pub struct ConnectionManager<A, S, T>
where
    A: WalletAdapter,
    S: SessionStore,
    T: TimerPort,
{
    registry: WalletRegistry<A>,
    networks: NetworkRegistry,
    store: S,
    timer: T,
    config: ManagerConfig,
    state: Mutex<ManagerState<A::Provider>>,
}

impl<A, S, T> ConnectionManager<A, S, T>
where
    A: WalletAdapter,
    S: SessionStore,
    T: TimerPort,
{
    pub fn new(
        registry: WalletRegistry<A>,
        networks: NetworkRegistry,
        store: S,
        timer: T,
        config: ManagerConfig,
    ) -> Self {
        let state = Mutex::new(ManagerState::new(config.transition_history));
        Self {
            registry,
            networks,
            store,
            timer,
            config,
            state,
        }
    }

    pub fn registry(&self) -> &WalletRegistry<A> {
        &self.registry
    }

    pub fn networks(&self) -> &NetworkRegistry {
        &self.networks
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, ManagerState<A::Provider>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        let g = self.state();
        ConnectionSnapshot {
            status: g.connection.status,
            address: g.connection.address,
            chain_id: g.connection.chain_id,
            connected_wallet_name: g.connection.wallet_name.clone(),
            last_error: g.last_error.clone(),
            attempt_count: g.attempt_count,
            revision: g.revision,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state().connection.status
    }

    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    pub fn is_connecting(&self) -> bool {
        self.status() == ConnectionStatus::Connecting
    }

    pub fn address(&self) -> Option<Address> {
        self.state().connection.address
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.state().connection.chain_id
    }

    pub fn connected_wallet_name(&self) -> Option<String> {
        self.state().connection.wallet_name.clone()
    }

    pub fn last_error(&self) -> Option<WalletError> {
        self.state().last_error.clone()
    }

    pub fn available_wallets(&self) -> impl Iterator<Item = WalletDescriptor> + '_ {
        self.registry.get_all_wallets()
    }

    /// The most recent transitions, oldest first, bounded by
    /// [`ManagerConfig::transition_history`].
    pub fn transitions(&self) -> Vec<TransitionRecord> {
        self.state().transitions.iter().cloned().collect()
    }

    pub fn has_live_listeners(&self) -> bool {
        self.state().bridge.is_attached()
    }

    /// Connects `wallet_name`, or the configured primary wallet.
    pub async fn connect(&self, wallet_name: Option<&str>) -> Result<(), WalletError> {
        let name = wallet_name
            .unwrap_or(&self.config.primary_wallet)
            .to_owned();
        let adapter = self.installed_adapter(&name)?;
        let attempt_id = self.begin_connect(&name)?;

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            self.mark_attempt(attempt_id, &name, attempt)?;
            tracing::info!(wallet = %name, attempt, "connecting wallet");

            // one budget per attempt covers the account prompt and the
            // network switch that follows it
            let mut deadline = self.timer.sleep(self.config.connect_timeout_ms);
            let request = self.request_connection(adapter, &name);
            match self.with_deadline(&name, request, &mut deadline).await {
                Ok(established) => {
                    return self
                        .complete_connect(attempt_id, &name, attempt, established, deadline)
                        .await
                }
                Err(err) => {
                    tracing::warn!(
                        wallet = %name,
                        class = err.class().as_str(),
                        attempt,
                        error = %err,
                        "wallet connect attempt failed"
                    );
                    if err.is_retryable() {
                        if let Some(delay_ms) = self.config.retry.delay_after(attempt) {
                            tracing::debug!(wallet = %name, attempt, delay_ms, "retrying wallet connect");
                            self.timer.sleep(delay_ms).await;
                            continue;
                        }
                    }
                    return Err(self.fail_connect(attempt_id, &name, err));
                }
            }
        }
    }

    fn installed_adapter(&self, name: &str) -> Result<&A, WalletError> {
        let adapter = self.registry.get_wallet_by_name(name);
        match adapter {
            Some(adapter) if self.registry.is_installed(name) => Ok(adapter),
            _ => {
                let err = WalletError::NotInstalled {
                    wallet: name.to_owned(),
                    install_url: adapter
                        .map(|a| a.install_url().to_owned())
                        .unwrap_or_default(),
                };
                tracing::warn!(
                    wallet = %name,
                    class = err.class().as_str(),
                    attempt = 0u32,
                    "wallet not installed"
                );
                Err(err)
            }
        }
    }

    fn begin_connect(&self, name: &str) -> Result<u64, WalletError> {
        let (attempt_id, replaced) = {
            let mut g = self.state();
            if g.connection.status == ConnectionStatus::Connecting {
                let err = WalletError::AlreadyConnecting;
                tracing::warn!(
                    wallet = %name,
                    class = err.class().as_str(),
                    attempt = g.attempt_count,
                    "connect rejected: an attempt is already in progress"
                );
                return Err(err);
            }
            let replaced = g.connection.status == ConnectionStatus::Connected;
            if replaced {
                tracing::info!(
                    from = ?g.connection.wallet_name,
                    to = %name,
                    "replacing connected wallet"
                );
                g.teardown(None);
            }
            g.transition(ConnectionAction::Connect)?;
            g.epoch = g.epoch.wrapping_add(1);
            g.attempt_count = 0;
            g.last_error = None;
            (g.epoch, replaced)
        };
        if replaced {
            self.clear_session();
        }
        Ok(attempt_id)
    }

    fn mark_attempt(&self, attempt_id: u64, name: &str, attempt: u32) -> Result<(), WalletError> {
        let mut g = self.state();
        if !g.is_current(attempt_id, ConnectionStatus::Connecting) {
            return Err(WalletError::Cancelled {
                wallet: name.to_owned(),
            });
        }
        if attempt > 1 {
            g.transition(ConnectionAction::Retry)?;
        }
        g.attempt_count = attempt;
        Ok(())
    }

    /// Races `request` against `deadline`. The deadline is borrowed so a
    /// caller can keep spending what is left of it afterwards.
    async fn with_deadline<R, F, D>(
        &self,
        name: &str,
        request: F,
        deadline: D,
    ) -> Result<R, WalletError>
    where
        F: Future<Output = Result<R, WalletError>>,
        D: Future<Output = ()> + Unpin,
    {
        futures::pin_mut!(request);
        match future::select(request, deadline).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _)) => Err(WalletError::Timeout {
                wallet: name.to_owned(),
                after_ms: self.config.connect_timeout_ms,
            }),
        }
    }

    async fn with_timeout<R, F>(&self, name: &str, request: F) -> Result<R, WalletError>
    where
        F: Future<Output = Result<R, WalletError>>,
    {
        let deadline = self.timer.sleep(self.config.connect_timeout_ms);
        self.with_deadline(name, request, deadline).await
    }

    async fn request_connection(
        &self,
        adapter: &A,
        name: &str,
    ) -> Result<Established<A::Provider>, WalletError> {
        let address = adapter.connect().await?;
        let provider = adapter.raw_provider().ok_or_else(|| WalletError::NotInstalled {
            wallet: name.to_owned(),
            install_url: adapter.install_url().to_owned(),
        })?;
        let chain_id = rpc::chain_id(&provider)
            .await
            .map_err(|e| WalletError::from_provider(name, &e))?;
        Ok(Established {
            address,
            provider,
            chain_id,
        })
    }

    async fn complete_connect<D>(
        &self,
        attempt_id: u64,
        name: &str,
        attempt: u32,
        established: Established<A::Provider>,
        deadline: D,
    ) -> Result<(), WalletError>
    where
        D: Future<Output = ()> + Unpin,
    {
        let Established {
            address,
            provider,
            mut chain_id,
        } = established;

        let required = self.config.required_chain_id;
        let mut switch_error = None;
        if chain_id != required {
            tracing::info!(wallet = %name, from = chain_id, to = required, "switching to required network");
            let switcher = ChainSwitcher::new(&self.networks);
            let switch = async {
                switcher
                    .switch_chain(&provider, required)
                    .await
                    .into_result(name, required)
            };
            match self.with_deadline(name, switch, deadline).await {
                Ok(()) => chain_id = required,
                Err(err) => {
                    tracing::warn!(
                        wallet = %name,
                        class = err.class().as_str(),
                        attempt,
                        chain_id,
                        error = %err,
                        "network switch failed, proceeding on the wallet's current network"
                    );
                    switch_error = Some(err);
                }
            }
        }

        {
            let mut g = self.state();
            if !g.is_current(attempt_id, ConnectionStatus::Connecting) {
                tracing::warn!(wallet = %name, "discarding wallet approval for a superseded attempt");
                return Err(WalletError::Cancelled {
                    wallet: name.to_owned(),
                });
            }
            if let Err(e) = g.bridge.attach(provider.clone()) {
                drop(g);
                let err = WalletError::Transient {
                    wallet: name.to_owned(),
                    reason: format!("failed to attach provider listeners: {e}"),
                };
                return Err(self.fail_connect(attempt_id, name, err));
            }
            g.connection.address = Some(address);
            g.connection.chain_id = Some(chain_id);
            g.connection.wallet_name = Some(name.to_owned());
            g.connection.provider = Some(provider);
            g.transition(ConnectionAction::Established)?;
            g.last_error = switch_error;
        }

        self.persist_session(name);
        tracing::info!(wallet = %name, %address, chain_id, "wallet connected");
        Ok(())
    }

    fn fail_connect(&self, attempt_id: u64, name: &str, err: WalletError) -> WalletError {
        let mut g = self.state();
        if g.is_current(attempt_id, ConnectionStatus::Connecting) {
            g.bridge.detach();
            g.connection.clear();
            if let Err(e) = g.transition(ConnectionAction::Fail) {
                tracing::error!(error = %e, "failure transition rejected");
            }
            g.last_error = Some(err.clone());
            tracing::error!(
                wallet = %name,
                class = err.class().as_str(),
                attempt = g.attempt_count,
                error = %err,
                "wallet connection failed"
            );
        }
        err
    }

    /// Explicit disconnect. A no-op when nothing is connected.
    pub async fn disconnect(&self) -> Result<(), WalletError> {
        let wallet = {
            let mut g = self.state();
            if g.connection.status == ConnectionStatus::Idle {
                return Ok(());
            }
            let wallet = g.connection.wallet_name.clone();
            g.teardown(None);
            wallet
        };
        self.clear_session();
        tracing::info!(wallet = ?wallet, "wallet disconnected");

        let adapter = wallet
            .as_deref()
            .and_then(|name| self.registry.get_wallet_by_name(name));
        if let Some(adapter) = adapter {
            if let Err(e) = adapter.disconnect().await {
                tracing::warn!(wallet = adapter.name(), error = %e, "vendor disconnect failed");
            }
        }
        Ok(())
    }

    /// Silently reconnects the wallet named by the persisted session, if it
    /// still reports authorized accounts. Never prompts the user.
    pub async fn restore(&self) -> Result<bool, WalletError> {
        let session = match self.store.load() {
            Ok(Some(session)) => session,
            Ok(None) => return Ok(false),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted session");
                return Ok(false);
            }
        };
        if self.status() != ConnectionStatus::Idle {
            return Ok(false);
        }

        let name = session.wallet_name;
        let adapter = match self.registry.get_wallet_by_name(&name) {
            Some(adapter) if self.registry.is_installed(&name) => adapter,
            _ => {
                tracing::info!(wallet = %name, "persisted wallet is not installed, clearing session");
                self.clear_session();
                return Ok(false);
            }
        };

        let restored = self.query_authorized(adapter, &name).await;
        let established = match restored {
            Ok(Some(established)) => established,
            Ok(None) => {
                tracing::info!(wallet = %name, "no authorized accounts, clearing session");
                self.clear_session();
                return Ok(false);
            }
            Err(err) => {
                tracing::warn!(
                    wallet = %name,
                    class = err.class().as_str(),
                    error = %err,
                    "session restore failed, clearing session"
                );
                self.clear_session();
                return Ok(false);
            }
        };

        let mut g = self.state();
        if g.connection.status != ConnectionStatus::Idle {
            return Ok(false);
        }
        if let Err(e) = g.bridge.attach(established.provider.clone()) {
            drop(g);
            tracing::warn!(wallet = %name, error = %e, "failed to attach listeners on restore");
            self.clear_session();
            return Ok(false);
        }
        g.connection.address = Some(established.address);
        g.connection.chain_id = Some(established.chain_id);
        g.connection.wallet_name = Some(name.clone());
        g.connection.provider = Some(established.provider);
        g.transition(ConnectionAction::Restore)?;
        g.epoch = g.epoch.wrapping_add(1);
        g.last_error = None;
        tracing::info!(
            wallet = %name,
            address = %established.address,
            chain_id = established.chain_id,
            "wallet session restored"
        );
        Ok(true)
    }

    async fn query_authorized(
        &self,
        adapter: &A,
        name: &str,
    ) -> Result<Option<Established<A::Provider>>, WalletError> {
        let request = async {
            let accounts = adapter.authorized_accounts().await?;
            let Some(&address) = accounts.first() else {
                return Ok(None);
            };
            let provider = adapter.raw_provider().ok_or_else(|| WalletError::NotInstalled {
                wallet: name.to_owned(),
                install_url: adapter.install_url().to_owned(),
            })?;
            let chain_id = rpc::chain_id(&provider)
                .await
                .map_err(|e| WalletError::from_provider(name, &e))?;
            Ok::<_, WalletError>(Some(Established {
                address,
                provider,
                chain_id,
            }))
        };
        self.with_timeout(name, request).await
    }

    /// Asks the connected wallet to move to `chain_id`. On success the chain
    /// is updated immediately; the wallet's own `chainChanged` notification
    /// then confirms it without a second update.
    pub async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        let (provider, wallet, epoch, attempt) = {
            let g = self.state();
            let wallet = g.connection.wallet_name.clone();
            if !self.networks.contains(chain_id) {
                let err = WalletError::UnknownChain(chain_id);
                tracing::warn!(
                    wallet = ?wallet,
                    class = err.class().as_str(),
                    attempt = g.attempt_count,
                    chain_id,
                    "switch requested to unsupported chain"
                );
                return Err(err);
            }
            match (&g.connection.status, &g.connection.provider, wallet) {
                (ConnectionStatus::Connected, Some(provider), Some(wallet)) => {
                    (provider.clone(), wallet, g.epoch, g.attempt_count)
                }
                (_, _, wallet) => {
                    let err = WalletError::NotConnected;
                    tracing::warn!(
                        wallet = ?wallet,
                        class = err.class().as_str(),
                        attempt = g.attempt_count,
                        chain_id,
                        "switch requested without a connected wallet"
                    );
                    return Err(err);
                }
            }
        };

        tracing::info!(wallet = %wallet, chain_id, "switching network");
        let result = ChainSwitcher::new(&self.networks)
            .switch_chain(&provider, chain_id)
            .await
            .into_result(&wallet, chain_id);

        let mut g = self.state();
        if !g.is_current(epoch, ConnectionStatus::Connected) {
            return Err(WalletError::NotConnected);
        }
        match result {
            Ok(()) => {
                if g.connection.chain_id != Some(chain_id) {
                    g.connection.chain_id = Some(chain_id);
                    g.transition(ConnectionAction::Update)?;
                }
                tracing::info!(wallet = %wallet, chain_id, "network switched");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(
                    wallet = %wallet,
                    class = err.class().as_str(),
                    attempt,
                    chain_id,
                    error = %err,
                    "network switch failed"
                );
                g.last_error = Some(err.clone());
                g.revision = g.revision.saturating_add(1);
                Err(err)
            }
        }
    }

    /// Applies every queued provider notification in arrival order and
    /// returns how many were consumed. A chain change the provider does not
    /// confirm tears the connection down and is returned as
    /// [`WalletError::NetworkMismatch`].
    pub async fn process_events(&self) -> Result<usize, WalletError> {
        let mut processed = 0;
        loop {
            let queued = {
                let mut g = self.state();
                let Some(event) = g.bridge.next_event() else {
                    break;
                };
                let epoch = g.epoch;
                let provider = g.connection.provider.clone();
                provider.map(|provider| (event, provider, epoch))
            };
            let Some((event, provider, epoch)) = queued else {
                break;
            };
            processed += 1;
            self.apply_event(event, provider, epoch).await?;
        }
        Ok(processed)
    }

    /// Waits for provider notifications and applies each as it arrives,
    /// until [`ConnectionManager::shutdown`] is called. Hosts run this next
    /// to the UI (`spawn_local` in a browser, a `LocalSet` natively) so
    /// wallet-side changes are visible without polling.
    ///
    /// Untrusted chain changes are logged and torn down here; they are also
    /// left in [`ConnectionManager::last_error`].
    pub async fn run_events(&self) {
        while let Some((event, provider, epoch)) = self.next_event().await {
            // failures are logged and recorded by apply_event
            let _ = self.apply_event(event, provider, epoch).await;
        }
        tracing::debug!("provider event loop stopped");
    }

    async fn next_event(&self) -> Option<(ProviderEvent, A::Provider, u64)> {
        future::poll_fn(|cx| {
            let mut g = self.state();
            if g.closed {
                return Poll::Ready(None);
            }
            loop {
                let event = match g.bridge.poll_event(cx) {
                    Poll::Ready(event) => event,
                    Poll::Pending => return Poll::Pending,
                };
                if let Some(provider) = g.connection.provider.clone() {
                    return Poll::Ready(Some((event, provider, g.epoch)));
                }
            }
        })
        .await
    }

    async fn apply_event(
        &self,
        event: ProviderEvent,
        provider: A::Provider,
        epoch: u64,
    ) -> Result<(), WalletError> {
        let Some(signal) = EventBridge::<A::Provider>::translate(&event) else {
            return Ok(());
        };
        let confirmed = match signal {
            BridgeSignal::ChainChanged(_) => Some(EventBridge::confirm_chain(&provider).await),
            _ => None,
        };

        let mut g = self.state();
        if !g.is_current(epoch, ConnectionStatus::Connected) {
            return Ok(());
        }
        let effect = match (signal, confirmed) {
            (BridgeSignal::AccountsChanged(accounts), _) => {
                EventBridge::apply_accounts(&mut g.connection, &accounts)
            }
            (BridgeSignal::ChainChanged(reported), Some(confirmed)) => {
                EventBridge::apply_chain(&mut g.connection, reported, confirmed)
            }
            (BridgeSignal::ChainChanged(_), None) => BridgeEffect::Unchanged,
            (BridgeSignal::Disconnected, _) => {
                BridgeEffect::Teardown(TeardownCause::ProviderDisconnected)
            }
        };

        match effect {
            BridgeEffect::Unchanged => Ok(()),
            BridgeEffect::Updated => {
                g.transition(ConnectionAction::Update)?;
                tracing::info!(
                    wallet = ?g.connection.wallet_name,
                    address = ?g.connection.address,
                    chain_id = ?g.connection.chain_id,
                    event = event.kind.event_name(),
                    "wallet state updated from provider event"
                );
                Ok(())
            }
            BridgeEffect::Teardown(cause) => {
                let wallet = g.connection.wallet_name.clone();
                let attempt = g.attempt_count;
                let error = match &cause {
                    TeardownCause::NetworkMismatch(err) => Some(err.clone()),
                    _ => None,
                };
                g.teardown(error.clone());
                drop(g);
                self.clear_session();
                match error {
                    Some(err) => {
                        tracing::warn!(
                            wallet = ?wallet,
                            class = err.class().as_str(),
                            attempt,
                            error = %err,
                            "provider state untrusted, disconnected"
                        );
                        Err(err)
                    }
                    None => {
                        tracing::info!(wallet = ?wallet, reason = cause.reason(), "wallet disconnected by provider");
                        Ok(())
                    }
                }
            }
        }
    }

    /// Drops listeners and in-memory state but keeps the persisted session,
    /// so the next start can restore it. Also stops
    /// [`ConnectionManager::run_events`].
    pub fn shutdown(&self) {
        let mut g = self.state();
        if g.connection.status != ConnectionStatus::Idle {
            g.teardown(None);
        }
        g.closed = true;
        g.bridge.wake_driver();
    }

    fn persist_session(&self, wallet: &str) {
        let session = PersistedSession {
            wallet_name: wallet.to_owned(),
        };
        if let Err(e) = self.store.save(&session) {
            tracing::warn!(wallet, error = %e, "failed to persist wallet session");
        }
    }

    fn clear_session(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear persisted wallet session");
        }
    }
}
