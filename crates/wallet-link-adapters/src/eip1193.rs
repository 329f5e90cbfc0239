use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::{address, Address};
use async_trait::async_trait;
use futures::channel::oneshot;
use serde_json::Value;

use wallet_link_core::{
    hex_chain_id, rpc, rpc_codes, EventSender, ListenerId, PortError, ProviderError,
    ProviderEvent, ProviderEventKind, RawProvider, MOONBEAM, MOONRIVER,
};

use crate::AdapterConfig;

const DETERMINISTIC_ACCOUNT: Address = address!("1000000000000000000000000000000000000001");

/// EIP-1193 provider handle.
///
/// In the browser it wraps the object a wallet extension injects under its
/// global key. Natively it either forwards requests to a JSON-RPC proxy or,
/// outside the production profile, answers from an in-memory wallet whose
/// behaviour can be scripted through the `debug_*` hooks.
#[derive(Debug, Clone)]
pub struct Eip1193Provider {
    mode: ProviderMode,
    state: Arc<Mutex<ProviderState>>,
    #[cfg(target_arch = "wasm32")]
    hooks: Arc<Mutex<BrowserHooks>>,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    Disabled(String),
    Deterministic,
    #[cfg(not(target_arch = "wasm32"))]
    Proxy(ProxyRuntime),
    #[cfg(target_arch = "wasm32")]
    Browser(BrowserRuntime),
}

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::Client,
    request_timeout: std::time::Duration,
    prompt_timeout: std::time::Duration,
}

#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
struct BrowserRuntime {
    injection_key: String,
    brand_flag: Option<String>,
}

/// How the deterministic wallet answers `eth_requestAccounts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalMode {
    Approve,
    Reject,
    /// Waits until [`Eip1193Provider::debug_resolve_pending`] is called.
    Manual,
    /// Never answers, like a popup the user ignores.
    Hang,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchSupport {
    Full,
    Unsupported,
    /// Switch prompts are shown but never answered.
    Hang,
}

/// Requests remembered by the deterministic wallet for [`Eip1193Provider::calls`].
const CALL_HISTORY: usize = 64;

#[derive(Debug)]
struct Listener {
    id: ListenerId,
    kind: ProviderEventKind,
    sink: EventSender,
}

#[derive(Debug)]
struct ProviderState {
    installed: bool,
    accounts: Vec<Address>,
    authorized: bool,
    chain_id: u64,
    known_chains: BTreeSet<u64>,
    approval: ApprovalMode,
    switch_support: SwitchSupport,
    scripted_failures: VecDeque<(String, ProviderError)>,
    pending_approvals: Vec<oneshot::Sender<bool>>,
    listeners: Vec<Listener>,
    next_listener_id: u64,
    event_seq: u64,
    calls: VecDeque<String>,
    prompt_count: u32,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self {
            installed: true,
            accounts: vec![DETERMINISTIC_ACCOUNT],
            authorized: false,
            chain_id: MOONBEAM,
            known_chains: BTreeSet::from([MOONBEAM, MOONRIVER]),
            approval: ApprovalMode::Approve,
            switch_support: SwitchSupport::Full,
            scripted_failures: VecDeque::new(),
            pending_approvals: Vec::new(),
            listeners: Vec::new(),
            next_listener_id: 0,
            event_seq: 0,
            calls: VecDeque::with_capacity(CALL_HISTORY),
            prompt_count: 0,
        }
    }
}

impl ProviderState {
    fn emit(&mut self, kind: ProviderEventKind, payload: Value) {
        self.event_seq = self.event_seq.saturating_add(1);
        let event = ProviderEvent {
            sequence: self.event_seq,
            kind,
            payload,
        };
        for listener in self.listeners.iter().filter(|l| l.kind == kind) {
            let _ = listener.sink.unbounded_send(event.clone());
        }
    }

    fn accounts_json(&self) -> Value {
        Value::from(
            self.accounts
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>(),
        )
    }
}

#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
struct BrowserHooks {
    callbacks: Vec<(
        ListenerId,
        ProviderEventKind,
        wasm_bindgen::closure::Closure<dyn FnMut(wasm_bindgen::JsValue)>,
    )>,
}

impl Default for Eip1193Provider {
    fn default() -> Self {
        Self::with_config(&AdapterConfig::from_env())
    }
}

impl Eip1193Provider {
    /// Provider for the generic `ethereum` injection point.
    pub fn with_config(config: &AdapterConfig) -> Self {
        Self::for_injection("ethereum", None, config)
    }

    pub fn for_injection(injection_key: &str, brand_flag: Option<&str>, config: &AdapterConfig) -> Self {
        #[cfg(target_arch = "wasm32")]
        let mode = {
            let _ = config;
            ProviderMode::Browser(BrowserRuntime {
                injection_key: injection_key.to_owned(),
                brand_flag: brand_flag.map(str::to_owned),
            })
        };

        #[cfg(not(target_arch = "wasm32"))]
        let mode = {
            let _ = (injection_key, brand_flag);
            if let Some(ref base_url) = config.eip1193_proxy_url {
                let request_timeout = std::time::Duration::from_millis(config.request_timeout_ms);
                let prompt_timeout = std::time::Duration::from_millis(
                    config.connect_timeout_ms.max(config.request_timeout_ms),
                );
                match reqwest::Client::builder().build() {
                    Ok(client) => ProviderMode::Proxy(ProxyRuntime {
                        base_url: base_url.clone(),
                        client,
                        request_timeout,
                        prompt_timeout,
                    }),
                    Err(e) if config.strict_runtime_required() => ProviderMode::Disabled(format!(
                        "failed to initialize EIP-1193 proxy client in production profile: {e}"
                    )),
                    Err(e) => {
                        tracing::warn!(error = %e, "EIP-1193 proxy unavailable, using deterministic provider");
                        ProviderMode::Deterministic
                    }
                }
            } else if config.strict_runtime_required() {
                ProviderMode::Disabled(
                    "EIP-1193 proxy URL not configured in production runtime profile".to_owned(),
                )
            } else {
                ProviderMode::Deterministic
            }
        };

        Self::from_mode(mode)
    }

    pub fn deterministic() -> Self {
        Self::from_mode(ProviderMode::Deterministic)
    }

    pub fn disabled(reason: impl Into<String>) -> Self {
        Self::from_mode(ProviderMode::Disabled(reason.into()))
    }

    fn from_mode(mode: ProviderMode) -> Self {
        Self {
            mode,
            state: Arc::new(Mutex::new(ProviderState::default())),
            #[cfg(target_arch = "wasm32")]
            hooks: Arc::new(Mutex::new(BrowserHooks::default())),
        }
    }

    fn check_mode(&self) -> Result<(), PortError> {
        if let ProviderMode::Disabled(reason) = &self.mode {
            return Err(PortError::Policy(reason.clone()));
        }
        Ok(())
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, ProviderState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("provider lock poisoned: {e}")))
    }

    /// Synchronous probe: is the vendor object present right now?
    pub fn is_available(&self) -> bool {
        match &self.mode {
            ProviderMode::Disabled(_) => false,
            ProviderMode::Deterministic => self.lock_state().map(|g| g.installed).unwrap_or(false),
            #[cfg(not(target_arch = "wasm32"))]
            ProviderMode::Proxy(_) => true,
            #[cfg(target_arch = "wasm32")]
            ProviderMode::Browser(runtime) => browser_provider_available(runtime),
        }
    }

    /// Delivers a notification to the listeners registered for `kind`.
    /// Used by embedders that receive wallet events out of band.
    pub fn dispatch_event(&self, kind: ProviderEventKind, payload: Value) -> Result<(), PortError> {
        self.check_mode()?;
        self.lock_state()?.emit(kind, payload);
        Ok(())
    }

    pub fn listener_count(&self) -> usize {
        self.lock_state().map(|g| g.listeners.len()).unwrap_or(0)
    }

    /// Number of `eth_requestAccounts` prompts the wallet has shown.
    pub fn prompt_count(&self) -> u32 {
        self.lock_state().map(|g| g.prompt_count).unwrap_or(0)
    }

    /// Most recent request methods, oldest first.
    pub fn calls(&self) -> Vec<String> {
        self.lock_state()
            .map(|g| g.calls.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn debug_set_installed(&self, installed: bool) -> Result<(), PortError> {
        self.lock_state()?.installed = installed;
        Ok(())
    }

    pub fn debug_set_accounts(&self, accounts: Vec<Address>) -> Result<(), PortError> {
        self.lock_state()?.accounts = accounts;
        Ok(())
    }

    pub fn debug_set_authorized(&self, authorized: bool) -> Result<(), PortError> {
        self.lock_state()?.authorized = authorized;
        Ok(())
    }

    pub fn debug_set_chain_id(&self, chain_id: u64) -> Result<(), PortError> {
        let mut g = self.lock_state()?;
        g.chain_id = chain_id;
        g.known_chains.insert(chain_id);
        Ok(())
    }

    pub fn debug_set_approval(&self, approval: ApprovalMode) -> Result<(), PortError> {
        self.lock_state()?.approval = approval;
        Ok(())
    }

    pub fn debug_set_switch_support(&self, support: SwitchSupport) -> Result<(), PortError> {
        self.lock_state()?.switch_support = support;
        Ok(())
    }

    /// The next call to `method` fails with `error`.
    pub fn debug_fail_next(&self, method: &str, error: ProviderError) -> Result<(), PortError> {
        self.lock_state()?
            .scripted_failures
            .push_back((method.to_owned(), error));
        Ok(())
    }

    /// Answers every open account prompt; returns how many were open.
    pub fn debug_resolve_pending(&self, approve: bool) -> Result<usize, PortError> {
        let pending = std::mem::take(&mut self.lock_state()?.pending_approvals);
        let count = pending.len();
        for tx in pending {
            let _ = tx.send(approve);
        }
        Ok(count)
    }

    pub fn debug_inject_accounts_changed(&self, accounts: Vec<Address>) -> Result<(), PortError> {
        let mut g = self.lock_state()?;
        g.accounts = accounts;
        let payload = g.accounts_json();
        g.emit(ProviderEventKind::AccountsChanged, payload);
        Ok(())
    }

    pub fn debug_inject_chain_changed(&self, chain_id: u64) -> Result<(), PortError> {
        let mut g = self.lock_state()?;
        g.chain_id = chain_id;
        g.known_chains.insert(chain_id);
        g.emit(ProviderEventKind::ChainChanged, Value::from(hex_chain_id(chain_id)));
        Ok(())
    }

    pub fn debug_inject_disconnect(&self) -> Result<(), PortError> {
        let mut g = self.lock_state()?;
        g.emit(
            ProviderEventKind::Disconnect,
            serde_json::json!({ "code": rpc_codes::DISCONNECTED, "message": "provider disconnected" }),
        );
        Ok(())
    }

    async fn deterministic_request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let pending = {
            let mut g = self.lock_state()?;
            if g.calls.len() == CALL_HISTORY {
                g.calls.pop_front();
            }
            g.calls.push_back(method.to_owned());
            if method == rpc::ETH_REQUEST_ACCOUNTS {
                g.prompt_count = g.prompt_count.saturating_add(1);
            }
            if let Some(pos) = g.scripted_failures.iter().position(|(m, _)| m == method) {
                if let Some((_, err)) = g.scripted_failures.remove(pos) {
                    return Err(err);
                }
            }
            match method {
                rpc::ETH_REQUEST_ACCOUNTS => match g.approval {
                    ApprovalMode::Approve => {
                        g.authorized = true;
                        return Ok(g.accounts_json());
                    }
                    ApprovalMode::Reject => return Err(user_rejected()),
                    ApprovalMode::Manual => {
                        let (tx, rx) = oneshot::channel();
                        g.pending_approvals.push(tx);
                        rx
                    }
                    ApprovalMode::Hang => {
                        drop(g);
                        return futures::future::pending().await;
                    }
                },
                rpc::ETH_ACCOUNTS => {
                    return Ok(if g.authorized {
                        g.accounts_json()
                    } else {
                        Value::Array(Vec::new())
                    })
                }
                rpc::ETH_CHAIN_ID => return Ok(Value::from(hex_chain_id(g.chain_id))),
                rpc::WALLET_SWITCH_CHAIN if g.switch_support == SwitchSupport::Hang => {
                    drop(g);
                    return futures::future::pending().await;
                }
                rpc::WALLET_SWITCH_CHAIN => return deterministic_switch(&mut g, &params),
                rpc::WALLET_ADD_CHAIN => return deterministic_add(&mut g, &params),
                rpc::WALLET_REVOKE_PERMISSIONS => {
                    g.authorized = false;
                    return Ok(Value::Null);
                }
                other => {
                    return Err(ProviderError::rpc(
                        rpc_codes::METHOD_NOT_FOUND,
                        format!("the method {other} does not exist"),
                    ))
                }
            }
        };

        let approved = pending.await.unwrap_or(false);
        let mut g = self.lock_state()?;
        if approved {
            g.authorized = true;
            Ok(g.accounts_json())
        } else {
            Err(user_rejected())
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    async fn proxy_call(
        &self,
        proxy: &ProxyRuntime,
        method: &str,
        params: Value,
    ) -> Result<Value, ProviderError> {
        let timeout = if is_prompting(method) {
            proxy.prompt_timeout
        } else {
            proxy.request_timeout
        };
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = proxy
            .client
            .post(&proxy.base_url)
            .timeout(timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("eip1193 proxy request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| PortError::Transport(format!("eip1193 proxy json decode failed: {e}")))?;
        if let Some(err) = body.get("error") {
            return Err(rpc_error_from_json(err));
        }
        if !status.is_success() {
            return Err(PortError::Transport(format!("eip1193 proxy status {status}: {body}")).into());
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Transport("eip1193 proxy missing result".to_owned()).into())
    }

    #[cfg(target_arch = "wasm32")]
    async fn browser_request(
        &self,
        runtime: &BrowserRuntime,
        method: &str,
        params: Value,
    ) -> Result<Value, ProviderError> {
        use wasm_bindgen::JsCast;

        let provider = browser_provider(&runtime.injection_key)?;
        let request_fn = get_fn(&provider, "request")?;
        let request = serde_json::json!({
            "method": method,
            "params": params,
        });
        let request_js = serde_wasm_bindgen::to_value(&request)
            .map_err(|e| PortError::Transport(format!("failed to encode wasm request: {e}")))?;
        let promise_js = request_fn.call1(&provider, &request_js).map_err(|e| {
            PortError::Transport(format!("provider request dispatch failed: {e:?}"))
        })?;
        let promise = promise_js.dyn_into::<js_sys::Promise>().map_err(|_| {
            PortError::Transport("provider request did not return Promise".to_owned())
        })?;
        let result_js = wasm_bindgen_futures::JsFuture::from(promise)
            .await
            .map_err(js_rpc_error)?;
        if result_js.is_undefined() {
            return Ok(Value::Null);
        }
        serde_wasm_bindgen::from_value(result_js)
            .map_err(|e| PortError::Transport(format!("failed to decode wasm response: {e}")).into())
    }

    #[cfg(target_arch = "wasm32")]
    fn register_browser_hook(
        &self,
        runtime: &BrowserRuntime,
        id: ListenerId,
        kind: ProviderEventKind,
        sink: EventSender,
    ) -> Result<(), PortError> {
        use wasm_bindgen::{closure::Closure, JsCast, JsValue};

        let provider = browser_provider(&runtime.injection_key)?;
        let on_fn = get_fn(&provider, "on").or_else(|_| get_fn(&provider, "addListener"))?;

        let state = Arc::clone(&self.state);
        let callback = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            let payload: Value = serde_wasm_bindgen::from_value(value).unwrap_or(Value::Null);
            let sequence = match state.lock() {
                Ok(mut g) => {
                    g.event_seq = g.event_seq.saturating_add(1);
                    g.event_seq
                }
                Err(_) => 0,
            };
            let _ = sink.unbounded_send(ProviderEvent {
                sequence,
                kind,
                payload,
            });
        });

        on_fn
            .call2(
                &provider,
                &JsValue::from_str(kind.event_name()),
                callback.as_ref().unchecked_ref(),
            )
            .map_err(|e| {
                PortError::Transport(format!("register {} failed: {e:?}", kind.event_name()))
            })?;

        self.hooks
            .lock()
            .map_err(|e| PortError::Transport(format!("provider hooks lock poisoned: {e}")))?
            .callbacks
            .push((id, kind, callback));
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    fn unregister_browser_hook(&self, runtime: &BrowserRuntime, id: ListenerId) -> Result<(), PortError> {
        use wasm_bindgen::{JsCast, JsValue};

        let mut hooks = self
            .hooks
            .lock()
            .map_err(|e| PortError::Transport(format!("provider hooks lock poisoned: {e}")))?;
        let Some(pos) = hooks.callbacks.iter().position(|(hook_id, _, _)| *hook_id == id) else {
            return Ok(());
        };
        let (_, kind, callback) = hooks.callbacks.remove(pos);
        drop(hooks);

        let provider = browser_provider(&runtime.injection_key)?;
        let remove_fn = get_fn(&provider, "removeListener")?;
        remove_fn
            .call2(
                &provider,
                &JsValue::from_str(kind.event_name()),
                callback.as_ref().unchecked_ref(),
            )
            .map_err(|e| {
                PortError::Transport(format!("removeListener {} failed: {e:?}", kind.event_name()))
            })?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl RawProvider for Eip1193Provider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.check_mode()?;

        #[cfg(not(target_arch = "wasm32"))]
        if let ProviderMode::Proxy(proxy) = &self.mode {
            return self.proxy_call(proxy, method, params).await;
        }

        #[cfg(target_arch = "wasm32")]
        if let ProviderMode::Browser(runtime) = &self.mode {
            return self.browser_request(runtime, method, params).await;
        }

        self.deterministic_request(method, params).await
    }

    fn on(&self, kind: ProviderEventKind, sink: EventSender) -> Result<ListenerId, PortError> {
        self.check_mode()?;
        let id = {
            let mut g = self.lock_state()?;
            g.next_listener_id = g.next_listener_id.saturating_add(1);
            ListenerId(g.next_listener_id)
        };

        #[cfg(target_arch = "wasm32")]
        if let ProviderMode::Browser(runtime) = &self.mode {
            self.register_browser_hook(runtime, id, kind, sink.clone())?;
        }

        self.lock_state()?.listeners.push(Listener { id, kind, sink });
        Ok(id)
    }

    fn remove_listener(&self, id: ListenerId) -> Result<(), PortError> {
        {
            let mut g = self.lock_state()?;
            let before = g.listeners.len();
            g.listeners.retain(|l| l.id != id);
            if g.listeners.len() == before {
                return Err(PortError::NotFound(format!("listener {} not registered", id.0)));
            }
        }

        #[cfg(target_arch = "wasm32")]
        if let ProviderMode::Browser(runtime) = &self.mode {
            self.unregister_browser_hook(runtime, id)?;
        }

        Ok(())
    }
}

fn user_rejected() -> ProviderError {
    ProviderError::rpc(rpc_codes::USER_REJECTED, "User rejected the request.")
}

fn chain_param(params: &Value) -> Result<u64, ProviderError> {
    let raw = params
        .get(0)
        .and_then(|p| p.get("chainId"))
        .ok_or_else(|| PortError::Validation("chainId parameter missing".to_owned()))?;
    Ok(rpc::parse_chain_id(raw)?)
}

fn deterministic_switch(g: &mut ProviderState, params: &Value) -> Result<Value, ProviderError> {
    let target = chain_param(params)?;
    if g.switch_support == SwitchSupport::Unsupported {
        return Err(ProviderError::rpc(
            rpc_codes::UNSUPPORTED_METHOD,
            "wallet_switchEthereumChain is not supported",
        ));
    }
    if !g.known_chains.contains(&target) {
        return Err(ProviderError::rpc(
            rpc_codes::UNRECOGNIZED_CHAIN,
            format!("Unrecognized chain ID \"{}\"", hex_chain_id(target)),
        ));
    }
    if g.chain_id != target {
        g.chain_id = target;
        g.emit(ProviderEventKind::ChainChanged, Value::from(hex_chain_id(target)));
    }
    Ok(Value::Null)
}

fn deterministic_add(g: &mut ProviderState, params: &Value) -> Result<Value, ProviderError> {
    let target = chain_param(params)?;
    if g.switch_support == SwitchSupport::Unsupported {
        return Err(ProviderError::rpc(
            rpc_codes::UNSUPPORTED_METHOD,
            "wallet_addEthereumChain is not supported",
        ));
    }
    g.known_chains.insert(target);
    Ok(Value::Null)
}

#[cfg(not(target_arch = "wasm32"))]
fn is_prompting(method: &str) -> bool {
    matches!(
        method,
        rpc::ETH_REQUEST_ACCOUNTS | rpc::WALLET_SWITCH_CHAIN | rpc::WALLET_ADD_CHAIN
    )
}

#[cfg(not(target_arch = "wasm32"))]
fn rpc_error_from_json(err: &Value) -> ProviderError {
    let code = err
        .get("code")
        .and_then(Value::as_i64)
        .unwrap_or(rpc_codes::INTERNAL);
    let message = err
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| err.to_string());
    ProviderError::Rpc { code, message }
}

#[cfg(target_arch = "wasm32")]
fn browser_provider_available(runtime: &BrowserRuntime) -> bool {
    let Ok(provider) = browser_provider(&runtime.injection_key) else {
        return false;
    };
    match &runtime.brand_flag {
        Some(flag) => get_prop(&provider, flag)
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        None => true,
    }
}

#[cfg(target_arch = "wasm32")]
fn browser_provider(injection_key: &str) -> Result<wasm_bindgen::JsValue, PortError> {
    let window =
        web_sys::window().ok_or_else(|| PortError::Transport("missing window".to_owned()))?;
    let provider = get_prop(&window.into(), injection_key)?;
    if provider.is_null() || provider.is_undefined() {
        return Err(PortError::NotFound(format!("window.{injection_key} missing")));
    }
    Ok(provider)
}

#[cfg(target_arch = "wasm32")]
fn get_prop(target: &wasm_bindgen::JsValue, key: &str) -> Result<wasm_bindgen::JsValue, PortError> {
    js_sys::Reflect::get(target, &wasm_bindgen::JsValue::from_str(key))
        .map_err(|e| PortError::Transport(format!("read provider property {key} failed: {e:?}")))
}

#[cfg(target_arch = "wasm32")]
fn get_fn(target: &wasm_bindgen::JsValue, key: &str) -> Result<js_sys::Function, PortError> {
    use wasm_bindgen::JsCast;

    get_prop(target, key)?
        .dyn_into::<js_sys::Function>()
        .map_err(|_| PortError::NotImplemented("provider function missing"))
}

#[cfg(target_arch = "wasm32")]
fn js_rpc_error(err: wasm_bindgen::JsValue) -> ProviderError {
    let code = get_prop(&err, "code").ok().and_then(|v| v.as_f64());
    let message = get_prop(&err, "message")
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    match code {
        Some(code) => ProviderError::Rpc {
            code: code as i64,
            message,
        },
        None => PortError::Transport(format!("provider request rejected: {message}")).into(),
    }
}
