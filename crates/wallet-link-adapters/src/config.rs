use wallet_link_core::{ManagerConfig, RetryPolicy, MOONBASE_ALPHA};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeProfile {
    Development,
    Production,
}

impl RuntimeProfile {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Some(Self::Development),
            "prod" | "production" => Some(Self::Production),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub runtime_profile: RuntimeProfile,
    /// JSON-RPC endpoint that forwards EIP-1193 requests to a wallet.
    pub eip1193_proxy_url: Option<String>,
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub required_chain_id: u64,
    pub primary_wallet: String,
    pub session_key: String,
    pub session_file: Option<String>,
    pub retry: RetryPolicy,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            runtime_profile: RuntimeProfile::Development,
            eip1193_proxy_url: None,
            request_timeout_ms: 15_000,
            connect_timeout_ms: 30_000,
            required_chain_id: MOONBASE_ALPHA,
            primary_wallet: "MetaMask".to_owned(),
            session_key: "wallet-link.session".to_owned(),
            session_file: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl AdapterConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(profile) = env_var("WALLET_LINK_PROFILE").and_then(|v| RuntimeProfile::parse(&v)) {
            cfg.runtime_profile = profile;
        }
        cfg.eip1193_proxy_url = env_var("WALLET_LINK_EIP1193_PROXY_URL").or(cfg.eip1193_proxy_url);
        if let Some(ms) = env_var("WALLET_LINK_REQUEST_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            cfg.request_timeout_ms = ms;
        }
        if let Some(ms) = env_var("WALLET_LINK_CONNECT_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            cfg.connect_timeout_ms = ms;
        }
        if let Some(chain_id) = env_var("WALLET_LINK_REQUIRED_CHAIN_ID").and_then(|v| v.parse().ok()) {
            cfg.required_chain_id = chain_id;
        }
        if let Some(wallet) = env_var("WALLET_LINK_PRIMARY_WALLET") {
            cfg.primary_wallet = wallet;
        }
        cfg.session_file = env_var("WALLET_LINK_SESSION_FILE").or(cfg.session_file);
        cfg
    }

    /// Production refuses the deterministic fallback provider.
    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }

    pub fn manager_config(&self) -> ManagerConfig {
        ManagerConfig {
            primary_wallet: self.primary_wallet.clone(),
            required_chain_id: self.required_chain_id,
            connect_timeout_ms: self.connect_timeout_ms,
            retry: self.retry,
            ..ManagerConfig::default()
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(target_arch = "wasm32")]
fn env_var(_key: &str) -> Option<String> {
    None
}
