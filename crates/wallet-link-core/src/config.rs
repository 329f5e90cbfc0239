use crate::networks::MOONBASE_ALPHA;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Wallet used when `connect` is called without a name.
    pub primary_wallet: String,
    pub required_chain_id: u64,
    pub connect_timeout_ms: u64,
    pub retry: RetryPolicy,
    /// Most recent state transitions kept for inspection; older ones are
    /// only visible in the trace log.
    pub transition_history: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            primary_wallet: "MetaMask".to_owned(),
            required_chain_id: MOONBASE_ALPHA,
            connect_timeout_ms: 30_000,
            retry: RetryPolicy::default(),
            transition_history: 64,
        }
    }
}
