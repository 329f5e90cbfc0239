use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletDescriptor {
    pub name: String,
    pub icon_ref: String,
    pub install_url: String,
    pub installed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub display_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub explorer_urls: Vec<String>,
}

impl ChainConfig {
    /// Hex form used on the wire by `wallet_switchEthereumChain` and friends.
    pub fn hex_chain_id(&self) -> String {
        hex_chain_id(self.chain_id)
    }

    /// EIP-3085 `wallet_addEthereumChain` parameter object.
    pub fn add_chain_params(&self) -> serde_json::Value {
        serde_json::json!({
            "chainId": self.hex_chain_id(),
            "chainName": self.display_name,
            "nativeCurrency": {
                "name": self.native_currency.name,
                "symbol": self.native_currency.symbol,
                "decimals": self.native_currency.decimals,
            },
            "rpcUrls": self.rpc_urls,
            "blockExplorerUrls": self.explorer_urls,
        })
    }

    pub fn explorer_address_url(&self, address: Address) -> Option<String> {
        self.explorer_urls
            .first()
            .map(|base| format!("{}/address/{address}", base.trim_end_matches('/')))
    }
}

pub fn hex_chain_id(chain_id: u64) -> String {
    format!("0x{chain_id:x}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Idle,
    Connecting,
    Connected,
    Error,
}

/// Single connection owned by the manager.
///
/// `provider` is only set between a successful connect and the matching
/// teardown; `status == Connected` implies every other field is set.
#[derive(Debug, Clone)]
pub struct Connection<P> {
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
    pub wallet_name: Option<String>,
    pub provider: Option<P>,
    pub status: ConnectionStatus,
}

impl<P> Default for Connection<P> {
    fn default() -> Self {
        Self {
            address: None,
            chain_id: None,
            wallet_name: None,
            provider: None,
            status: ConnectionStatus::Idle,
        }
    }
}

impl<P> Connection<P> {
    pub fn is_consistent(&self) -> bool {
        let populated = self.address.is_some()
            && self.chain_id.is_some()
            && self.wallet_name.is_some()
            && self.provider.is_some();
        (self.status == ConnectionStatus::Connected) == populated
    }

    pub fn clear(&mut self) {
        self.address = None;
        self.chain_id = None;
        self.wallet_name = None;
        self.provider = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub wallet_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSnapshot {
    pub status: ConnectionStatus,
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
    pub connected_wallet_name: Option<String>,
    pub last_error: Option<WalletError>,
    pub attempt_count: u32,
    pub revision: u64,
}

impl ConnectionSnapshot {
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    pub fn is_connecting(&self) -> bool {
        self.status == ConnectionStatus::Connecting
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderEventKind {
    AccountsChanged,
    ChainChanged,
    Disconnect,
}

impl ProviderEventKind {
    pub const ALL: [ProviderEventKind; 3] = [
        ProviderEventKind::AccountsChanged,
        ProviderEventKind::ChainChanged,
        ProviderEventKind::Disconnect,
    ];

    pub fn event_name(self) -> &'static str {
        match self {
            ProviderEventKind::AccountsChanged => "accountsChanged",
            ProviderEventKind::ChainChanged => "chainChanged",
            ProviderEventKind::Disconnect => "disconnect",
        }
    }
}

/// Raw notification as emitted by the vendor object. `payload` is untyped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEvent {
    pub sequence: u64,
    pub kind: ProviderEventKind,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecord {
    pub from: ConnectionStatus,
    pub to: ConnectionStatus,
    pub reason: &'static str,
}
