pub mod chain_switcher;
pub mod config;
pub mod domain;
pub mod error;
pub mod event_bridge;
pub mod manager;
pub mod networks;
pub mod ports;
pub mod registry;
pub mod retry;
pub mod rpc;
pub mod state_machine;

pub use chain_switcher::{ChainSwitcher, SwitchOutcome};
pub use config::ManagerConfig;
pub use domain::{
    hex_chain_id, ChainConfig, Connection, ConnectionSnapshot, ConnectionStatus, ListenerId,
    NativeCurrency, PersistedSession, ProviderEvent, ProviderEventKind, TransitionRecord,
    WalletDescriptor,
};
pub use error::{rpc_codes, ErrorClass, PortError, ProviderError, WalletError};
pub use event_bridge::{BridgeEffect, BridgeSignal, EventBridge, TeardownCause};
pub use manager::ConnectionManager;
pub use networks::{NetworkRegistry, MOONBASE_ALPHA, MOONBEAM, MOONRIVER};
pub use ports::{EventSender, RawProvider, SessionStore, TimerPort, WalletAdapter};
pub use registry::WalletRegistry;
pub use retry::RetryPolicy;
pub use state_machine::{connection_transition, ConnectionAction};
