pub mod config;
pub mod eip1193;
pub mod session;
pub mod timer;
pub mod wallets;

pub use config::{AdapterConfig, RuntimeProfile};
pub use eip1193::{ApprovalMode, Eip1193Provider, SwitchSupport};
pub use session::MemorySessionStore;
#[cfg(not(target_arch = "wasm32"))]
pub use session::FileSessionStore;
#[cfg(target_arch = "wasm32")]
pub use session::BrowserSessionStore;
#[cfg(not(target_arch = "wasm32"))]
pub use timer::TokioTimer;
#[cfg(target_arch = "wasm32")]
pub use timer::BrowserTimer;
pub use wallets::{default_registry, InjectedWallet, WalletKind, WalletProfile};
