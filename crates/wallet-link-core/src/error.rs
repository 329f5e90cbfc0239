use thiserror::Error;

use crate::domain::ConnectionStatus;

/// EIP-1193 / JSON-RPC error codes the core reacts to.
pub mod rpc_codes {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNAUTHORIZED: i64 = 4100;
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    pub const DISCONNECTED: i64 = 4900;
    pub const CHAIN_DISCONNECTED: i64 = 4901;
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    pub const RESOURCE_UNAVAILABLE: i64 = -32002;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INTERNAL: i64 = -32603;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("policy error: {0}")]
    Policy(String),
}

/// Failure reported by a raw provider `request` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("provider rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error(transparent)]
    Port(#[from] PortError),
}

impl ProviderError {
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            ProviderError::Rpc { code, .. } => Some(*code),
            ProviderError::Port(_) => None,
        }
    }

    /// Some vendors reject without a code, only a message.
    pub fn is_user_rejection(&self) -> bool {
        match self {
            ProviderError::Rpc { code, message } => {
                *code == rpc_codes::USER_REJECTED || mentions_rejection(message)
            }
            ProviderError::Port(_) => false,
        }
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        match self {
            ProviderError::Rpc { code, message } => {
                *code == rpc_codes::UNRECOGNIZED_CHAIN || {
                    let lower = message.to_ascii_lowercase();
                    lower.contains("unrecognized chain") || lower.contains("unknown chain")
                }
            }
            ProviderError::Port(_) => false,
        }
    }

    pub fn is_unsupported_method(&self) -> bool {
        match self {
            ProviderError::Rpc { code, .. } => matches!(
                *code,
                rpc_codes::UNSUPPORTED_METHOD | rpc_codes::METHOD_NOT_FOUND
            ),
            ProviderError::Port(PortError::NotImplemented(_)) => true,
            ProviderError::Port(_) => false,
        }
    }
}

fn mentions_rejection(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("user rejected") || lower.contains("user denied") || lower.contains("cancelled by user")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotInstalled,
    NoAccounts,
    UserRejected,
    UnsupportedByWallet,
    NetworkMismatch,
    Timeout,
    Transient,
    Usage,
}

impl ErrorClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::NotInstalled => "not_installed",
            ErrorClass::NoAccounts => "no_accounts",
            ErrorClass::UserRejected => "user_rejected",
            ErrorClass::UnsupportedByWallet => "unsupported_by_wallet",
            ErrorClass::NetworkMismatch => "network_mismatch",
            ErrorClass::Timeout => "timeout",
            ErrorClass::Transient => "transient",
            ErrorClass::Usage => "usage",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("wallet {wallet} is not installed")]
    NotInstalled { wallet: String, install_url: String },
    #[error("wallet {wallet} returned no authorized accounts")]
    NoAccounts { wallet: String },
    #[error("request rejected by the user in {wallet}")]
    UserRejected { wallet: String },
    #[error("wallet {wallet} cannot switch to chain {chain_id}: {reason}")]
    UnsupportedByWallet {
        wallet: String,
        chain_id: u64,
        reason: String,
    },
    #[error("chain changed to {reported} but provider confirms {confirmed:?}; reconnect required")]
    NetworkMismatch { reported: u64, confirmed: Option<u64> },
    #[error("wallet {wallet} did not respond within {after_ms} ms")]
    Timeout { wallet: String, after_ms: u64 },
    #[error("wallet {wallet} request failed: {reason}")]
    Transient { wallet: String, reason: String },
    #[error("a connection attempt is already in progress")]
    AlreadyConnecting,
    #[error("connection attempt to {wallet} was cancelled")]
    Cancelled { wallet: String },
    #[error("no wallet is connected")]
    NotConnected,
    #[error("chain {0} is not supported by this application")]
    UnknownChain(u64),
    #[error("illegal connection transition from {from:?} on {action}")]
    IllegalTransition {
        from: ConnectionStatus,
        action: &'static str,
    },
}

impl WalletError {
    /// Maps a raw provider failure from an account request.
    pub fn from_provider(wallet: &str, err: &ProviderError) -> Self {
        if err.is_user_rejection() {
            return WalletError::UserRejected {
                wallet: wallet.to_owned(),
            };
        }
        match err {
            ProviderError::Rpc { code, .. } if *code == rpc_codes::UNAUTHORIZED => {
                WalletError::NoAccounts {
                    wallet: wallet.to_owned(),
                }
            }
            _ => WalletError::Transient {
                wallet: wallet.to_owned(),
                reason: err.to_string(),
            },
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            WalletError::NotInstalled { .. } => ErrorClass::NotInstalled,
            WalletError::NoAccounts { .. } => ErrorClass::NoAccounts,
            WalletError::UserRejected { .. } => ErrorClass::UserRejected,
            WalletError::UnsupportedByWallet { .. } => ErrorClass::UnsupportedByWallet,
            WalletError::NetworkMismatch { .. } => ErrorClass::NetworkMismatch,
            WalletError::Timeout { .. } => ErrorClass::Timeout,
            WalletError::Transient { .. } => ErrorClass::Transient,
            WalletError::AlreadyConnecting
            | WalletError::Cancelled { .. }
            | WalletError::NotConnected
            | WalletError::UnknownChain(_)
            | WalletError::IllegalTransition { .. } => ErrorClass::Usage,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    /// Text a UI can show as-is.
    pub fn user_message(&self) -> String {
        match self {
            WalletError::NotInstalled {
                wallet,
                install_url,
            } if !install_url.is_empty() => {
                format!("{wallet} is not installed. Install this wallet from {install_url} and reload the page.")
            }
            WalletError::NotInstalled { wallet, .. } => {
                format!("{wallet} is not installed. Install this wallet and reload the page.")
            }
            WalletError::NoAccounts { wallet } => {
                format!("{wallet} has no authorized accounts. Unlock the extension and authorize this site.")
            }
            WalletError::UserRejected { .. } => "The request was declined in the wallet.".to_owned(),
            WalletError::UnsupportedByWallet { wallet, chain_id, .. } => {
                format!("{wallet} cannot change networks automatically. Switch networks manually to chain {chain_id}.")
            }
            WalletError::NetworkMismatch { .. } => {
                "The wallet network changed unexpectedly. Please reconnect your wallet.".to_owned()
            }
            WalletError::Timeout { wallet, .. } => {
                format!("{wallet} did not respond in time. Open the extension and try again.")
            }
            WalletError::Transient { .. } => {
                "The wallet could not be reached. Please try again.".to_owned()
            }
            WalletError::AlreadyConnecting => "A connection request is already open.".to_owned(),
            WalletError::Cancelled { .. } => "The connection request was cancelled.".to_owned(),
            WalletError::NotConnected => "Connect a wallet first.".to_owned(),
            WalletError::UnknownChain(chain_id) => {
                format!("Network {chain_id} is not supported.")
            }
            WalletError::IllegalTransition { .. } => {
                "The wallet connection is in an unexpected state. Please reconnect.".to_owned()
            }
        }
    }
}
