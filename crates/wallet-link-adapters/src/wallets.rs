use alloy::primitives::Address;
use async_trait::async_trait;

use wallet_link_core::{rpc, WalletAdapter, WalletError, WalletRegistry};

use crate::eip1193::Eip1193Provider;
use crate::AdapterConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletKind {
    MetaMask,
    Talisman,
    SubWallet,
}

impl WalletKind {
    /// Registration order of the built-in registry.
    pub const ALL: [WalletKind; 3] = [WalletKind::MetaMask, WalletKind::Talisman, WalletKind::SubWallet];

    pub fn profile(self) -> WalletProfile {
        match self {
            WalletKind::MetaMask => WalletProfile {
                name: "MetaMask".to_owned(),
                icon_ref: "icons/metamask.svg".to_owned(),
                install_url: "https://metamask.io/download/".to_owned(),
                injection_key: "ethereum".to_owned(),
                brand_flag: Some("isMetaMask".to_owned()),
                supports_revoke: true,
            },
            WalletKind::Talisman => WalletProfile {
                name: "Talisman".to_owned(),
                icon_ref: "icons/talisman.svg".to_owned(),
                install_url: "https://www.talisman.xyz/download".to_owned(),
                injection_key: "talismanEth".to_owned(),
                brand_flag: None,
                supports_revoke: false,
            },
            WalletKind::SubWallet => WalletProfile {
                name: "SubWallet".to_owned(),
                icon_ref: "icons/subwallet.svg".to_owned(),
                install_url: "https://www.subwallet.app/download.html".to_owned(),
                injection_key: "SubWallet".to_owned(),
                brand_flag: None,
                supports_revoke: false,
            },
        }
    }
}

/// Static description of one wallet brand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletProfile {
    pub name: String,
    pub icon_ref: String,
    pub install_url: String,
    pub injection_key: String,
    /// Property the injected object must set to `true`, e.g. `isMetaMask`.
    pub brand_flag: Option<String>,
    pub supports_revoke: bool,
}

/// Adapter for any wallet that injects an EIP-1193 object into the page.
#[derive(Debug, Clone)]
pub struct InjectedWallet {
    profile: WalletProfile,
    provider: Option<Eip1193Provider>,
}

impl InjectedWallet {
    pub fn new(kind: WalletKind, config: &AdapterConfig) -> Self {
        let profile = kind.profile();
        let provider = Eip1193Provider::for_injection(
            &profile.injection_key,
            profile.brand_flag.as_deref(),
            config,
        );
        Self {
            profile,
            provider: Some(provider),
        }
    }

    /// Wraps an explicit provider; `None` models a wallet that is absent.
    pub fn custom(profile: WalletProfile, provider: Option<Eip1193Provider>) -> Self {
        Self { profile, provider }
    }

    pub fn profile(&self) -> &WalletProfile {
        &self.profile
    }

    pub fn provider(&self) -> Option<&Eip1193Provider> {
        self.provider.as_ref()
    }

    fn live_provider(&self) -> Result<&Eip1193Provider, WalletError> {
        self.provider
            .as_ref()
            .filter(|p| p.is_available())
            .ok_or_else(|| WalletError::NotInstalled {
                wallet: self.profile.name.clone(),
                install_url: self.profile.install_url.clone(),
            })
    }
}

#[async_trait(?Send)]
impl WalletAdapter for InjectedWallet {
    type Provider = Eip1193Provider;

    fn name(&self) -> &str {
        &self.profile.name
    }

    fn icon_ref(&self) -> &str {
        &self.profile.icon_ref
    }

    fn install_url(&self) -> &str {
        &self.profile.install_url
    }

    fn injection_key(&self) -> &str {
        &self.profile.injection_key
    }

    fn installed(&self) -> bool {
        self.provider.as_ref().is_some_and(Eip1193Provider::is_available)
    }

    async fn connect(&self) -> Result<Address, WalletError> {
        let provider = self.live_provider()?;
        let accounts = rpc::request_accounts(provider)
            .await
            .map_err(|e| WalletError::from_provider(self.name(), &e))?;
        accounts.first().copied().ok_or_else(|| WalletError::NoAccounts {
            wallet: self.profile.name.clone(),
        })
    }

    async fn authorized_accounts(&self) -> Result<Vec<Address>, WalletError> {
        let provider = self.live_provider()?;
        rpc::accounts(provider)
            .await
            .map_err(|e| WalletError::from_provider(self.name(), &e))
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        if !self.profile.supports_revoke {
            return Ok(());
        }
        let Ok(provider) = self.live_provider() else {
            return Ok(());
        };
        match rpc::revoke_permissions(provider).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_unsupported_method() => {
                tracing::debug!(wallet = self.name(), "wallet_revokePermissions unsupported");
                Ok(())
            }
            Err(e) => Err(WalletError::from_provider(self.name(), &e)),
        }
    }

    fn raw_provider(&self) -> Option<Eip1193Provider> {
        self.provider.clone()
    }

    fn supports_programmatic_disconnect(&self) -> bool {
        self.profile.supports_revoke
    }
}

/// MetaMask, Talisman and SubWallet, in that order.
pub fn default_registry(config: &AdapterConfig) -> WalletRegistry<InjectedWallet> {
    WalletRegistry::new(
        WalletKind::ALL
            .into_iter()
            .map(|kind| InjectedWallet::new(kind, config))
            .collect(),
    )
}
