use crate::error::{ProviderError, WalletError};
use crate::networks::NetworkRegistry;
use crate::ports::RawProvider;
use crate::rpc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    Success,
    UserRejected,
    UnsupportedByWallet(String),
    Unknown(String),
}

impl SwitchOutcome {
    pub fn into_result(self, wallet: &str, chain_id: u64) -> Result<(), WalletError> {
        match self {
            SwitchOutcome::Success => Ok(()),
            SwitchOutcome::UserRejected => Err(WalletError::UserRejected {
                wallet: wallet.to_owned(),
            }),
            SwitchOutcome::UnsupportedByWallet(reason) => Err(WalletError::UnsupportedByWallet {
                wallet: wallet.to_owned(),
                chain_id,
                reason,
            }),
            SwitchOutcome::Unknown(reason) => Err(WalletError::Transient {
                wallet: wallet.to_owned(),
                reason,
            }),
        }
    }
}

/// Issues network switch requests, adding the chain to the wallet first when
/// the wallet does not know it. The add-then-switch path runs at most once
/// per call and a user rejection is never retried.
pub struct ChainSwitcher<'a> {
    networks: &'a NetworkRegistry,
}

impl<'a> ChainSwitcher<'a> {
    pub fn new(networks: &'a NetworkRegistry) -> Self {
        Self { networks }
    }

    pub async fn switch_chain<P: RawProvider>(&self, provider: &P, target: u64) -> SwitchOutcome {
        match rpc::switch_chain(provider, target).await {
            Ok(()) => SwitchOutcome::Success,
            Err(err) if err.is_user_rejection() => SwitchOutcome::UserRejected,
            Err(err) if err.is_unrecognized_chain() => {
                tracing::debug!(chain_id = target, "wallet does not know chain, adding it");
                self.add_then_switch(provider, target).await
            }
            Err(err) => classify(&err),
        }
    }

    async fn add_then_switch<P: RawProvider>(&self, provider: &P, target: u64) -> SwitchOutcome {
        let Some(config) = self.networks.get(target) else {
            return SwitchOutcome::UnsupportedByWallet(format!(
                "no network configuration to add chain {target}"
            ));
        };
        if let Err(err) = rpc::add_chain(provider, config.add_chain_params()).await {
            return classify(&err);
        }
        match rpc::switch_chain(provider, target).await {
            Ok(()) => SwitchOutcome::Success,
            Err(err) if err.is_unrecognized_chain() => SwitchOutcome::UnsupportedByWallet(
                format!("wallet still does not recognize chain {target} after adding it"),
            ),
            Err(err) => classify(&err),
        }
    }
}

fn classify(err: &ProviderError) -> SwitchOutcome {
    if err.is_user_rejection() {
        SwitchOutcome::UserRejected
    } else if err.is_unsupported_method() {
        SwitchOutcome::UnsupportedByWallet(err.to_string())
    } else {
        SwitchOutcome::Unknown(err.to_string())
    }
}
