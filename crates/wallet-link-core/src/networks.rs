use crate::domain::{ChainConfig, NativeCurrency};

pub const MOONBEAM: u64 = 1284;
pub const MOONRIVER: u64 = 1285;
pub const MOONBASE_ALPHA: u64 = 1287;

/// Static table of the networks the application knows how to add to a wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRegistry {
    chains: Vec<ChainConfig>,
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::new(vec![
            chain(
                MOONBEAM,
                "Moonbeam",
                ("Glimmer", "GLMR"),
                "https://rpc.api.moonbeam.network",
                "https://moonbeam.moonscan.io",
            ),
            chain(
                MOONRIVER,
                "Moonriver",
                ("Moonriver", "MOVR"),
                "https://rpc.api.moonriver.moonbeam.network",
                "https://moonriver.moonscan.io",
            ),
            chain(
                MOONBASE_ALPHA,
                "Moonbase Alpha",
                ("DEV", "DEV"),
                "https://rpc.api.moonbase.moonbeam.network",
                "https://moonbase.moonscan.io",
            ),
        ])
    }
}

impl NetworkRegistry {
    pub fn new(chains: Vec<ChainConfig>) -> Self {
        Self { chains }
    }

    pub fn get(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }

    pub fn contains(&self, chain_id: u64) -> bool {
        self.get(chain_id).is_some()
    }

    pub fn chains(&self) -> &[ChainConfig] {
        &self.chains
    }

    pub fn display_name(&self, chain_id: u64) -> &str {
        self.get(chain_id)
            .map(|c| c.display_name.as_str())
            .unwrap_or("Unknown")
    }
}

fn chain(
    chain_id: u64,
    display_name: &str,
    (currency_name, symbol): (&str, &str),
    rpc_url: &str,
    explorer_url: &str,
) -> ChainConfig {
    ChainConfig {
        chain_id,
        display_name: display_name.to_owned(),
        native_currency: NativeCurrency {
            name: currency_name.to_owned(),
            symbol: symbol.to_owned(),
            decimals: 18,
        },
        rpc_urls: vec![rpc_url.to_owned()],
        explorer_urls: vec![explorer_url.to_owned()],
    }
}
