//! wallet-link: connect an EIP-1193 wallet and keep it on a Moonbeam network

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use wallet_link_adapters::{AdapterConfig, RuntimeProfile};

mod commands;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIME"),
    ")"
);

#[derive(Parser)]
#[command(name = "wallet-link", version, long_version = LONG_VERSION)]
#[command(about = "Wallet connection and network management over an EIP-1193 proxy", long_about = None)]
struct Cli {
    /// JSON-RPC endpoint that forwards EIP-1193 requests to a wallet
    #[arg(long)]
    proxy_url: Option<String>,

    /// Where the last-connected wallet is remembered
    #[arg(long)]
    session_file: Option<PathBuf>,

    /// Network the wallet is moved to on connect
    #[arg(long)]
    required_chain_id: Option<u64>,

    /// Refuse the in-memory development wallet
    #[arg(long)]
    production: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List supported wallets and whether they are installed
    Wallets,
    /// List supported networks
    Networks,
    /// Restore the saved session, if any, and print the connection
    Status,
    /// Connect a wallet (defaults to the primary wallet)
    Connect { wallet: Option<String> },
    /// Move the connected wallet to another network
    Switch { chain_id: u64 },
    /// Forget the connected wallet
    Disconnect,
}

impl Cli {
    fn adapter_config(&self) -> AdapterConfig {
        let mut config = AdapterConfig::from_env();
        if let Some(ref url) = self.proxy_url {
            config.eip1193_proxy_url = Some(url.clone());
        }
        if let Some(ref path) = self.session_file {
            config.session_file = Some(path.display().to_string());
        }
        if let Some(chain_id) = self.required_chain_id {
            config.required_chain_id = chain_id;
        }
        if self.production {
            config.runtime_profile = RuntimeProfile::Production;
        }
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.adapter_config();
    tracing::info!(
        profile = ?config.runtime_profile,
        proxy = ?config.eip1193_proxy_url,
        "starting wallet-link"
    );

    commands::run(cli.command, &config).await
}
