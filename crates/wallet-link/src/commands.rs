use futures::future::{self, Either};
use serde_json::{json, Value};

use wallet_link_adapters::{
    default_registry, AdapterConfig, FileSessionStore, InjectedWallet, TokioTimer,
};
use wallet_link_core::{ConnectionManager, NetworkRegistry, SessionStore, WalletError};

use crate::Command;

const DEFAULT_SESSION_FILE: &str = ".wallet-link/session.json";

type CliManager = ConnectionManager<InjectedWallet, FileSessionStore, TokioTimer>;

fn build_manager(config: &AdapterConfig) -> CliManager {
    let session_file = config
        .session_file
        .clone()
        .unwrap_or_else(|| DEFAULT_SESSION_FILE.to_owned());
    ConnectionManager::new(
        default_registry(config),
        NetworkRegistry::default(),
        FileSessionStore::new(session_file),
        TokioTimer,
        config.manager_config(),
    )
}

/// Runs `command` while the manager applies wallet notifications, so a
/// wallet that drops the connection mid-command is reflected in the output.
pub async fn run(command: Command, config: &AdapterConfig) -> eyre::Result<()> {
    let manager = build_manager(config);
    let work = execute(command, &manager);
    let events = manager.run_events();
    futures::pin_mut!(work, events);
    match future::select(work, events).await {
        Either::Left((result, _)) => result,
        Either::Right(((), work)) => work.await,
    }
}

async fn execute(command: Command, manager: &CliManager) -> eyre::Result<()> {
    match command {
        Command::Wallets => {
            let wallets: Vec<Value> = manager
                .available_wallets()
                .map(|w| {
                    json!({
                        "name": w.name,
                        "installed": w.installed,
                        "icon": w.icon_ref,
                        "install_url": w.install_url,
                    })
                })
                .collect();
            print_json(&Value::from(wallets))
        }
        Command::Networks => {
            let networks: Vec<Value> = manager
                .networks()
                .chains()
                .iter()
                .map(|c| {
                    json!({
                        "chain_id": c.chain_id,
                        "hex_chain_id": c.hex_chain_id(),
                        "name": c.display_name,
                        "currency": c.native_currency.symbol,
                        "rpc_urls": c.rpc_urls,
                    })
                })
                .collect();
            print_json(&Value::from(networks))
        }
        Command::Status => {
            manager.restore().await.map_err(report)?;
            print_connection(manager)?;
            manager.shutdown();
            Ok(())
        }
        Command::Connect { wallet } => {
            manager.connect(wallet.as_deref()).await.map_err(report)?;
            print_connection(manager)?;
            manager.shutdown();
            Ok(())
        }
        Command::Switch { chain_id } => {
            if !manager.restore().await.map_err(report)? {
                eyre::bail!("no wallet session to restore, run `wallet-link connect` first");
            }
            manager.switch_chain(chain_id).await.map_err(report)?;
            print_connection(manager)?;
            manager.shutdown();
            Ok(())
        }
        Command::Disconnect => {
            let restored = manager.restore().await.map_err(report)?;
            manager.disconnect().await.map_err(report)?;
            if !restored {
                manager.store().clear()?;
            }
            print_connection(manager)
        }
    }
}

fn report(err: WalletError) -> eyre::Report {
    let message = err.user_message();
    tracing::error!(class = err.class().as_str(), error = %err, "wallet operation failed");
    eyre::Report::new(err).wrap_err(message)
}

fn print_connection(manager: &CliManager) -> eyre::Result<()> {
    let snapshot = manager.snapshot();
    let network = snapshot.chain_id.and_then(|id| manager.networks().get(id));
    let explorer = match (network, snapshot.address) {
        (Some(chain), Some(address)) => chain.explorer_address_url(address),
        _ => None,
    };
    print_json(&json!({
        "status": format!("{:?}", snapshot.status),
        "wallet": snapshot.connected_wallet_name,
        "address": snapshot.address.map(|a| a.to_string()),
        "chain_id": snapshot.chain_id,
        "network": snapshot.chain_id.map(|id| manager.networks().display_name(id).to_owned()),
        "explorer": explorer,
        "warning": snapshot.last_error.map(|e| e.user_message()),
    }))
}

fn print_json(value: &Value) -> eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
