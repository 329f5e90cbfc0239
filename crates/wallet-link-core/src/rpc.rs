//! Typed helpers over the untyped EIP-1193 surface. Every response shape is
//! validated before it reaches connection state.

use alloy::primitives::Address;
use serde_json::Value;

use crate::domain::hex_chain_id;
use crate::error::{PortError, ProviderError};
use crate::ports::RawProvider;

pub const ETH_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
pub const ETH_ACCOUNTS: &str = "eth_accounts";
pub const ETH_CHAIN_ID: &str = "eth_chainId";
pub const WALLET_SWITCH_CHAIN: &str = "wallet_switchEthereumChain";
pub const WALLET_ADD_CHAIN: &str = "wallet_addEthereumChain";
pub const WALLET_REVOKE_PERMISSIONS: &str = "wallet_revokePermissions";

pub async fn request_accounts<P: RawProvider>(provider: &P) -> Result<Vec<Address>, ProviderError> {
    let result = provider
        .request(ETH_REQUEST_ACCOUNTS, serde_json::json!([]))
        .await?;
    Ok(parse_accounts(&result)?)
}

pub async fn accounts<P: RawProvider>(provider: &P) -> Result<Vec<Address>, ProviderError> {
    let result = provider.request(ETH_ACCOUNTS, serde_json::json!([])).await?;
    Ok(parse_accounts(&result)?)
}

pub async fn chain_id<P: RawProvider>(provider: &P) -> Result<u64, ProviderError> {
    let result = provider.request(ETH_CHAIN_ID, serde_json::json!([])).await?;
    Ok(parse_chain_id(&result)?)
}

pub async fn switch_chain<P: RawProvider>(provider: &P, chain_id: u64) -> Result<(), ProviderError> {
    provider
        .request(
            WALLET_SWITCH_CHAIN,
            serde_json::json!([{ "chainId": hex_chain_id(chain_id) }]),
        )
        .await?;
    Ok(())
}

pub async fn add_chain<P: RawProvider>(provider: &P, params: Value) -> Result<(), ProviderError> {
    provider
        .request(WALLET_ADD_CHAIN, serde_json::json!([params]))
        .await?;
    Ok(())
}

pub async fn revoke_permissions<P: RawProvider>(provider: &P) -> Result<(), ProviderError> {
    provider
        .request(
            WALLET_REVOKE_PERMISSIONS,
            serde_json::json!([{ "eth_accounts": {} }]),
        )
        .await?;
    Ok(())
}

pub fn parse_accounts(value: &Value) -> Result<Vec<Address>, PortError> {
    let arr = value
        .as_array()
        .ok_or_else(|| PortError::Validation("accounts: array expected".to_owned()))?;
    let mut accounts = Vec::with_capacity(arr.len());
    for item in arr {
        let raw = item
            .as_str()
            .ok_or_else(|| PortError::Validation("accounts: string expected".to_owned()))?;
        let parsed: Address = raw
            .parse()
            .map_err(|e| PortError::Validation(format!("invalid account address: {e}")))?;
        accounts.push(parsed);
    }
    Ok(accounts)
}

pub fn parse_chain_id(value: &Value) -> Result<u64, PortError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let s = value
        .as_str()
        .ok_or_else(|| PortError::Validation("chain id must be string or number".to_owned()))?;
    parse_chain_id_str(s)
}

pub fn parse_chain_id_str(raw: &str) -> Result<u64, PortError> {
    let raw = raw.trim();
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
            .map_err(|e| PortError::Validation(format!("invalid hex chain id: {e}")))
    } else {
        raw.parse()
            .map_err(|e| PortError::Validation(format!("invalid chain id: {e}")))
    }
}
