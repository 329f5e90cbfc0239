use alloy::primitives::Address;
use wallet_link_core::{
    hex_chain_id, NetworkRegistry, PersistedSession, MOONBASE_ALPHA, MOONBEAM, MOONRIVER,
};

#[test]
fn builtin_network_table_covers_moonbeam_family() {
    let networks = NetworkRegistry::default();
    assert_eq!(networks.display_name(MOONBEAM), "Moonbeam");
    assert_eq!(networks.display_name(MOONRIVER), "Moonriver");
    assert_eq!(networks.display_name(MOONBASE_ALPHA), "Moonbase Alpha");
    assert_eq!(networks.display_name(1), "Unknown");
    assert!(!networks.contains(1));
}

#[test]
fn add_chain_params_follow_eip3085() {
    let networks = NetworkRegistry::default();
    let moonbase = networks.get(MOONBASE_ALPHA).expect("moonbase config");
    let params = moonbase.add_chain_params();
    assert_eq!(params["chainId"], "0x507");
    assert_eq!(params["chainName"], "Moonbase Alpha");
    assert_eq!(params["nativeCurrency"]["symbol"], "DEV");
    assert_eq!(params["nativeCurrency"]["decimals"], 18);
    assert_eq!(
        params["rpcUrls"][0],
        "https://rpc.api.moonbase.moonbeam.network"
    );
    assert_eq!(params["blockExplorerUrls"][0], "https://moonbase.moonscan.io");
}

#[test]
fn hex_chain_id_is_lowercase_without_padding() {
    assert_eq!(hex_chain_id(MOONBEAM), "0x504");
    assert_eq!(hex_chain_id(1), "0x1");
}

#[test]
fn explorer_address_url_uses_first_explorer() {
    let networks = NetworkRegistry::default();
    let moonbeam = networks.get(MOONBEAM).expect("moonbeam config");
    let url = moonbeam
        .explorer_address_url(Address::ZERO)
        .expect("explorer configured");
    assert_eq!(
        url,
        "https://moonbeam.moonscan.io/address/0x0000000000000000000000000000000000000000"
    );
}

#[test]
fn persisted_session_roundtrip_serialization() {
    let session = PersistedSession {
        wallet_name: "Talisman".to_owned(),
    };
    let json = serde_json::to_string(&session).expect("serialize session");
    assert_eq!(json, r#"{"wallet_name":"Talisman"}"#);
    let decoded: PersistedSession = serde_json::from_str(&json).expect("decode session");
    assert_eq!(decoded, session);
}
