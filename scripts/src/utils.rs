//! Utilities for the deploy scripts.

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::{
    primitives::{utils::format_ether, Address, Bytes, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    sol_types::SolValue,
    transports::http::reqwest::Url,
};
use serde_json::Value;
use tracing::info;

use crate::{
    constants::{ARTIFACT_EXTENSION, NUM_BYTES_ADDRESS, NUM_BYTES_STORAGE_SLOT},
    errors::ScriptError,
};

/// Sets up the signing client used to deploy & administer contracts,
/// returning it alongside the signer's address.
pub async fn setup_client(
    priv_key: &str,
    rpc_url: &str,
) -> Result<(DynProvider, Address), ScriptError> {
    let url = Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let signer = PrivateKeySigner::from_str(priv_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let address = signer.address();

    let provider = DynProvider::new(ProviderBuilder::new().wallet(signer).connect_http(url));

    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let balance = provider
        .get_balance(address)
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    info!(chain_id, account = %address, balance = %format_ether(balance), "connected");

    Ok((provider, address))
}

/// Sets up a client which can only read from the chain
pub fn setup_read_client(rpc_url: &str) -> Result<DynProvider, ScriptError> {
    let url = Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    Ok(DynProvider::new(ProviderBuilder::new().connect_http(url)))
}

/// Read an address stored in the given storage slot of `contract`
pub async fn read_address_slot(
    provider: &DynProvider,
    contract: Address,
    slot: &str,
) -> Result<Address, ScriptError> {
    let slot = U256::from_str(slot).map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;
    let word = provider
        .get_storage_at(contract, slot)
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
        .to_be_bytes::<NUM_BYTES_STORAGE_SLOT>();

    Ok(Address::from_slice(&word[NUM_BYTES_STORAGE_SLOT - NUM_BYTES_ADDRESS..]))
}

/// ABI-encode the constructor arguments of a `TransparentUpgradeableProxy`:
/// `(address _logic, address initialOwner, bytes _data)`
pub fn proxy_constructor_args(
    implementation: Address,
    admin_owner: Address,
    init_calldata: Bytes,
) -> Bytes {
    (implementation, admin_owner, init_calldata).abi_encode_params().into()
}

/// The candidate locations of a contract's compilation artifact.
///
/// Forge writes `<dir>/<Name>.sol/<Name>.json`, flat layouts use `<dir>/<Name>.json`.
fn artifact_paths(artifacts_dir: &Path, contract_name: &str) -> [PathBuf; 2] {
    let file_name = format!("{contract_name}.{ARTIFACT_EXTENSION}");
    [
        artifacts_dir.join(format!("{contract_name}.sol")).join(&file_name),
        artifacts_dir.join(file_name),
    ]
}

/// Load the creation bytecode of `contract_name` from the artifacts directory
pub fn load_creation_bytecode(
    artifacts_dir: &Path,
    contract_name: &str,
) -> Result<Bytes, ScriptError> {
    let path = artifact_paths(artifacts_dir, contract_name)
        .into_iter()
        .find(|p| p.exists())
        .ok_or_else(|| {
            ScriptError::ArtifactParsing(format!(
                "no artifact for {contract_name} under {}, compile the contracts first",
                artifacts_dir.display()
            ))
        })?;

    let contents =
        fs::read_to_string(&path).map_err(|e| ScriptError::ArtifactParsing(e.to_string()))?;
    let artifact: Value = serde_json::from_str(&contents)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", path.display())))?;

    parse_creation_bytecode(&artifact)
        .map_err(|e| ScriptError::ArtifactParsing(format!("{}: {e}", path.display())))
}

/// Extract the creation bytecode from a parsed artifact.
///
/// Accepts both `"bytecode": "0x.."` and `"bytecode": { "object": "0x.." }`.
fn parse_creation_bytecode(artifact: &Value) -> Result<Bytes, String> {
    let bytecode = &artifact["bytecode"];
    let hex = bytecode
        .as_str()
        .or_else(|| bytecode["object"].as_str())
        .ok_or_else(|| "artifact has no bytecode".to_string())?;

    if hex.contains("__$") {
        return Err("bytecode has unlinked libraries".to_string());
    }

    let code = Bytes::from_str(hex).map_err(|e| e.to_string())?;
    if code.is_empty() {
        return Err("bytecode is empty, is the contract abstract?".to_string());
    }

    Ok(code)
}
