//! Deployment records: the persisted snapshot of what is deployed on each network
//!
//! One JSON file is kept per contract kind per network, named `<network>.json`
//! for tokens and `nft-<network>.json` for collections. The proxy address,
//! deployer and deployment time are fixed when the record is created; every
//! other field is a cache of on-chain state refreshed after each operation.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use alloy::primitives::{Address, Bytes};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::{
    constants::{INITIAL_VERSION, NFT_RECORD_PREFIX, RECORD_EXTENSION},
    errors::ScriptError,
    types::ContractKind,
};

/// The record of a single logical deployment behind a proxy
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    /// The network the contract lives on
    pub network: String,
    /// Kind-specific cached metadata, tagged by `contractType`
    #[serde(flatten)]
    pub metadata: RecordMetadata,
    /// The address all calls are routed through, never changes
    pub proxy_address: Address,
    /// The currently active logic contract
    pub implementation_address: Address,
    /// The `ProxyAdmin` authorized to upgrade the proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_address: Option<Address>,
    /// The ABI-encoded proxy constructor arguments, needed to verify the proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_constructor_args: Option<Bytes>,
    /// The account which deployed the proxy
    pub deployer: Address,
    /// The implementation version, absent on records written before versioning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// When the proxy was deployed
    pub deployed_at: DateTime<Utc>,
    /// When the proxy was last upgraded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgraded_at: Option<DateTime<Utc>>,
    /// The account which performed the last upgrade
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgraded_by: Option<Address>,
}

/// Cached name, symbol & URI of a deployment
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "contractType")]
pub enum RecordMetadata {
    /// Metadata of a fungible token
    #[serde(rename = "Token")]
    Token {
        /// The token name
        #[serde(rename = "tokenName")]
        name: String,
        /// The token symbol
        #[serde(rename = "tokenSymbol")]
        symbol: String,
    },
    /// Metadata of an NFT collection
    #[serde(rename = "NFT")]
    Nft {
        /// The collection name
        #[serde(rename = "nftName")]
        name: String,
        /// The collection symbol
        #[serde(rename = "nftSymbol")]
        symbol: String,
        /// The collection base URI
        #[serde(rename = "baseURI", default, skip_serializing_if = "Option::is_none")]
        base_uri: Option<String>,
    },
}

impl RecordMetadata {
    /// Build metadata of the given kind, `base_uri` is dropped for tokens
    pub fn new(kind: ContractKind, name: String, symbol: String, base_uri: Option<String>) -> Self {
        match kind {
            ContractKind::Token => RecordMetadata::Token { name, symbol },
            ContractKind::Nft => RecordMetadata::Nft { name, symbol, base_uri },
        }
    }
}

impl DeploymentRecord {
    /// The kind of contract this record describes
    pub fn kind(&self) -> ContractKind {
        match self.metadata {
            RecordMetadata::Token { .. } => ContractKind::Token,
            RecordMetadata::Nft { .. } => ContractKind::Nft,
        }
    }

    /// The cached name
    pub fn name(&self) -> &str {
        match &self.metadata {
            RecordMetadata::Token { name, .. } | RecordMetadata::Nft { name, .. } => name,
        }
    }

    /// The cached symbol
    pub fn symbol(&self) -> &str {
        match &self.metadata {
            RecordMetadata::Token { symbol, .. } | RecordMetadata::Nft { symbol, .. } => symbol,
        }
    }

    /// The cached base URI, empty if unset or not applicable
    pub fn base_uri(&self) -> &str {
        match &self.metadata {
            RecordMetadata::Nft { base_uri: Some(uri), .. } => uri,
            _ => "",
        }
    }

    /// The recorded version, records without one predate the first upgrade
    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(INITIAL_VERSION)
    }

    /// Produce the record describing this deployment after an upgrade.
    ///
    /// The proxy address, deployer & deployment time carry over untouched.
    pub fn upgraded(
        &self,
        implementation_address: Address,
        metadata: RecordMetadata,
        version: String,
        upgraded_by: Address,
        upgraded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            implementation_address,
            metadata,
            version: Some(version),
            upgraded_at: Some(upgraded_at),
            upgraded_by: Some(upgraded_by),
            ..self.clone()
        }
    }
}

/// Reads & writes deployment records under a directory
#[derive(Clone, Debug)]
pub struct DeploymentStore {
    /// The directory holding the records
    dir: PathBuf,
}

impl DeploymentStore {
    /// Create a store rooted at `dir`, the directory is created lazily on save
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory holding the records
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The path of the record for the given network & contract kind
    pub fn path(&self, network: &str, kind: ContractKind) -> PathBuf {
        let prefix = match kind {
            ContractKind::Token => "",
            ContractKind::Nft => NFT_RECORD_PREFIX,
        };
        self.dir.join(format!("{prefix}{network}.{RECORD_EXTENSION}"))
    }

    /// Load the record for the given network & contract kind.
    ///
    /// Fails with [`ScriptError::RecordNotFound`] if nothing was deployed yet.
    pub fn load(&self, network: &str, kind: ContractKind) -> Result<DeploymentRecord, ScriptError> {
        let path = self.path(network, kind);
        if !path.exists() {
            return Err(ScriptError::RecordNotFound(path.display().to_string()));
        }

        let contents =
            fs::read_to_string(&path).map_err(|e| ScriptError::ReadDeployments(e.to_string()))?;
        let record: DeploymentRecord = serde_json::from_str(&contents)
            .map_err(|e| ScriptError::ReadDeployments(format!("{}: {e}", path.display())))?;

        if record.kind() != kind {
            return Err(ScriptError::ReadDeployments(format!(
                "{} holds a {} record, expected {kind}",
                path.display(),
                record.kind()
            )));
        }

        Ok(record)
    }

    /// Write the record for the given network & contract kind, replacing any
    /// previous contents.
    ///
    /// The record is written to a temporary file in the same directory and
    /// renamed over the target, so readers never observe a partial write.
    pub fn save(
        &self,
        network: &str,
        kind: ContractKind,
        record: &DeploymentRecord,
    ) -> Result<PathBuf, ScriptError> {
        fs::create_dir_all(&self.dir).map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;

        let path = self.path(network, kind);
        let contents = serde_json::to_string_pretty(record)
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;

        let mut tmp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
        tmp.write_all(contents.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
        tmp.persist(&path).map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;

        debug!(path = %path.display(), "wrote deployment record");
        Ok(path)
    }
}
