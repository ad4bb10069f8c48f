//! Resolution & validation of the scripts' configuration
//!
//! Every value can be given as a flag or through the environment; a `.env`
//! file in the working directory is loaded before the flags are parsed.

use std::{
    fmt::{self, Display},
    path::PathBuf,
};

use clap::Args;

use crate::{
    constants::{
        ARTIFACTS_DIR_ENV_VAR, DEFAULT_ARTIFACTS_DIR, DEFAULT_DEPLOYMENTS_DIR,
        DEFAULT_EXPLORER_URL, DEFAULT_LOCAL_NETWORKS, DEFAULT_NETWORK, DEPLOYMENTS_DIR_ENV_VAR,
        ETHERSCAN_API_KEY_ENV_VAR, EXPLORER_URL_ENV_VAR, LOCAL_NETWORKS_ENV_VAR, NETWORK_ENV_VAR,
        NFT_BASE_URI_ENV_VAR, NFT_NAME_ENV_VAR, NFT_SYMBOL_ENV_VAR, PRIVATE_KEY_ENV_VAR,
        RPC_URL_ENV_VAR, TOKEN_NAME_ENV_VAR, TOKEN_SYMBOL_ENV_VAR,
    },
    errors::ScriptError,
};

/// Treat empty strings as absent
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Settings shared by every command
#[derive(Args, Clone, Debug)]
pub struct Settings {
    /// Private key of the deployer
    #[arg(short, long, env = PRIVATE_KEY_ENV_VAR, hide_env_values = true, global = true)]
    pub priv_key: Option<String>,

    /// Network RPC URL
    #[arg(short, long, env = RPC_URL_ENV_VAR, global = true)]
    pub rpc_url: Option<String>,

    /// The name of the target network, records are kept per network
    #[arg(short, long, env = NETWORK_ENV_VAR, default_value = DEFAULT_NETWORK, global = true)]
    pub network: String,

    /// Block explorer API key, verification is skipped without one
    #[arg(long, env = ETHERSCAN_API_KEY_ENV_VAR, hide_env_values = true, global = true)]
    pub etherscan_api_key: Option<String>,

    /// Networks which are never verified on an explorer
    #[arg(
        long,
        env = LOCAL_NETWORKS_ENV_VAR,
        value_delimiter = ',',
        default_value = DEFAULT_LOCAL_NETWORKS,
        global = true
    )]
    pub local_networks: Vec<String>,

    /// Directory holding the deployment records
    #[arg(
        long,
        env = DEPLOYMENTS_DIR_ENV_VAR,
        default_value = DEFAULT_DEPLOYMENTS_DIR,
        global = true
    )]
    pub deployments_dir: PathBuf,

    /// Directory holding the compilation artifacts
    #[arg(
        long,
        env = ARTIFACTS_DIR_ENV_VAR,
        default_value = DEFAULT_ARTIFACTS_DIR,
        global = true
    )]
    pub artifacts_dir: PathBuf,

    /// Base URL of the block explorer used in printed links
    #[arg(
        long,
        env = EXPLORER_URL_ENV_VAR,
        default_value = DEFAULT_EXPLORER_URL,
        global = true
    )]
    pub explorer_url: String,
}

/// The values needed to sign & broadcast transactions
#[derive(Clone, Debug)]
pub struct Credentials {
    /// The deployer's private key
    pub priv_key: String,
    /// The network RPC URL
    pub rpc_url: String,
}

impl Settings {
    /// The signing credentials, or every missing one at once
    pub fn require_credentials(&self) -> Result<Credentials, ScriptError> {
        let priv_key = non_empty(self.priv_key.clone());
        let rpc_url = non_empty(self.rpc_url.clone());

        match (priv_key, rpc_url) {
            (Some(priv_key), Some(rpc_url)) => Ok(Credentials { priv_key, rpc_url }),
            (priv_key, rpc_url) => {
                let mut missing = Vec::new();
                if priv_key.is_none() {
                    missing.push(PRIVATE_KEY_ENV_VAR.to_string());
                }
                if rpc_url.is_none() {
                    missing.push(RPC_URL_ENV_VAR.to_string());
                }
                Err(ScriptError::MissingConfig(missing))
            }
        }
    }

    /// The RPC URL alone, for read-only commands
    pub fn require_rpc_url(&self) -> Result<String, ScriptError> {
        non_empty(self.rpc_url.clone())
            .ok_or_else(|| ScriptError::MissingConfig(vec![RPC_URL_ENV_VAR.to_string()]))
    }

    /// The explorer API key, if one is set
    pub fn etherscan_api_key(&self) -> Option<String> {
        non_empty(self.etherscan_api_key.clone())
    }
}

/// The metadata a deployment would use, as found in the environment
#[derive(Args, Clone, Debug, Default)]
pub struct MetadataConfig {
    /// The token name
    #[arg(long, env = TOKEN_NAME_ENV_VAR)]
    pub token_name: Option<String>,

    /// The token symbol
    #[arg(long, env = TOKEN_SYMBOL_ENV_VAR)]
    pub token_symbol: Option<String>,

    /// The collection name
    #[arg(long, env = NFT_NAME_ENV_VAR)]
    pub nft_name: Option<String>,

    /// The collection symbol
    #[arg(long, env = NFT_SYMBOL_ENV_VAR)]
    pub nft_symbol: Option<String>,

    /// The collection base URI
    #[arg(long, env = NFT_BASE_URI_ENV_VAR)]
    pub nft_base_uri: Option<String>,
}

/// How a single configuration value is set
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryStatus {
    /// Set to a secret value, not echoed
    Set,
    /// Set to the given value
    Value(String),
    /// Missing & required
    Missing,
    /// Missing, the given consequence applies
    Optional(&'static str),
}

/// A single line of the configuration report
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigEntry {
    /// The section the value belongs to
    pub section: &'static str,
    /// The environment variable name
    pub name: &'static str,
    /// How the value is set
    pub status: EntryStatus,
}

/// A consolidated report of every configuration prerequisite
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigReport {
    /// The target network
    pub network: String,
    /// Every inspected value
    pub entries: Vec<ConfigEntry>,
}

impl ConfigReport {
    /// Inspect the configuration without failing on the first gap
    pub fn inspect(settings: &Settings, metadata: &MetadataConfig) -> Self {
        /// Report a displayed metadata value
        fn shown(value: &Option<String>, consequence: &'static str) -> EntryStatus {
            match non_empty(value.clone()) {
                Some(v) => EntryStatus::Value(v),
                None => EntryStatus::Optional(consequence),
            }
        }

        /// Report a secret or required value
        fn hidden(value: &Option<String>, consequence: Option<&'static str>) -> EntryStatus {
            match (non_empty(value.clone()), consequence) {
                (Some(_), _) => EntryStatus::Set,
                (None, Some(c)) => EntryStatus::Optional(c),
                (None, None) => EntryStatus::Missing,
            }
        }

        let entry = |section, name, status| ConfigEntry { section, name, status };
        let entries = vec![
            entry("Token", TOKEN_NAME_ENV_VAR, shown(&metadata.token_name, "default used")),
            entry("Token", TOKEN_SYMBOL_ENV_VAR, shown(&metadata.token_symbol, "default used")),
            entry("NFT", NFT_NAME_ENV_VAR, shown(&metadata.nft_name, "default used")),
            entry("NFT", NFT_SYMBOL_ENV_VAR, shown(&metadata.nft_symbol, "default used")),
            entry("NFT", NFT_BASE_URI_ENV_VAR, shown(&metadata.nft_base_uri, "empty base URI")),
            entry("Network", PRIVATE_KEY_ENV_VAR, hidden(&settings.priv_key, None)),
            entry("Network", RPC_URL_ENV_VAR, hidden(&settings.rpc_url, None)),
            entry(
                "Explorer",
                ETHERSCAN_API_KEY_ENV_VAR,
                hidden(&settings.etherscan_api_key, Some("contracts won't be verified")),
            ),
        ];

        Self { network: settings.network.clone(), entries }
    }

    /// The names of every missing required value
    pub fn missing(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|e| e.status == EntryStatus::Missing)
            .map(|e| e.name)
            .collect()
    }

    /// Whether every required value is present
    pub fn is_ready(&self) -> bool {
        self.missing().is_empty()
    }

    /// Whether verification will be skipped for lack of an API key
    pub fn verification_disabled(&self) -> bool {
        self.entries.iter().any(|e| {
            e.name == ETHERSCAN_API_KEY_ENV_VAR && matches!(e.status, EntryStatus::Optional(_))
        })
    }
}

impl Display for ConfigReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut section = "";
        for entry in &self.entries {
            if entry.section != section {
                section = entry.section;
                writeln!(f, "{section} configuration:")?;
            }

            match &entry.status {
                EntryStatus::Set => writeln!(f, "  {}: set", entry.name)?,
                EntryStatus::Value(v) => writeln!(f, "  {}: {v}", entry.name)?,
                EntryStatus::Missing => writeln!(f, "  {}: NOT SET", entry.name)?,
                EntryStatus::Optional(c) => writeln!(f, "  {}: not set ({c})", entry.name)?,
            }
        }

        if self.is_ready() {
            write!(f, "Ready to deploy to {}", self.network)
        } else {
            write!(f, "Missing required configuration: {}", self.missing().join(", "))
        }
    }
}
