//! Deploying a contract behind a fresh upgradeable proxy

use std::path::PathBuf;

use alloy::{
    primitives::{Address, Bytes},
    sol_types::SolCall,
};
use chrono::Utc;
use tracing::{info, warn};

use crate::{
    constants::INITIAL_VERSION,
    errors::ScriptError,
    framework::{read_snapshot, ManagedContract, ProxyDeployment, ProxyFramework},
    record::{DeploymentRecord, DeploymentStore, RecordMetadata},
    solidity::{ITestNft, ITestToken},
    types::{ContractKind, ContractSnapshot, StepOutcome},
};

/// The arguments the implementation is initialized with
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Initializer {
    /// `initialize(name, symbol, recipient, initialOwner)`
    Token {
        /// The token name
        name: String,
        /// The token symbol
        symbol: String,
        /// The account receiving the initial supply
        recipient: Address,
        /// The contract owner
        owner: Address,
    },
    /// `initialize(name, symbol, baseURI, initialOwner)`
    Nft {
        /// The collection name
        name: String,
        /// The collection symbol
        symbol: String,
        /// The base URI for token metadata
        base_uri: String,
        /// The contract owner
        owner: Address,
    },
}

impl Initializer {
    /// The kind of contract being initialized
    pub fn kind(&self) -> ContractKind {
        match self {
            Initializer::Token { .. } => ContractKind::Token,
            Initializer::Nft { .. } => ContractKind::Nft,
        }
    }

    /// The requested name
    pub fn name(&self) -> &str {
        match self {
            Initializer::Token { name, .. } | Initializer::Nft { name, .. } => name,
        }
    }

    /// The requested symbol
    pub fn symbol(&self) -> &str {
        match self {
            Initializer::Token { symbol, .. } | Initializer::Nft { symbol, .. } => symbol,
        }
    }

    /// The requested owner
    pub fn owner(&self) -> Address {
        match self {
            Initializer::Token { owner, .. } | Initializer::Nft { owner, .. } => *owner,
        }
    }

    /// The requested base URI, collections only
    pub fn base_uri(&self) -> Option<&str> {
        match self {
            Initializer::Token { .. } => None,
            Initializer::Nft { base_uri, .. } => Some(base_uri),
        }
    }

    /// Prepare the calldata of the implementation's `initialize` method
    pub fn calldata(&self) -> Bytes {
        let encoded = match self.clone() {
            Initializer::Token { name, symbol, recipient, owner } => {
                ITestToken::initializeCall::new((name, symbol, recipient, owner)).abi_encode()
            }
            Initializer::Nft { name, symbol, base_uri, owner } => {
                ITestNft::initializeCall::new((name, symbol, base_uri, owner)).abi_encode()
            }
        };
        encoded.into()
    }
}

/// A request to deploy a new proxied contract
#[derive(Clone, Debug)]
pub struct DeployRequest {
    /// The network the record is kept under
    pub network: String,
    /// How to initialize the implementation
    pub initializer: Initializer,
    /// Whether to mint a token to the deployer after deploying a collection
    pub smoke_mint: bool,
}

/// Everything learned while deploying
#[derive(Clone, Debug)]
pub struct DeployOutcome {
    /// The record that was persisted
    pub record: DeploymentRecord,
    /// Where the record was persisted
    pub record_path: PathBuf,
    /// The proxy deployment
    pub deployment: ProxyDeployment,
    /// The on-chain state right after deployment, if readable
    pub snapshot: Option<ContractSnapshot>,
    /// Descriptions of every field that differs from the request
    pub mismatches: Vec<String>,
    /// The result of the smoke-test mint, collections only
    pub smoke_test: Option<StepOutcome>,
}

/// Compare the requested metadata with what the contract reports
fn find_mismatches(initializer: &Initializer, snapshot: &ContractSnapshot) -> Vec<String> {
    let mut found = Vec::new();
    if snapshot.name != initializer.name() {
        found.push(format!("name: requested {}, got {}", initializer.name(), snapshot.name));
    }
    if snapshot.symbol != initializer.symbol() {
        found.push(format!("symbol: requested {}, got {}", initializer.symbol(), snapshot.symbol));
    }
    if snapshot.owner != initializer.owner() {
        found.push(format!("owner: requested {}, got {}", initializer.owner(), snapshot.owner));
    }
    found
}

/// Deploy a contract behind an upgradeable proxy and record it
pub async fn deploy_proxy<F: ProxyFramework>(
    framework: &F,
    store: &DeploymentStore,
    req: &DeployRequest,
) -> Result<DeployOutcome, ScriptError> {
    let kind = req.initializer.kind();
    info!(
        %kind,
        network = %req.network,
        name = req.initializer.name(),
        symbol = req.initializer.symbol(),
        "deploying proxy"
    );

    let deployment = framework
        .deploy_proxy(kind, req.initializer.owner(), req.initializer.calldata())
        .await?;
    let proxy = deployment.proxy_address;
    info!(%proxy, block = deployment.block_number, "proxy deployed");

    // The proxy is live from here on, so nothing below may prevent saving the record
    let implementation = match framework.implementation_address(proxy).await {
        Ok(read) if read != deployment.implementation => {
            warn!(%read, deployed = %deployment.implementation, "proxy points elsewhere");
            read
        }
        Ok(read) => read,
        Err(e) => {
            warn!("could not read implementation slot, using the deployed address: {e}");
            deployment.implementation
        }
    };
    let admin = match framework.admin_address(proxy).await {
        Ok(admin) => Some(admin),
        Err(e) => {
            warn!("could not read proxy admin: {e}");
            None
        }
    };
    info!(%implementation, admin = ?admin, "proxy introspected");

    let contract = framework.contract(kind, proxy);
    let snapshot = match read_snapshot(&contract).await {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!("could not read back contract state: {e}");
            None
        }
    };

    let mismatches =
        snapshot.as_ref().map(|s| find_mismatches(&req.initializer, s)).unwrap_or_default();
    for mismatch in &mismatches {
        warn!("on-chain state differs from request, {mismatch}");
    }

    let smoke_test = if kind == ContractKind::Nft && req.smoke_mint {
        let outcome = StepOutcome::classify(contract.safe_mint(framework.signer()).await, &[]);
        match &outcome {
            StepOutcome::Failed(reason) => warn!("smoke-test mint failed: {reason}"),
            _ => info!(to = %framework.signer(), "smoke-test mint succeeded"),
        }
        Some(outcome)
    } else {
        None
    };

    // On-chain values are authoritative where readable
    let (name, symbol) = match &snapshot {
        Some(s) => (s.name.clone(), s.symbol.clone()),
        None => (req.initializer.name().to_string(), req.initializer.symbol().to_string()),
    };
    let base_uri = snapshot
        .as_ref()
        .and_then(|s| s.base_uri.clone())
        .or_else(|| req.initializer.base_uri().map(str::to_string));

    let record = DeploymentRecord {
        network: req.network.clone(),
        metadata: RecordMetadata::new(kind, name, symbol, base_uri),
        proxy_address: proxy,
        implementation_address: implementation,
        admin_address: admin,
        proxy_constructor_args: Some(deployment.constructor_args.clone()),
        deployer: framework.signer(),
        version: Some(INITIAL_VERSION.to_string()),
        deployed_at: Utc::now(),
        upgraded_at: None,
        upgraded_by: None,
    };
    let record_path = store.save(&req.network, kind, &record)?;
    info!(path = %record_path.display(), "deployment record saved");

    Ok(DeployOutcome { record, record_path, deployment, snapshot, mismatches, smoke_test })
}
