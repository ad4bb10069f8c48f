//! Upgrading a recorded proxy to its next implementation
//!
//! Only loading the record, the ownership check and the upgrade itself can
//! fail the operation. Once the upgrade is mined the record is always saved:
//! the follow-up calls (`initializeV2`, the metadata update, `setBaseURI`) are
//! each isolated and reported as [`StepOutcome`]s.

use std::path::PathBuf;

use alloy::primitives::{Address, TxHash};
use chrono::Utc;
use tracing::{info, warn};

use crate::{
    constants::{ALREADY_INITIALIZED_PATTERNS, DEFAULT_UPGRADED_VERSION},
    errors::ScriptError,
    framework::{read_snapshot, ManagedContract, ProxyFramework, UpgradeReceipt},
    record::{DeploymentRecord, DeploymentStore, RecordMetadata},
    types::{ContractKind, ContractSnapshot, StepOutcome},
};

/// A request to upgrade the recorded deployment of `kind` on `network`
#[derive(Clone, Debug)]
pub struct UpgradeRequest {
    /// The network the record is kept under
    pub network: String,
    /// The kind of contract to upgrade
    pub kind: ContractKind,
    /// The name to set after upgrading, `None` keeps the current one
    pub name: Option<String>,
    /// The symbol to set after upgrading, `None` keeps the current one
    pub symbol: Option<String>,
    /// The base URI to set after upgrading, collections only
    pub base_uri: Option<String>,
    /// Whether to call `initializeV2()` after upgrading
    pub init_v2: bool,
}

/// The name & symbol before and after the upgrade
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataPlan {
    /// The current name, on-chain if readable
    pub current_name: String,
    /// The current symbol, on-chain if readable
    pub current_symbol: String,
    /// The name to end up with
    pub target_name: String,
    /// The symbol to end up with
    pub target_symbol: String,
}

impl MetadataPlan {
    /// Resolve the targets: an override wins, otherwise the cached value is kept
    pub fn new(
        record: &DeploymentRecord,
        snapshot: Option<&ContractSnapshot>,
        name: Option<&str>,
        symbol: Option<&str>,
    ) -> Self {
        let (current_name, current_symbol) = match snapshot {
            Some(s) => (s.name.clone(), s.symbol.clone()),
            None => (record.name().to_string(), record.symbol().to_string()),
        };

        Self {
            target_name: name.unwrap_or(record.name()).to_string(),
            target_symbol: symbol.unwrap_or(record.symbol()).to_string(),
            current_name,
            current_symbol,
        }
    }

    /// Whether the name changes
    pub fn name_changes(&self) -> bool {
        self.target_name != self.current_name
    }

    /// Whether the symbol changes
    pub fn symbol_changes(&self) -> bool {
        self.target_symbol != self.current_symbol
    }

    /// Whether a metadata update is needed at all
    pub fn needs_update(&self) -> bool {
        self.name_changes() || self.symbol_changes()
    }

    /// Log what will change
    fn log(&self) {
        if self.name_changes() {
            info!(from = %self.current_name, to = %self.target_name, "name will change");
        } else {
            info!(name = %self.current_name, "name unchanged");
        }

        if self.symbol_changes() {
            info!(from = %self.current_symbol, to = %self.target_symbol, "symbol will change");
        } else {
            info!(symbol = %self.current_symbol, "symbol unchanged");
        }
    }
}

/// Everything learned while upgrading
#[derive(Clone, Debug)]
pub struct UpgradeOutcome {
    /// The record before the upgrade
    pub previous: DeploymentRecord,
    /// The record that was persisted
    pub record: DeploymentRecord,
    /// Where the record was persisted
    pub record_path: PathBuf,
    /// The upgrade transaction
    pub receipt: UpgradeReceipt,
    /// The metadata changes that were planned
    pub plan: MetadataPlan,
    /// The result of `initializeV2()`, if requested
    pub init_v2: Option<StepOutcome>,
    /// The result of the metadata update, if one was needed
    pub metadata_update: Option<StepOutcome>,
    /// The metadata update transaction, if one was mined
    pub metadata_tx: Option<TxHash>,
    /// The result of `setBaseURI`, if requested
    pub base_uri_update: Option<StepOutcome>,
}

/// Fail unless `caller` owns the contract
fn ensure_owner(owner: Address, caller: Address) -> Result<(), ScriptError> {
    if owner != caller {
        return Err(ScriptError::NotOwner { owner, caller });
    }
    Ok(())
}

/// Log the result of an auxiliary step
fn log_step(step: &str, outcome: &StepOutcome) {
    match outcome {
        StepOutcome::Success => info!("{step} succeeded"),
        StepOutcome::AlreadyDone => info!("{step} was already done"),
        StepOutcome::Failed(reason) => warn!("{step} failed: {reason}"),
    }
}

/// Upgrade the recorded proxy, apply the requested metadata, and record the result
pub async fn upgrade_proxy<F: ProxyFramework>(
    framework: &F,
    store: &DeploymentStore,
    req: &UpgradeRequest,
) -> Result<UpgradeOutcome, ScriptError> {
    let previous = store.load(&req.network, req.kind)?;
    let proxy = previous.proxy_address;
    info!(
        kind = %req.kind,
        %proxy,
        implementation = %previous.implementation_address,
        version = previous.version(),
        "upgrading proxy"
    );

    let contract = framework.contract(req.kind, proxy);
    let before = match read_snapshot(&contract).await {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!("could not read current contract state, continuing: {e}");
            None
        }
    };

    let plan =
        MetadataPlan::new(&previous, before.as_ref(), req.name.as_deref(), req.symbol.as_deref());
    plan.log();

    // Settle ownership before sending anything whenever the owner is readable
    let caller = framework.signer();
    let owner_checked = if plan.needs_update() {
        let owner = match &before {
            Some(snapshot) => Ok(snapshot.owner),
            None => contract.owner().await,
        };
        match owner {
            Ok(owner) => {
                ensure_owner(owner, caller)?;
                true
            }
            Err(e) => {
                warn!("could not read owner before upgrading, checking again afterwards: {e}");
                false
            }
        }
    } else {
        false
    };

    let receipt = framework.upgrade_proxy(proxy, req.kind).await?;

    // The proxy is upgraded from here on, so nothing below may prevent saving the record
    let implementation = match framework.implementation_address(proxy).await {
        Ok(read) if read != receipt.implementation => {
            warn!(%read, deployed = %receipt.implementation, "proxy points elsewhere");
            read
        }
        Ok(read) => read,
        Err(e) => {
            warn!("could not read implementation slot, using the deployed address: {e}");
            receipt.implementation
        }
    };
    if implementation == previous.implementation_address {
        warn!(%implementation, "implementation address did not change");
    } else {
        info!(
            from = %previous.implementation_address,
            to = %implementation,
            "implementation changed"
        );
    }

    let init_v2 = if req.init_v2 {
        let outcome =
            StepOutcome::classify(contract.initialize_v2().await, &ALREADY_INITIALIZED_PATTERNS);
        log_step("initializeV2", &outcome);
        Some(outcome)
    } else {
        None
    };

    let mut metadata_tx = None;
    let metadata_update = if plan.needs_update() {
        let owner = if owner_checked { Ok(caller) } else { contract.owner().await };
        let outcome = match owner {
            Ok(owner) if owner != caller => {
                StepOutcome::Failed(ScriptError::NotOwner { owner, caller }.to_string())
            }
            Ok(_) => match contract.update_info(&plan.target_name, &plan.target_symbol).await {
                Ok(tx) => {
                    metadata_tx = Some(tx);
                    StepOutcome::Success
                }
                Err(e) => StepOutcome::Failed(e.to_string()),
            },
            Err(e) => StepOutcome::Failed(format!("could not read owner: {e}")),
        };
        log_step("metadata update", &outcome);
        Some(outcome)
    } else {
        info!("no name or symbol changes needed");
        None
    };

    let base_uri_update = match (req.kind, &req.base_uri) {
        (ContractKind::Nft, Some(base_uri)) => {
            let outcome = StepOutcome::classify(contract.set_base_uri(base_uri).await, &[]);
            log_step("setBaseURI", &outcome);
            Some(outcome)
        }
        (ContractKind::Token, Some(_)) => {
            warn!("tokens have no base URI, ignoring override");
            None
        }
        _ => None,
    };

    // Fall back field by field to what was known before the upgrade
    let after = match read_snapshot(&contract).await {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!("could not read upgraded contract state: {e}");
            None
        }
    };
    let name = after.as_ref().map_or_else(|| plan.current_name.clone(), |s| s.name.clone());
    let symbol = after.as_ref().map_or_else(|| plan.current_symbol.clone(), |s| s.symbol.clone());
    let version = after
        .as_ref()
        .and_then(|s| s.version.clone())
        .unwrap_or_else(|| DEFAULT_UPGRADED_VERSION.to_string());
    let base_uri = match req.kind {
        ContractKind::Token => None,
        ContractKind::Nft => after.as_ref().and_then(|s| s.base_uri.clone()).or_else(|| {
            match (&base_uri_update, &req.base_uri) {
                (Some(StepOutcome::Success), Some(uri)) => Some(uri.clone()),
                _ => Some(previous.base_uri().to_string()).filter(|uri| !uri.is_empty()),
            }
        }),
    };

    let record = previous.upgraded(
        implementation,
        RecordMetadata::new(req.kind, name, symbol, base_uri),
        version,
        caller,
        Utc::now(),
    );
    let record_path = store.save(&req.network, req.kind, &record)?;
    info!(path = %record_path.display(), version = record.version(), "deployment record updated");

    Ok(UpgradeOutcome {
        previous,
        record,
        record_path,
        receipt,
        plan,
        init_v2,
        metadata_update,
        metadata_tx,
        base_uri_update,
    })
}
