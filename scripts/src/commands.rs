//! Implementations of the various token scripts

use std::future::pending;

use alloy::{
    primitives::{utils::format_ether, Address, U256},
    providers::{DynProvider, Provider},
};
use itertools::Itertools;
use tracing::{info, warn};

use crate::{
    chain::{AlloyFramework, OnChainContract},
    cli::{
        CheckConfigArgs, ContractTypeArgs, DeployNftArgs, DeployTokenArgs, UpdateLinksArgs,
        UpgradeNftArgs, UpgradeTokenArgs,
    },
    config::{non_empty, ConfigReport, Settings},
    confirmations::ConfirmationPolicy,
    constants::{
        DEFAULT_NFT_NAME, DEFAULT_NFT_SYMBOL, DEFAULT_TOKEN_NAME, DEFAULT_TOKEN_SYMBOL,
        PROXY_IMPLEMENTATION_STORAGE_SLOT,
    },
    deploy::{deploy_proxy, DeployOutcome, DeployRequest, Initializer},
    errors::ScriptError,
    framework::{read_snapshot, ProxyFramework},
    links::{ExplorerLinks, UpdateLinksReport},
    record::{DeploymentRecord, DeploymentStore},
    types::{ContractKind, ContractSnapshot},
    upgrade::{upgrade_proxy, UpgradeOutcome, UpgradeRequest},
    utils::{read_address_slot, setup_client, setup_read_client},
    verify::{
        verify_contracts, ForgeVerifier, VerificationPolicy, VerificationSummary,
        VerificationTarget,
    },
};

// -----------
// | HELPERS |
// -----------

/// Connect the signing framework described by the settings
async fn connect(settings: &Settings) -> Result<AlloyFramework, ScriptError> {
    let credentials = settings.require_credentials()?;
    let (provider, signer) = setup_client(&credentials.priv_key, &credentials.rpc_url).await?;
    Ok(AlloyFramework::new(provider, signer, settings.artifacts_dir.clone()))
}

/// Resolves once the user hits ctrl-c
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("could not listen for ctrl-c: {e}");
        pending::<()>().await;
    }
}

/// Format a supply figure, tokens are shown in whole units
fn format_supply(kind: ContractKind, supply: U256) -> String {
    match kind {
        ContractKind::Token => format_ether(supply),
        ContractKind::Nft => supply.to_string(),
    }
}

/// Verify `targets` if the network & configuration allow it.
/// Failures are reported, never propagated.
async fn verify_best_effort(
    settings: &Settings,
    provider: &DynProvider,
    targets: &[VerificationTarget],
    mined_block: u64,
) -> VerificationSummary {
    let policy = VerificationPolicy {
        local_networks: settings.local_networks.clone(),
        confirmations: ConfirmationPolicy::default(),
    };

    let verifier = match settings.etherscan_api_key() {
        Some(api_key) if !policy.is_local(&settings.network) => {
            match provider.get_chain_id().await {
                Ok(chain_id) => {
                    Some(ForgeVerifier::new(api_key, chain_id, settings.require_rpc_url().ok()))
                }
                Err(e) => {
                    return VerificationSummary::Aborted(format!("could not read chain id: {e}"))
                }
            }
        }
        _ => None,
    };

    let summary = verify_contracts(
        &policy,
        &settings.network,
        targets,
        verifier.as_ref(),
        provider,
        mined_block,
        ctrl_c(),
    )
    .await;
    println!("Verification: {summary}");

    summary
}

/// Describe every way the chain disagrees with a record
fn find_drift(
    record: &DeploymentRecord,
    snapshot: Option<&ContractSnapshot>,
    implementation: Address,
) -> Vec<String> {
    let mut drift = Vec::new();
    if implementation != record.implementation_address {
        drift.push(format!(
            "implementation is {implementation}, recorded {}",
            record.implementation_address
        ));
    }

    let Some(snapshot) = snapshot else {
        return drift;
    };
    if snapshot.name != record.name() {
        drift.push(format!("name is {}, recorded {}", snapshot.name, record.name()));
    }
    if snapshot.symbol != record.symbol() {
        drift.push(format!("symbol is {}, recorded {}", snapshot.symbol, record.symbol()));
    }
    if let Some(base_uri) = &snapshot.base_uri {
        if base_uri != record.base_uri() {
            drift.push(format!("base URI is {base_uri}, recorded {}", record.base_uri()));
        }
    }
    if let Some(version) = &snapshot.version {
        if version != record.version() {
            drift.push(format!("version is {version}, recorded {}", record.version()));
        }
    }

    drift
}

// ------------
// | COMMANDS |
// ------------

/// Print the configuration report, failing if anything required is missing
pub fn check_config(settings: &Settings, args: CheckConfigArgs) -> Result<(), ScriptError> {
    let report = ConfigReport::inspect(settings, &args.metadata);
    println!("{report}");

    if report.verification_disabled() {
        warn!("no explorer API key set, deployed contracts won't be verified");
    }
    if !report.is_ready() {
        return Err(ScriptError::MissingConfig(
            report.missing().into_iter().map(String::from).collect(),
        ));
    }

    Ok(())
}

/// Deploy the token behind a new proxy
pub async fn deploy_token(settings: &Settings, args: DeployTokenArgs) -> Result<(), ScriptError> {
    let framework = connect(settings).await?;
    let signer = framework.signer();
    let initializer = Initializer::Token {
        name: non_empty(args.name).unwrap_or_else(|| DEFAULT_TOKEN_NAME.to_string()),
        symbol: non_empty(args.symbol).unwrap_or_else(|| DEFAULT_TOKEN_SYMBOL.to_string()),
        recipient: args.recipient.unwrap_or(signer),
        owner: args.owner.unwrap_or(signer),
    };

    run_deploy(settings, &framework, initializer, false /* smoke_mint */, args.skip_verify).await
}

/// Deploy the NFT collection behind a new proxy
pub async fn deploy_nft(settings: &Settings, args: DeployNftArgs) -> Result<(), ScriptError> {
    let framework = connect(settings).await?;
    let initializer = Initializer::Nft {
        name: non_empty(args.name).unwrap_or_else(|| DEFAULT_NFT_NAME.to_string()),
        symbol: non_empty(args.symbol).unwrap_or_else(|| DEFAULT_NFT_SYMBOL.to_string()),
        base_uri: non_empty(args.base_uri).unwrap_or_default(),
        owner: args.owner.unwrap_or(framework.signer()),
    };

    run_deploy(settings, &framework, initializer, !args.skip_smoke_mint, args.skip_verify).await
}

/// Deploy, report & verify a proxied contract
async fn run_deploy(
    settings: &Settings,
    framework: &AlloyFramework,
    initializer: Initializer,
    smoke_mint: bool,
    skip_verify: bool,
) -> Result<(), ScriptError> {
    let store = DeploymentStore::new(&settings.deployments_dir);
    let req = DeployRequest { network: settings.network.clone(), initializer, smoke_mint };
    let outcome = deploy_proxy(framework, &store, &req).await?;
    print_deployment(&settings.explorer_url, &outcome);

    if skip_verify {
        info!("skipping verification");
        return Ok(());
    }

    let targets = VerificationTarget::recorded(&outcome.record);
    verify_best_effort(settings, framework.provider(), &targets, outcome.deployment.block_number)
        .await;

    Ok(())
}

/// Print the summary of a deployment
fn print_deployment(explorer_url: &str, outcome: &DeployOutcome) {
    let record = &outcome.record;
    let kind = record.kind();
    let links = ExplorerLinks::new(explorer_url);

    println!("\nDeployed {kind} on {}", record.network);
    println!("  Proxy:          {:#x}", record.proxy_address);
    println!("  Implementation: {:#x}", record.implementation_address);
    match record.admin_address {
        Some(admin) => println!("  Proxy admin:    {admin:#x}"),
        None => println!("  Proxy admin:    unknown"),
    }
    println!("  Deployer:       {:#x}", record.deployer);
    println!("  Name:           {}", record.name());
    println!("  Symbol:         {}", record.symbol());
    if kind == ContractKind::Nft {
        println!("  Base URI:       {}", record.base_uri());
    }
    if let Some(snapshot) = &outcome.snapshot {
        println!("  {}: {}", kind.supply_label(), format_supply(kind, snapshot.supply));
    }
    if let Some(smoke_test) = &outcome.smoke_test {
        println!("  Test mint:      {smoke_test}");
    }
    if !outcome.mismatches.is_empty() {
        println!("  Mismatches:     {}", outcome.mismatches.iter().join("; "));
    }
    println!("  Record:         {}", outcome.record_path.display());
    println!("  Deploy tx:      {}", links.tx(outcome.deployment.tx_hash));
    println!("  Explorer:       {}", links.token(record.proxy_address));
}

/// Upgrade the recorded token proxy
pub async fn upgrade_token(
    settings: &Settings,
    args: UpgradeTokenArgs,
) -> Result<(), ScriptError> {
    let req = UpgradeRequest {
        network: settings.network.clone(),
        kind: ContractKind::Token,
        name: non_empty(args.name),
        symbol: non_empty(args.symbol),
        base_uri: None,
        init_v2: args.init_v2,
    };

    run_upgrade(settings, &req, args.skip_verify).await
}

/// Upgrade the recorded NFT proxy
pub async fn upgrade_nft(settings: &Settings, args: UpgradeNftArgs) -> Result<(), ScriptError> {
    let req = UpgradeRequest {
        network: settings.network.clone(),
        kind: ContractKind::Nft,
        name: non_empty(args.name),
        symbol: non_empty(args.symbol),
        base_uri: non_empty(args.base_uri),
        init_v2: !args.skip_init_v2,
    };

    run_upgrade(settings, &req, args.skip_verify).await
}

/// Upgrade, report & verify a recorded proxy
async fn run_upgrade(
    settings: &Settings,
    req: &UpgradeRequest,
    skip_verify: bool,
) -> Result<(), ScriptError> {
    let framework = connect(settings).await?;
    let store = DeploymentStore::new(&settings.deployments_dir);
    let outcome = upgrade_proxy(&framework, &store, req).await?;
    print_upgrade(&settings.explorer_url, &outcome);

    if skip_verify {
        info!("skipping verification");
        return Ok(());
    }

    let targets = [VerificationTarget::implementation(&outcome.record)];
    verify_best_effort(settings, framework.provider(), &targets, outcome.receipt.block_number)
        .await;

    Ok(())
}

/// Print the summary of an upgrade
fn print_upgrade(explorer_url: &str, outcome: &UpgradeOutcome) {
    let record = &outcome.record;
    let links = ExplorerLinks::new(explorer_url);

    println!("\nUpgraded {} on {}", record.kind(), record.network);
    println!("  Proxy:          {:#x}", record.proxy_address);
    println!(
        "  Implementation: {:#x} -> {:#x}",
        outcome.previous.implementation_address, record.implementation_address
    );
    println!("  Version:        {} -> {}", outcome.previous.version(), record.version());
    println!("  Name:           {}", record.name());
    println!("  Symbol:         {}", record.symbol());
    if record.kind() == ContractKind::Nft {
        println!("  Base URI:       {}", record.base_uri());
    }
    if let Some(init_v2) = &outcome.init_v2 {
        println!("  initializeV2:   {init_v2}");
    }
    if let Some(update) = &outcome.metadata_update {
        println!("  Info update:    {update}");
    }
    if let Some(tx) = outcome.metadata_tx {
        println!("  Info update tx: {}", links.tx(tx));
    }
    if let Some(update) = &outcome.base_uri_update {
        println!("  setBaseURI:     {update}");
    }
    println!("  Record:         {}", outcome.record_path.display());
    println!("  Upgrade tx:     {}", links.tx(outcome.receipt.tx_hash));

    if outcome.plan.needs_update() {
        println!("\nThe name or symbol changed, explorers may need a token info update.");
        println!("Run `update-links --contract-type {}` for instructions.", record.kind());
    }
}

/// Verify the implementation & proxy of a recorded deployment
pub async fn verify_recorded(
    settings: &Settings,
    args: ContractTypeArgs,
) -> Result<(), ScriptError> {
    let store = DeploymentStore::new(&settings.deployments_dir);
    let record = store.load(&settings.network, args.contract_type)?;
    let provider = setup_read_client(&settings.require_rpc_url()?)?;

    // The contracts were mined long ago, any depth check passes right away
    let targets = VerificationTarget::recorded(&record);
    let summary = verify_best_effort(settings, &provider, &targets, 0 /* mined_block */).await;

    match summary {
        VerificationSummary::Skipped(_) => Ok(()),
        summary if summary.all_verified() => Ok(()),
        summary => Err(ScriptError::Verification(summary.to_string())),
    }
}

/// Print the on-chain state of a recorded deployment next to the record
pub async fn show_state(settings: &Settings, args: ContractTypeArgs) -> Result<(), ScriptError> {
    let kind = args.contract_type;
    let store = DeploymentStore::new(&settings.deployments_dir);
    let record = store.load(&settings.network, kind)?;
    let provider = setup_read_client(&settings.require_rpc_url()?)?;

    let proxy = record.proxy_address;
    let implementation =
        read_address_slot(&provider, proxy, PROXY_IMPLEMENTATION_STORAGE_SLOT).await?;
    let contract = OnChainContract::new(kind, proxy, provider);
    let snapshot = match read_snapshot(&contract).await {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!("could not read contract state: {e}");
            None
        }
    };

    println!("{kind} on {}", record.network);
    println!("  Proxy:          {proxy:#x}");
    println!("  Implementation: {implementation:#x}");
    if let Some(snapshot) = &snapshot {
        println!("  Name:           {}", snapshot.name);
        println!("  Symbol:         {}", snapshot.symbol);
        println!("  Owner:          {:#x}", snapshot.owner);
        println!("  {}: {}", kind.supply_label(), format_supply(kind, snapshot.supply));
        println!("  Version:        {}", snapshot.version.as_deref().unwrap_or("unavailable"));
        if let Some(base_uri) = &snapshot.base_uri {
            println!("  Base URI:       {base_uri}");
        }
    }
    println!("  Deployed at:    {}", record.deployed_at.to_rfc3339());
    if let Some(upgraded_at) = record.upgraded_at {
        println!("  Upgraded at:    {}", upgraded_at.to_rfc3339());
    }

    let drift = find_drift(&record, snapshot.as_ref(), implementation);
    for difference in &drift {
        warn!("record is out of date: {difference}");
    }
    if drift.is_empty() {
        info!("record matches the chain");
    }

    Ok(())
}

/// Print the reference for updating token info on the explorer
pub fn update_links(settings: &Settings, args: UpdateLinksArgs) -> Result<(), ScriptError> {
    let store = DeploymentStore::new(&settings.deployments_dir);
    let record = store.load(&settings.network, args.contract_type)?;
    println!("{}", UpdateLinksReport::new(&settings.explorer_url, &record, args.upgrade_tx));

    Ok(())
}
