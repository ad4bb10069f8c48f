//! Tests deploying & upgrading the NFT collection

use alloy::primitives::U256;
use eyre::{ensure, Result};
use token_scripts::{
    constants::ALREADY_INITIALIZED_PATTERNS,
    framework::{ManagedContract, ProxyFramework},
    types::{ContractKind, StepOutcome},
    upgrade::UpgradeRequest,
};

use crate::{
    abis::ITestNftV2::{BaseURIUpdated, TokenURIUpdated},
    constants::{
        TEST_BASE_URI, TEST_NETWORK, TEST_NFT_NAME, TEST_NFT_SYMBOL, UPDATED_BASE_URI,
        UPGRADED_VERSION,
    },
    integration_test,
    test_args::{upgrade_request, TestArgs},
    util::{emitted, expect_failure, expect_revert, wait_for_tx_success},
};

/// Test the full collection lifecycle: mint, upgrade, update & batch mint
async fn test_nft_upgrade_scenario(args: TestArgs) -> Result<()> {
    let (_dir, store) = args.fresh_store()?;
    let deployed = args.deploy_nft(&store).await?;
    let proxy = deployed.record.proxy_address;
    let nft = args.nft(proxy);

    ensure!(nft.name().call().await? == TEST_NFT_NAME);
    ensure!(nft.symbol().call().await? == TEST_NFT_SYMBOL);
    ensure!(deployed.record.base_uri() == TEST_BASE_URI);
    ensure!(nft.totalMinted().call().await? == U256::ZERO);

    let holder = args.stranger_addr();
    wait_for_tx_success(nft.safeMint(holder)).await?;
    wait_for_tx_success(nft.safeMint(args.deployer())).await?;

    let outcome = args
        .upgrade(&store, ContractKind::Nft, Some("BatchUpdate"), Some("BATCH"), true)
        .await?;
    ensure!(outcome.record.proxy_address == proxy);
    ensure!(outcome.init_v2 == Some(StepOutcome::Success));
    ensure!(outcome.metadata_update == Some(StepOutcome::Success));

    // Upgraded state
    ensure!(nft.version().call().await? == UPGRADED_VERSION);
    ensure!(nft.name().call().await? == "BatchUpdate");
    ensure!(nft.symbol().call().await? == "BATCH");
    ensure!(nft.owner().call().await? == args.deployer());
    ensure!(nft.ownerOf(U256::from(0)).call().await? == holder);
    ensure!(nft.ownerOf(U256::from(1)).call().await? == args.deployer());
    ensure!(nft.totalMinted().call().await? == U256::from(2));

    wait_for_tx_success(nft.batchMint(holder, U256::from(5))).await?;
    ensure!(nft.totalMinted().call().await? == U256::from(7));
    ensure!(nft.ownerOf(U256::from(6)).call().await? == holder);

    let record = store.load(TEST_NETWORK, ContractKind::Nft)?;
    ensure!(record.name() == "BatchUpdate" && record.symbol() == "BATCH");
    ensure!(record.base_uri() == TEST_BASE_URI);
    ensure!(nft.baseURI().call().await? == TEST_BASE_URI);
    Ok(())
}
integration_test!(test_nft_upgrade_scenario);

/// Test that a repeated `initializeV2()` is reported as already done
async fn test_repeated_initialize_v2_tolerated(args: TestArgs) -> Result<()> {
    let (_dir, store) = args.fresh_store()?;
    let deployed = args.deploy_nft(&store).await?;
    let proxy = deployed.record.proxy_address;
    let nft = args.nft(proxy);
    wait_for_tx_success(nft.safeMint(args.deployer())).await?;

    let outcome = args.upgrade(&store, ContractKind::Nft, None, None, true).await?;
    ensure!(outcome.init_v2 == Some(StepOutcome::Success));

    let contract = args.framework.contract(ContractKind::Nft, proxy);
    let repeated =
        StepOutcome::classify(contract.initialize_v2().await, &ALREADY_INITIALIZED_PATTERNS);
    ensure!(repeated == StepOutcome::AlreadyDone, "second initializeV2: {repeated}");

    ensure!(nft.totalMinted().call().await? == U256::from(1));
    ensure!(nft.name().call().await? == TEST_NFT_NAME);
    Ok(())
}
integration_test!(test_repeated_initialize_v2_tolerated);

/// Test minting through the scripts' contract handle
async fn test_mint_through_handle(args: TestArgs) -> Result<()> {
    let (_dir, store) = args.fresh_store()?;
    let deployed = args.deploy_nft(&store).await?;
    let contract = args.framework.contract(ContractKind::Nft, deployed.record.proxy_address);

    contract.safe_mint(args.deployer()).await?;
    ensure!(contract.supply().await? == U256::from(1));
    ensure!(args.nft(contract.address()).ownerOf(U256::ZERO).call().await? == args.deployer());
    Ok(())
}
integration_test!(test_mint_through_handle);

/// Test that per-token URIs are joined onto the base URI
async fn test_mint_with_uri(args: TestArgs) -> Result<()> {
    let (_dir, store) = args.fresh_store()?;
    let deployed = args.deploy_nft(&store).await?;
    let nft = args.nft(deployed.record.proxy_address);
    let holder = args.stranger_addr();

    wait_for_tx_success(nft.safeMintWithURI(holder, "ipfs://QmTest123".to_string())).await?;
    wait_for_tx_success(nft.safeMint(holder)).await?;
    ensure!(nft.totalMinted().call().await? == U256::from(2));
    ensure!(nft.ownerOf(U256::ZERO).call().await? == holder);

    let with_uri = nft.tokenURI(U256::ZERO).call().await?;
    ensure!(with_uri.contains("ipfs://QmTest123"), "token 0 URI: {with_uri}");
    let plain = nft.tokenURI(U256::from(1)).call().await?;
    ensure!(plain == format!("{TEST_BASE_URI}1"), "token 1 URI: {plain}");
    Ok(())
}
integration_test!(test_mint_with_uri);

/// Test that minting & re-initializing are out of a stranger's reach
async fn test_collection_calls_are_owner_only(args: TestArgs) -> Result<()> {
    let (_dir, store) = args.fresh_store()?;
    let deployed = args.deploy_nft(&store).await?;
    let proxy = deployed.record.proxy_address;
    let nft = args.nft(proxy);
    let stranger = args.stranger_nft(proxy);

    expect_failure(stranger.safeMint(args.stranger_addr())).await?;
    ensure!(nft.totalMinted().call().await? == U256::ZERO);

    let reinit = nft.initialize(
        "Hijacked".to_string(),
        "HJK".to_string(),
        "https://hack.com/".to_string(),
        args.stranger_addr(),
    );
    expect_failure(reinit).await?;
    ensure!(nft.owner().call().await? == args.deployer());
    ensure!(nft.name().call().await? == TEST_NFT_NAME);

    wait_for_tx_success(nft.safeMint(args.deployer())).await?;
    ensure!(nft.ownerOf(U256::ZERO).call().await? == args.deployer());
    Ok(())
}
integration_test!(test_collection_calls_are_owner_only);

/// Test the bounds of batch minting on the upgraded collection
async fn test_batch_mint_bounds(args: TestArgs) -> Result<()> {
    let (_dir, store) = args.fresh_store()?;
    let deployed = args.deploy_nft(&store).await?;
    args.upgrade(&store, ContractKind::Nft, None, None, true).await?;
    let nft = args.nft(deployed.record.proxy_address);
    let holder = args.stranger_addr();

    expect_revert(nft.batchMint(holder, U256::ZERO), "Amount must be greater than 0").await?;
    expect_revert(nft.batchMint(holder, U256::from(101)), "Max 100 per batch").await?;
    ensure!(nft.totalMinted().call().await? == U256::ZERO);

    wait_for_tx_success(nft.batchMint(holder, U256::from(3))).await?;
    ensure!(nft.totalMinted().call().await? == U256::from(3));
    ensure!(nft.ownerOf(U256::from(2)).call().await? == holder);
    Ok(())
}
integration_test!(test_batch_mint_bounds);

/// Test setting individual & batched token URIs on the upgraded collection
async fn test_token_uri_management(args: TestArgs) -> Result<()> {
    let (_dir, store) = args.fresh_store()?;
    let deployed = args.deploy_nft(&store).await?;
    let nft = args.nft(deployed.record.proxy_address);
    wait_for_tx_success(nft.safeMint(args.stranger_addr())).await?;
    wait_for_tx_success(nft.safeMint(args.deployer())).await?;
    args.upgrade(&store, ContractKind::Nft, None, None, true).await?;

    let receipt =
        wait_for_tx_success(nft.setTokenURI(U256::ZERO, "ipfs://NewMetadata".to_string()))
            .await?;
    ensure!(emitted::<TokenURIUpdated>(&receipt), "no TokenURIUpdated event");
    ensure!(nft.tokenURI(U256::ZERO).call().await?.contains("ipfs://NewMetadata"));

    let ids = vec![U256::ZERO, U256::from(1)];
    let uris = vec!["ipfs://meta0".to_string(), "ipfs://meta1".to_string()];
    wait_for_tx_success(nft.batchSetTokenURI(ids, uris)).await?;
    ensure!(nft.tokenURI(U256::ZERO).call().await?.contains("ipfs://meta0"));
    ensure!(nft.tokenURI(U256::from(1)).call().await?.contains("ipfs://meta1"));

    expect_failure(nft.setTokenURI(U256::from(999), "ipfs://test".to_string())).await?;
    Ok(())
}
integration_test!(test_token_uri_management);

/// Test that a base URI override given to the upgrade lands on-chain & in the record
async fn test_base_uri_override_through_upgrade(args: TestArgs) -> Result<()> {
    let (_dir, store) = args.fresh_store()?;
    let deployed = args.deploy_nft(&store).await?;
    let proxy = deployed.record.proxy_address;
    let nft = args.nft(proxy);
    wait_for_tx_success(nft.safeMint(args.deployer())).await?;

    let req = UpgradeRequest {
        base_uri: Some(UPDATED_BASE_URI.to_string()),
        ..upgrade_request(ContractKind::Nft, None, None, true)
    };
    let outcome = args.upgrade_with(&store, &req).await?;

    ensure!(outcome.base_uri_update == Some(StepOutcome::Success));
    ensure!(outcome.metadata_update.is_none());
    ensure!(nft.baseURI().call().await? == UPDATED_BASE_URI);
    ensure!(nft.tokenURI(U256::ZERO).call().await? == format!("{UPDATED_BASE_URI}0"));
    ensure!(store.load(TEST_NETWORK, ContractKind::Nft)?.base_uri() == UPDATED_BASE_URI);

    let receipt = wait_for_tx_success(nft.setBaseURI(TEST_BASE_URI.to_string())).await?;
    ensure!(emitted::<BaseURIUpdated>(&receipt), "no BaseURIUpdated event");
    expect_failure(args.stranger_nft(proxy).setBaseURI("https://hack.com/".to_string())).await?;
    ensure!(nft.baseURI().call().await? == TEST_BASE_URI);
    Ok(())
}
integration_test!(test_base_uri_override_through_upgrade);

/// Test that transfers & approvals keep working after the upgrade
async fn test_transfer_and_approve_after_upgrade(args: TestArgs) -> Result<()> {
    let (_dir, store) = args.fresh_store()?;
    let deployed = args.deploy_nft(&store).await?;
    let proxy = deployed.record.proxy_address;
    let nft = args.nft(proxy);
    let stranger = args.stranger_nft(proxy);
    wait_for_tx_success(nft.safeMint(args.stranger_addr())).await?;
    wait_for_tx_success(nft.safeMint(args.deployer())).await?;
    args.upgrade(&store, ContractKind::Nft, None, None, true).await?;

    let first = U256::ZERO;
    wait_for_tx_success(stranger.transferFrom(args.stranger_addr(), args.deployer(), first))
        .await?;
    ensure!(nft.ownerOf(first).call().await? == args.deployer());

    let second = U256::from(1);
    wait_for_tx_success(nft.approve(args.stranger_addr(), second)).await?;
    ensure!(nft.getApproved(second).call().await? == args.stranger_addr());
    wait_for_tx_success(stranger.transferFrom(args.deployer(), args.stranger_addr(), second))
        .await?;
    ensure!(nft.ownerOf(second).call().await? == args.stranger_addr());

    wait_for_tx_success(nft.safeMint(args.stranger_addr())).await?;
    ensure!(nft.ownerOf(U256::from(2)).call().await? == args.stranger_addr());
    ensure!(nft.totalMinted().call().await? == U256::from(3));
    Ok(())
}
integration_test!(test_transfer_and_approve_after_upgrade);
