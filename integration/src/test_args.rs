//! Defines arguments passed to each test

use std::path::PathBuf;

use alloy::{primitives::Address, providers::DynProvider};
use eyre::Result;
use tempfile::TempDir;
use token_scripts::{
    chain::AlloyFramework,
    deploy::{deploy_proxy, DeployOutcome, DeployRequest, Initializer},
    framework::ProxyFramework,
    record::DeploymentStore,
    types::ContractKind,
    upgrade::{upgrade_proxy, UpgradeOutcome, UpgradeRequest},
    utils::setup_client,
};

use crate::{
    abis::{ITestNftV2::ITestNftV2Instance, ITestTokenV2::ITestTokenV2Instance},
    constants::{TEST_BASE_URI, TEST_NETWORK, TEST_NFT_NAME, TEST_NFT_SYMBOL},
    CliArgs,
};

/// The arguments provided to each integration test
#[derive(Clone)]
pub(crate) struct TestArgs {
    /// The framework signing as the deployer
    pub framework: AlloyFramework,
    /// A framework signing as an account which owns nothing
    pub stranger: AlloyFramework,
}

impl TestArgs {
    /// Connect both accounts to the devnet
    pub async fn connect(cli_args: &CliArgs) -> Result<Self> {
        let (provider, signer) = setup_client(&cli_args.pkey, &cli_args.rpc_url).await?;
        let framework = AlloyFramework::new(provider, signer, cli_args.artifacts.clone());

        let (provider, signer) = setup_client(&cli_args.stranger_pkey, &cli_args.rpc_url).await?;
        let stranger = AlloyFramework::new(provider, signer, cli_args.artifacts.clone());

        Ok(Self { framework, stranger })
    }

    /// Get the deployer's provider
    pub fn provider(&self) -> DynProvider {
        self.framework.provider().clone()
    }

    /// Get the address of the deployer
    pub fn deployer(&self) -> Address {
        self.framework.signer()
    }

    /// Get the address of the stranger
    pub fn stranger_addr(&self) -> Address {
        self.stranger.signer()
    }

    // --- Records --- //

    /// Create an empty record store, removed when the directory is dropped
    pub fn fresh_store(&self) -> Result<(TempDir, DeploymentStore)> {
        let dir = TempDir::new()?;
        let store = DeploymentStore::new(PathBuf::from(dir.path()));
        Ok((dir, store))
    }

    // --- Contracts --- //

    /// A token handle at `address`, called by the deployer
    pub fn token(&self, address: Address) -> ITestTokenV2Instance<DynProvider> {
        ITestTokenV2Instance::new(address, self.provider())
    }

    /// A collection handle at `address`, called by the deployer
    pub fn nft(&self, address: Address) -> ITestNftV2Instance<DynProvider> {
        ITestNftV2Instance::new(address, self.provider())
    }

    /// A token handle at `address`, called by the stranger
    pub fn stranger_token(&self, address: Address) -> ITestTokenV2Instance<DynProvider> {
        ITestTokenV2Instance::new(address, self.stranger.provider().clone())
    }

    /// A collection handle at `address`, called by the stranger
    pub fn stranger_nft(&self, address: Address) -> ITestNftV2Instance<DynProvider> {
        ITestNftV2Instance::new(address, self.stranger.provider().clone())
    }

    // --- Orchestration --- //

    /// Deploy a token owned by the deployer, which also receives the supply
    pub async fn deploy_token(
        &self,
        store: &DeploymentStore,
        name: &str,
        symbol: &str,
    ) -> Result<DeployOutcome> {
        let req = DeployRequest {
            network: TEST_NETWORK.to_string(),
            initializer: Initializer::Token {
                name: name.to_string(),
                symbol: symbol.to_string(),
                recipient: self.deployer(),
                owner: self.deployer(),
            },
            smoke_mint: false,
        };

        Ok(deploy_proxy(&self.framework, store, &req).await?)
    }

    /// Deploy the test collection owned by the deployer, without minting
    pub async fn deploy_nft(&self, store: &DeploymentStore) -> Result<DeployOutcome> {
        let req = DeployRequest {
            network: TEST_NETWORK.to_string(),
            initializer: Initializer::Nft {
                name: TEST_NFT_NAME.to_string(),
                symbol: TEST_NFT_SYMBOL.to_string(),
                base_uri: TEST_BASE_URI.to_string(),
                owner: self.deployer(),
            },
            smoke_mint: false,
        };

        Ok(deploy_proxy(&self.framework, store, &req).await?)
    }

    /// Upgrade the recorded deployment of `kind` as the deployer
    pub async fn upgrade(
        &self,
        store: &DeploymentStore,
        kind: ContractKind,
        name: Option<&str>,
        symbol: Option<&str>,
        init_v2: bool,
    ) -> Result<UpgradeOutcome> {
        let req = upgrade_request(kind, name, symbol, init_v2);
        self.upgrade_with(store, &req).await
    }

    /// Run an arbitrary upgrade request as the deployer
    pub async fn upgrade_with(
        &self,
        store: &DeploymentStore,
        req: &UpgradeRequest,
    ) -> Result<UpgradeOutcome> {
        Ok(upgrade_proxy(&self.framework, store, req).await?)
    }
}

/// Build an upgrade request against the test network
pub(crate) fn upgrade_request(
    kind: ContractKind,
    name: Option<&str>,
    symbol: Option<&str>,
    init_v2: bool,
) -> UpgradeRequest {
    UpgradeRequest {
        network: TEST_NETWORK.to_string(),
        kind,
        name: name.map(str::to_string),
        symbol: symbol.map(str::to_string),
        base_uri: None,
        init_v2,
    }
}
