//! Definitions of CLI arguments and commands for the token scripts

use alloy::primitives::{Address, TxHash};
use clap::{Args, Parser, Subcommand};

use crate::{
    commands::{
        check_config, deploy_nft, deploy_token, show_state, update_links, upgrade_nft,
        upgrade_token, verify_recorded,
    },
    config::{MetadataConfig, Settings},
    constants::{
        NFT_BASE_URI_ENV_VAR, NFT_BASE_URI_V2_ENV_VAR, NFT_NAME_ENV_VAR, NFT_NAME_V2_ENV_VAR,
        NFT_SYMBOL_ENV_VAR, NFT_SYMBOL_V2_ENV_VAR, TOKEN_NAME_ENV_VAR, TOKEN_NAME_V2_ENV_VAR,
        TOKEN_SYMBOL_ENV_VAR, TOKEN_SYMBOL_V2_ENV_VAR,
    },
    errors::ScriptError,
    types::ContractKind,
};

/// Deploy, upgrade & verify upgradeable token contracts
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Settings shared by every command
    #[command(flatten)]
    pub settings: Settings,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The commands exposed by the CLI
#[derive(Subcommand)]
pub enum Command {
    /// Report every missing configuration value
    CheckConfig(CheckConfigArgs),
    /// Deploy the token behind a new proxy
    DeployToken(DeployTokenArgs),
    /// Deploy the NFT collection behind a new proxy
    DeployNft(DeployNftArgs),
    /// Upgrade the recorded token proxy
    UpgradeToken(UpgradeTokenArgs),
    /// Upgrade the recorded NFT proxy
    UpgradeNft(UpgradeNftArgs),
    /// Verify a recorded deployment on the block explorer
    Verify(ContractTypeArgs),
    /// Print the on-chain state of a recorded deployment
    ShowState(ContractTypeArgs),
    /// Print the links needed to update token info on the block explorer
    UpdateLinks(UpdateLinksArgs),
}

impl Command {
    /// Run the command
    pub async fn run(self, settings: &Settings) -> Result<(), ScriptError> {
        match self {
            Command::CheckConfig(args) => check_config(settings, args),
            Command::DeployToken(args) => deploy_token(settings, args).await,
            Command::DeployNft(args) => deploy_nft(settings, args).await,
            Command::UpgradeToken(args) => upgrade_token(settings, args).await,
            Command::UpgradeNft(args) => upgrade_nft(settings, args).await,
            Command::Verify(args) => verify_recorded(settings, args).await,
            Command::ShowState(args) => show_state(settings, args).await,
            Command::UpdateLinks(args) => update_links(settings, args),
        }
    }
}

/// Check the configuration
#[derive(Args)]
pub struct CheckConfigArgs {
    /// The metadata deployments would use
    #[command(flatten)]
    pub metadata: MetadataConfig,
}

/// Deploy the token.
///
/// Concretely, this deploys the `TestToken` implementation behind a
/// [`TransparentUpgradeableProxy`](https://docs.openzeppelin.com/contracts/5.x/api/proxy#transparent_proxy),
/// which itself deploys a `ProxyAdmin` contract, and initializes it in the
/// proxy's constructor.
#[derive(Args)]
pub struct DeployTokenArgs {
    /// The token name, defaults to `testToken`
    #[arg(long, env = TOKEN_NAME_ENV_VAR)]
    pub name: Option<String>,

    /// The token symbol, defaults to `MTK`
    #[arg(long, env = TOKEN_SYMBOL_ENV_VAR)]
    pub symbol: Option<String>,

    /// The account receiving the initial supply, defaults to the deployer
    #[arg(long)]
    pub recipient: Option<Address>,

    /// The owner of both the token and its proxy admin, defaults to the deployer
    #[arg(long)]
    pub owner: Option<Address>,

    /// Skip block explorer verification
    #[arg(long)]
    pub skip_verify: bool,
}

/// Deploy the NFT collection
#[derive(Args)]
pub struct DeployNftArgs {
    /// The collection name, defaults to `TestNFT`
    #[arg(long, env = NFT_NAME_ENV_VAR)]
    pub name: Option<String>,

    /// The collection symbol, defaults to `TNFT`
    #[arg(long, env = NFT_SYMBOL_ENV_VAR)]
    pub symbol: Option<String>,

    /// The base URI of token metadata, defaults to empty
    #[arg(long, env = NFT_BASE_URI_ENV_VAR)]
    pub base_uri: Option<String>,

    /// The owner of both the collection and its proxy admin, defaults to the deployer
    #[arg(long)]
    pub owner: Option<Address>,

    /// Do not mint a test token to the deployer after deploying
    #[arg(long)]
    pub skip_smoke_mint: bool,

    /// Skip block explorer verification
    #[arg(long)]
    pub skip_verify: bool,
}

/// Upgrade the token to `TestTokenV2`
#[derive(Args)]
pub struct UpgradeTokenArgs {
    /// The name to set after upgrading, unchanged if unset
    #[arg(long, env = TOKEN_NAME_V2_ENV_VAR)]
    pub name: Option<String>,

    /// The symbol to set after upgrading, unchanged if unset
    #[arg(long, env = TOKEN_SYMBOL_V2_ENV_VAR)]
    pub symbol: Option<String>,

    /// Call `initializeV2()` after upgrading
    #[arg(long)]
    pub init_v2: bool,

    /// Skip block explorer verification
    #[arg(long)]
    pub skip_verify: bool,
}

/// Upgrade the NFT collection to `TestNftV2`
#[derive(Args)]
pub struct UpgradeNftArgs {
    /// The name to set after upgrading, unchanged if unset
    #[arg(long, env = NFT_NAME_V2_ENV_VAR)]
    pub name: Option<String>,

    /// The symbol to set after upgrading, unchanged if unset
    #[arg(long, env = NFT_SYMBOL_V2_ENV_VAR)]
    pub symbol: Option<String>,

    /// The base URI to set after upgrading, unchanged if unset
    #[arg(long, env = NFT_BASE_URI_V2_ENV_VAR)]
    pub base_uri: Option<String>,

    /// Do not call `initializeV2()` after upgrading
    #[arg(long)]
    pub skip_init_v2: bool,

    /// Skip block explorer verification
    #[arg(long)]
    pub skip_verify: bool,
}

/// Select a recorded deployment
#[derive(Args)]
pub struct ContractTypeArgs {
    /// The kind of contract
    #[arg(long, value_enum)]
    pub contract_type: ContractKind,
}

/// Print the token info update reference
#[derive(Args)]
pub struct UpdateLinksArgs {
    /// The kind of contract
    #[arg(long, value_enum)]
    pub contract_type: ContractKind,

    /// The hash of the upgrade transaction, linked if given
    #[arg(long)]
    pub upgrade_tx: Option<TxHash>,
}
