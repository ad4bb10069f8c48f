//! Constants used in the deploy scripts

use std::time::Duration;

/// The name of the TransparentUpgradeableProxy artifact
///
/// Compiled from https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/transparent/TransparentUpgradeableProxy.sol
pub const PROXY_ARTIFACT: &str = "TransparentUpgradeableProxy";

/// The artifact name of the initial token implementation
pub const TOKEN_V1_ARTIFACT: &str = "TestToken";

/// The artifact name of the upgraded token implementation
pub const TOKEN_V2_ARTIFACT: &str = "TestTokenV2";

/// The artifact name of the initial NFT implementation
pub const NFT_V1_ARTIFACT: &str = "TestNft";

/// The artifact name of the upgraded NFT implementation
pub const NFT_V2_ARTIFACT: &str = "TestNftV2";

/// The extension of a compilation artifact
pub const ARTIFACT_EXTENSION: &str = "json";

/// The storage slot containing the implementation contract address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#logic-contract-address
pub const PROXY_IMPLEMENTATION_STORAGE_SLOT: &str =
    "0x360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc";

/// The storage slot containing the proxy admin contract address in the upgradeable proxy.
///
/// This is specified in EIP1967: https://eips.ethereum.org/EIPS/eip-1967#admin-address
pub const PROXY_ADMIN_STORAGE_SLOT: &str =
    "0xb53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103";

/// The number of bytes stored in a single storage slot
pub const NUM_BYTES_STORAGE_SLOT: usize = 32;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

/// The version written to a freshly deployed record
pub const INITIAL_VERSION: &str = "1.0.0";

/// The version assumed after an upgrade when the implementation has no `version()`
pub const DEFAULT_UPGRADED_VERSION: &str = "2.0.0";

/// The number of blocks to wait on top of the operation's block before verifying
pub const NUM_VERIFY_CONFIRMATIONS: u64 = 5;

/// How often to poll the chain head while waiting for confirmations
pub const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// How long to wait for the confirmation depth before giving up
pub const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(300);

/// The default set of networks which are never verified on an explorer
pub const DEFAULT_LOCAL_NETWORKS: &str = "hardhat,localhost";

/// The default directory holding deployment records
pub const DEFAULT_DEPLOYMENTS_DIR: &str = "deployments";

/// The default directory holding compilation artifacts (forge's output directory)
pub const DEFAULT_ARTIFACTS_DIR: &str = "out";

/// The default block explorer
pub const DEFAULT_EXPLORER_URL: &str = "https://sepolia.etherscan.io";

/// The default network name
pub const DEFAULT_NETWORK: &str = "localhost";

/// The token name used when none is configured
pub const DEFAULT_TOKEN_NAME: &str = "testToken";

/// The token symbol used when none is configured
pub const DEFAULT_TOKEN_SYMBOL: &str = "MTK";

/// The collection name used when none is configured
pub const DEFAULT_NFT_NAME: &str = "TestNFT";

/// The collection symbol used when none is configured
pub const DEFAULT_NFT_SYMBOL: &str = "TNFT";

/// The extension of a deployment record
pub const RECORD_EXTENSION: &str = "json";

/// The file name prefix of NFT deployment records
pub const NFT_RECORD_PREFIX: &str = "nft-";

// --- Environment variables --- //

/// The env var holding the deployer's private key
pub const PRIVATE_KEY_ENV_VAR: &str = "PRIVATE_KEY";

/// The env var holding the network RPC URL
pub const RPC_URL_ENV_VAR: &str = "RPC_URL";

/// The env var holding the network name
pub const NETWORK_ENV_VAR: &str = "NETWORK";

/// The env var holding the comma separated local network names
pub const LOCAL_NETWORKS_ENV_VAR: &str = "LOCAL_NETWORKS";

/// The env var holding the deployment records directory
pub const DEPLOYMENTS_DIR_ENV_VAR: &str = "DEPLOYMENTS_DIR";

/// The env var holding the compilation artifacts directory
pub const ARTIFACTS_DIR_ENV_VAR: &str = "ARTIFACTS_DIR";

/// The env var holding the block explorer base URL
pub const EXPLORER_URL_ENV_VAR: &str = "EXPLORER_URL";

/// The env var holding the block explorer API key
pub const ETHERSCAN_API_KEY_ENV_VAR: &str = "ETHERSCAN_API_KEY";

/// The env var holding the token name
pub const TOKEN_NAME_ENV_VAR: &str = "TOKEN_NAME";

/// The env var holding the token symbol
pub const TOKEN_SYMBOL_ENV_VAR: &str = "TOKEN_SYMBOL";

/// The env var holding the collection name
pub const NFT_NAME_ENV_VAR: &str = "NFT_NAME";

/// The env var holding the collection symbol
pub const NFT_SYMBOL_ENV_VAR: &str = "NFT_SYMBOL";

/// The env var holding the collection base URI
pub const NFT_BASE_URI_ENV_VAR: &str = "NFT_BASE_URI";

/// The env var holding the token name to set on upgrade
pub const TOKEN_NAME_V2_ENV_VAR: &str = "TOKEN_NAME_V2";

/// The env var holding the token symbol to set on upgrade
pub const TOKEN_SYMBOL_V2_ENV_VAR: &str = "TOKEN_SYMBOL_V2";

/// The env var holding the collection name to set on upgrade
pub const NFT_NAME_V2_ENV_VAR: &str = "NFT_NAME_V2";

/// The env var holding the collection symbol to set on upgrade
pub const NFT_SYMBOL_V2_ENV_VAR: &str = "NFT_SYMBOL_V2";

/// The env var holding the collection base URI to set on upgrade
pub const NFT_BASE_URI_V2_ENV_VAR: &str = "NFT_BASE_URI_V2";

// --- Forge verification --- //

/// The name of the forge command
pub const FORGE_COMMAND: &str = "forge";

/// The forge subcommand which submits sources to an explorer
pub const VERIFY_CONTRACT_COMMAND: &str = "verify-contract";

// --- Recoverable error patterns --- //

/// Message fragments reported by the explorer when a contract is already verified
pub const ALREADY_VERIFIED_PATTERNS: [&str; 1] = ["already verified"];

/// Message fragments reported when a proxy has already run an initializer.
///
/// `0xf92ee8a9` is the selector of OpenZeppelin v5's `InvalidInitialization()`
pub const ALREADY_INITIALIZED_PATTERNS: [&str; 3] =
    ["already initialized", "invalidinitialization", "0xf92ee8a9"];
