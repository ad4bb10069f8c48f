//! Constants used in the integration tests

/// The default private key for the tests, the first default account in an Anvil node
pub const DEFAULT_PKEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// The private key of the second default account in an Anvil node
pub const DEFAULT_STRANGER_PKEY: &str =
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

/// The default devnet RPC URL
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// The default directory holding the compiled contracts
pub const DEFAULT_ARTIFACTS_DIR: &str = "out";

/// The network name records are kept under
pub const TEST_NETWORK: &str = "devnet";

/// The name of the test token
pub const TEST_TOKEN_NAME: &str = "testToken";

/// The symbol of the test token
pub const TEST_TOKEN_SYMBOL: &str = "MTK";

/// The supply minted to the recipient on initialization, in whole tokens
pub const INITIAL_TOKEN_SUPPLY: u64 = 1_000_000_000;

/// The name of the test collection
pub const TEST_NFT_NAME: &str = "TestNFT";

/// The symbol of the test collection
pub const TEST_NFT_SYMBOL: &str = "TNFT";

/// The base URI of the test collection
pub const TEST_BASE_URI: &str = "https://api.example.com/";

/// The version reported by upgraded implementations
pub const UPGRADED_VERSION: &str = "2.0.0";

/// The base URI the collection is moved to during upgrades
pub const UPDATED_BASE_URI: &str = "https://newapi.example.com/";
