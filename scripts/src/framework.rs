//! The seams between the orchestration logic and the chain
//!
//! The orchestrators only ever talk to the chain through these traits. The
//! alloy-backed implementations live in [`crate::chain`].

#![allow(async_fn_in_trait)]

use alloy::primitives::{Address, Bytes, TxHash, U256};

use crate::{
    errors::ScriptError,
    types::{ContractKind, ContractSnapshot},
};

/// A source of the current chain head
pub trait BlockSource {
    /// The number of the most recent block
    async fn block_number(&self) -> Result<u64, ScriptError>;
}

/// The result of deploying a proxy in front of a fresh implementation
#[derive(Clone, Debug)]
pub struct ProxyDeployment {
    /// The address of the proxy
    pub proxy_address: Address,
    /// The implementation deployed behind the proxy
    pub implementation: Address,
    /// The hash of the proxy creation transaction
    pub tx_hash: TxHash,
    /// The block the proxy creation transaction was mined in
    pub block_number: u64,
    /// The ABI-encoded proxy constructor arguments, used for source verification
    pub constructor_args: Bytes,
}

/// The result of pointing a proxy at a new implementation
#[derive(Clone, Debug)]
pub struct UpgradeReceipt {
    /// The implementation the proxy was pointed at
    pub implementation: Address,
    /// The hash of the upgrade transaction
    pub tx_hash: TxHash,
    /// The block the upgrade transaction was mined in
    pub block_number: u64,
}

/// Deploys & upgrades contracts behind upgradeable proxies
pub trait ProxyFramework: BlockSource {
    /// The handle used to call a deployed contract
    type Contract: ManagedContract;

    /// The account signing transactions
    fn signer(&self) -> Address;

    /// Get a handle to the contract of the given kind at `address`
    fn contract(&self, kind: ContractKind, address: Address) -> Self::Contract;

    /// Deploy the initial implementation of `kind` and a proxy in front of it,
    /// calling the implementation's initializer with `init_calldata` in the
    /// proxy's constructor. `admin_owner` owns the proxy's admin contract.
    ///
    /// Returns once the proxy creation is mined.
    async fn deploy_proxy(
        &self,
        kind: ContractKind,
        admin_owner: Address,
        init_calldata: Bytes,
    ) -> Result<ProxyDeployment, ScriptError>;

    /// Deploy the upgraded implementation of `kind` and point `proxy` at it.
    ///
    /// Returns once the upgrade is mined.
    async fn upgrade_proxy(
        &self,
        proxy: Address,
        kind: ContractKind,
    ) -> Result<UpgradeReceipt, ScriptError>;

    /// The implementation `proxy` currently delegates to
    async fn implementation_address(&self, proxy: Address) -> Result<Address, ScriptError>;

    /// The admin contract allowed to upgrade `proxy`
    async fn admin_address(&self, proxy: Address) -> Result<Address, ScriptError>;
}

/// The call surface of the managed token & collection contracts
pub trait ManagedContract {
    /// The address calls are sent to
    fn address(&self) -> Address;

    /// `name()`
    async fn name(&self) -> Result<String, ScriptError>;

    /// `symbol()`
    async fn symbol(&self) -> Result<String, ScriptError>;

    /// `owner()`
    async fn owner(&self) -> Result<Address, ScriptError>;

    /// `totalSupply()` for tokens, `totalMinted()` for collections
    async fn supply(&self) -> Result<U256, ScriptError>;

    /// `version()`, only present on upgraded implementations
    async fn version(&self) -> Result<String, ScriptError>;

    /// `baseURI()`, `None` for contracts without a base URI
    async fn base_uri(&self) -> Result<Option<String>, ScriptError>;

    /// `initializeV2()`, the one-time storage setup of upgraded implementations
    async fn initialize_v2(&self) -> Result<(), ScriptError>;

    /// `updateTokenInfo` / `updateCollectionInfo`, returning the transaction hash
    async fn update_info(&self, name: &str, symbol: &str) -> Result<TxHash, ScriptError>;

    /// `setBaseURI`, collections only
    async fn set_base_uri(&self, base_uri: &str) -> Result<(), ScriptError>;

    /// `safeMint`, collections only
    async fn safe_mint(&self, to: Address) -> Result<(), ScriptError>;
}

/// Read the identifying state of a contract.
///
/// Name, symbol, owner & supply must all be readable; `version()` and
/// `baseURI()` are optional since older implementations lack them.
pub async fn read_snapshot<C: ManagedContract>(
    contract: &C,
) -> Result<ContractSnapshot, ScriptError> {
    let name = contract.name().await?;
    let symbol = contract.symbol().await?;
    let owner = contract.owner().await?;
    let supply = contract.supply().await?;
    let version = contract.version().await.ok();
    let base_uri = contract.base_uri().await.ok().flatten();

    Ok(ContractSnapshot {
        name,
        symbol,
        owner,
        supply,
        version,
        base_uri,
    })
}
