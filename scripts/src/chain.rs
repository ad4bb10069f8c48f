//! Alloy-backed implementations of the chain-facing traits

use std::path::PathBuf;

use alloy::{
    contract::{CallBuilder, CallDecoder},
    network::{Ethereum, TransactionBuilder},
    primitives::{Address, Bytes, TxHash, U256},
    providers::{DynProvider, Provider},
    rpc::types::{TransactionReceipt, TransactionRequest},
};
use tracing::info;

use crate::{
    constants::{PROXY_ADMIN_STORAGE_SLOT, PROXY_ARTIFACT, PROXY_IMPLEMENTATION_STORAGE_SLOT},
    errors::ScriptError,
    framework::{BlockSource, ManagedContract, ProxyDeployment, ProxyFramework, UpgradeReceipt},
    solidity::{IProxyAdmin, ITestNft::ITestNftInstance, ITestToken::ITestTokenInstance},
    types::ContractKind,
    utils::{load_creation_bytecode, proxy_constructor_args, read_address_slot},
};

/// A call builder over the scripts' provider
type ScriptCallBuilder<'a, C> = CallBuilder<&'a DynProvider, C, Ethereum>;

/// Send a transaction and wait for a successful receipt
async fn send_tx<C: CallDecoder>(
    tx: ScriptCallBuilder<'_, C>,
) -> Result<TransactionReceipt, ScriptError> {
    let receipt = tx
        .send()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?
        .get_receipt()
        .await
        .map_err(|e| ScriptError::ContractInteraction(e.to_string()))?;

    if !receipt.status() {
        return Err(ScriptError::ContractInteraction(format!(
            "transaction {} reverted",
            receipt.transaction_hash
        )));
    }

    Ok(receipt)
}

/// Deploys & upgrades proxies through an RPC node, using compiled artifacts
#[derive(Clone)]
pub struct AlloyFramework {
    /// The signing provider
    provider: DynProvider,
    /// The address of the signer
    signer: Address,
    /// The directory holding compilation artifacts
    artifacts_dir: PathBuf,
}

impl AlloyFramework {
    /// Create a framework over a signing provider
    pub fn new(provider: DynProvider, signer: Address, artifacts_dir: PathBuf) -> Self {
        Self { provider, signer, artifacts_dir }
    }

    /// The underlying provider
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// Deploy the artifact `contract_name` with `constructor_args` appended
    /// to its creation code, returning the new address & the receipt
    async fn deploy_artifact(
        &self,
        contract_name: &str,
        constructor_args: &[u8],
    ) -> Result<(Address, TransactionReceipt), ScriptError> {
        let bytecode = load_creation_bytecode(&self.artifacts_dir, contract_name)?;
        let code: Bytes = [bytecode.as_ref(), constructor_args].concat().into();
        let tx = TransactionRequest::default().with_deploy_code(code);

        let receipt = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?
            .get_receipt()
            .await
            .map_err(|e| ScriptError::ContractDeployment(e.to_string()))?;

        if !receipt.status() {
            return Err(ScriptError::ContractDeployment(format!(
                "{contract_name} creation reverted in {}",
                receipt.transaction_hash
            )));
        }

        let address = receipt.contract_address.ok_or_else(|| {
            ScriptError::ContractDeployment(format!("no contract address for {contract_name}"))
        })?;
        info!(contract = contract_name, %address, tx = %receipt.transaction_hash, "deployed");

        Ok((address, receipt))
    }
}

impl BlockSource for DynProvider {
    async fn block_number(&self) -> Result<u64, ScriptError> {
        self.get_block_number().await.map_err(|e| ScriptError::ContractInteraction(e.to_string()))
    }
}

impl BlockSource for AlloyFramework {
    async fn block_number(&self) -> Result<u64, ScriptError> {
        BlockSource::block_number(&self.provider).await
    }
}

impl ProxyFramework for AlloyFramework {
    type Contract = OnChainContract;

    fn signer(&self) -> Address {
        self.signer
    }

    fn contract(&self, kind: ContractKind, address: Address) -> OnChainContract {
        OnChainContract::new(kind, address, self.provider.clone())
    }

    async fn deploy_proxy(
        &self,
        kind: ContractKind,
        admin_owner: Address,
        init_calldata: Bytes,
    ) -> Result<ProxyDeployment, ScriptError> {
        let (implementation, _) = self.deploy_artifact(kind.initial_artifact(), &[]).await?;

        let constructor_args = proxy_constructor_args(implementation, admin_owner, init_calldata);
        let (proxy_address, receipt) =
            self.deploy_artifact(PROXY_ARTIFACT, &constructor_args).await?;

        Ok(ProxyDeployment {
            proxy_address,
            implementation,
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.unwrap_or_default(),
            constructor_args,
        })
    }

    async fn upgrade_proxy(
        &self,
        proxy: Address,
        kind: ContractKind,
    ) -> Result<UpgradeReceipt, ScriptError> {
        let (implementation, _) = self.deploy_artifact(kind.upgrade_artifact(), &[]).await?;

        // Transparent proxies can only be upgraded through their admin contract
        let admin = self.admin_address(proxy).await?;
        let proxy_admin = IProxyAdmin::new(admin, self.provider.clone());
        let receipt = send_tx(proxy_admin.upgradeAndCall(proxy, implementation, Bytes::new()))
            .await
            .map_err(|e| ScriptError::ContractUpgrade(e.to_string()))?;
        info!(%proxy, %implementation, tx = %receipt.transaction_hash, "proxy upgraded");

        Ok(UpgradeReceipt {
            implementation,
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.unwrap_or_default(),
        })
    }

    async fn implementation_address(&self, proxy: Address) -> Result<Address, ScriptError> {
        read_address_slot(&self.provider, proxy, PROXY_IMPLEMENTATION_STORAGE_SLOT).await
    }

    async fn admin_address(&self, proxy: Address) -> Result<Address, ScriptError> {
        // This is the recommended way to get the proxy admin address:
        // https://github.com/OpenZeppelin/openzeppelin-contracts/blob/v5.0.0/contracts/proxy/ERC1967/ERC1967Utils.sol#L104-L106
        read_address_slot(&self.provider, proxy, PROXY_ADMIN_STORAGE_SLOT).await
    }
}

/// A handle to a deployed token or collection, called through its proxy
#[derive(Clone)]
pub enum OnChainContract {
    /// A fungible token
    Token(ITestTokenInstance<DynProvider>),
    /// An NFT collection
    Nft(ITestNftInstance<DynProvider>),
}

impl OnChainContract {
    /// Create a handle to the contract of the given kind at `address`
    pub fn new(kind: ContractKind, address: Address, provider: DynProvider) -> Self {
        match kind {
            ContractKind::Token => {
                OnChainContract::Token(ITestTokenInstance::new(address, provider))
            }
            ContractKind::Nft => OnChainContract::Nft(ITestNftInstance::new(address, provider)),
        }
    }

    /// The error returned when calling a collection-only method on a token
    fn unsupported(method: &str) -> ScriptError {
        ScriptError::ContractInteraction(format!("{method} is not supported by token contracts"))
    }
}

/// Map a failed view call into a [`ScriptError`]
fn call_err(e: alloy::contract::Error) -> ScriptError {
    ScriptError::ContractInteraction(e.to_string())
}

impl ManagedContract for OnChainContract {
    fn address(&self) -> Address {
        match self {
            OnChainContract::Token(token) => *token.address(),
            OnChainContract::Nft(nft) => *nft.address(),
        }
    }

    async fn name(&self) -> Result<String, ScriptError> {
        match self {
            OnChainContract::Token(token) => token.name().call().await.map_err(call_err),
            OnChainContract::Nft(nft) => nft.name().call().await.map_err(call_err),
        }
    }

    async fn symbol(&self) -> Result<String, ScriptError> {
        match self {
            OnChainContract::Token(token) => token.symbol().call().await.map_err(call_err),
            OnChainContract::Nft(nft) => nft.symbol().call().await.map_err(call_err),
        }
    }

    async fn owner(&self) -> Result<Address, ScriptError> {
        match self {
            OnChainContract::Token(token) => token.owner().call().await.map_err(call_err),
            OnChainContract::Nft(nft) => nft.owner().call().await.map_err(call_err),
        }
    }

    async fn supply(&self) -> Result<U256, ScriptError> {
        match self {
            OnChainContract::Token(token) => token.totalSupply().call().await.map_err(call_err),
            OnChainContract::Nft(nft) => nft.totalMinted().call().await.map_err(call_err),
        }
    }

    async fn version(&self) -> Result<String, ScriptError> {
        match self {
            OnChainContract::Token(token) => token.version().call().await.map_err(call_err),
            OnChainContract::Nft(nft) => nft.version().call().await.map_err(call_err),
        }
    }

    async fn base_uri(&self) -> Result<Option<String>, ScriptError> {
        match self {
            OnChainContract::Token(_) => Ok(None),
            OnChainContract::Nft(nft) => nft.baseURI().call().await.map(Some).map_err(call_err),
        }
    }

    async fn initialize_v2(&self) -> Result<(), ScriptError> {
        match self {
            OnChainContract::Token(token) => send_tx(token.initializeV2()).await.map(|_| ()),
            OnChainContract::Nft(nft) => send_tx(nft.initializeV2()).await.map(|_| ()),
        }
    }

    async fn update_info(&self, name: &str, symbol: &str) -> Result<TxHash, ScriptError> {
        let (name, symbol) = (name.to_string(), symbol.to_string());
        let receipt = match self {
            OnChainContract::Token(token) => send_tx(token.updateTokenInfo(name, symbol)).await?,
            OnChainContract::Nft(nft) => send_tx(nft.updateCollectionInfo(name, symbol)).await?,
        };
        info!(tx = %receipt.transaction_hash, "contract info updated");
        Ok(receipt.transaction_hash)
    }

    async fn set_base_uri(&self, base_uri: &str) -> Result<(), ScriptError> {
        match self {
            OnChainContract::Token(_) => Err(Self::unsupported("setBaseURI")),
            OnChainContract::Nft(nft) => {
                send_tx(nft.setBaseURI(base_uri.to_string())).await.map(|_| ())
            }
        }
    }

    async fn safe_mint(&self, to: Address) -> Result<(), ScriptError> {
        match self {
            OnChainContract::Token(_) => Err(Self::unsupported("safeMint")),
            OnChainContract::Nft(nft) => send_tx(nft.safeMint(to)).await.map(|_| ()),
        }
    }
}
