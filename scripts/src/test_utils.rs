//! In-memory stand-ins for the chain, used by the unit tests

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use alloy::primitives::{address, Address, Bytes, TxHash, U256};
use chrono::{DateTime, Utc};

use crate::{
    errors::ScriptError,
    framework::{BlockSource, ManagedContract, ProxyDeployment, ProxyFramework, UpgradeReceipt},
    record::{DeploymentRecord, RecordMetadata},
    types::{ContractKind, StepOutcome},
    verify::{SourceVerifier, VerificationTarget},
};

/// The account running the scripts in tests
pub const CALLER: Address = address!("1111111111111111111111111111111111111111");
/// An account which owns nothing
pub const STRANGER: Address = address!("2222222222222222222222222222222222222222");
/// The proxy address handed out by the mock framework
pub const PROXY: Address = address!("3333333333333333333333333333333333333333");
/// The proxy admin address
pub const ADMIN: Address = address!("4444444444444444444444444444444444444444");
/// The initial implementation address
pub const IMPL_V1: Address = address!("5555555555555555555555555555555555555555");
/// The upgraded implementation address
pub const IMPL_V2: Address = address!("6666666666666666666666666666666666666666");

/// The hash of every metadata update sent to the mock
pub const METADATA_TX: TxHash = TxHash::repeat_byte(0xcc);

/// The proxy constructor arguments handed out by the mock framework
pub fn sample_constructor_args() -> Bytes {
    Bytes::from(vec![0xca, 0xfe])
}

/// A record as left behind by a previous deployment
pub fn sample_record(kind: ContractKind) -> DeploymentRecord {
    let (name, symbol, base_uri) = match kind {
        ContractKind::Token => ("testToken", "MTK", None),
        ContractKind::Nft => ("TestNFT", "TNFT", Some("https://api.example.com/".to_string())),
    };

    DeploymentRecord {
        network: "sepolia".to_string(),
        metadata: RecordMetadata::new(kind, name.to_string(), symbol.to_string(), base_uri),
        proxy_address: PROXY,
        implementation_address: IMPL_V1,
        admin_address: Some(ADMIN),
        proxy_constructor_args: Some(sample_constructor_args()),
        deployer: CALLER,
        version: Some("1.0.0".to_string()),
        deployed_at: DateTime::parse_from_rfc3339("2025-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc),
        upgraded_at: None,
        upgraded_by: None,
    }
}

/// The state of the single mocked proxy
#[derive(Clone, Debug)]
pub struct ChainState {
    /// `name()`
    pub name: String,
    /// `symbol()`
    pub symbol: String,
    /// `owner()`
    pub owner: Address,
    /// `totalSupply()` / `totalMinted()`
    pub supply: U256,
    /// `version()`, `None` reverts
    pub version: Option<String>,
    /// `baseURI()`
    pub base_uri: Option<String>,
    /// The implementation behind the proxy
    pub implementation: Address,
    /// The chain head
    pub head: u64,
    /// Whether `initializeV2` already ran
    pub initialized_v2: bool,
    /// Make every view call fail
    pub fail_reads: bool,
    /// Make only `totalSupply()` / `totalMinted()` fail
    pub fail_supply: bool,
    /// Make reading the implementation slot fail
    pub fail_impl_read: bool,
    /// Make view calls work again once the proxy is upgraded
    pub reads_recover_on_upgrade: bool,
    /// Make `safeMint` fail
    pub fail_mint: bool,
    /// Make the upgrade fail
    pub fail_upgrade: bool,
    /// The calldata the proxy was initialized with
    pub init_calldata: Option<Bytes>,
    /// The state-changing calls made, in order
    pub calls: Vec<&'static str>,
}

impl ChainState {
    /// A freshly initialized contract owned by [`CALLER`]
    pub fn new(name: &str, symbol: &str) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            owner: CALLER,
            supply: U256::ZERO,
            version: None,
            base_uri: None,
            implementation: IMPL_V1,
            head: 100,
            initialized_v2: false,
            fail_reads: false,
            fail_supply: false,
            fail_impl_read: false,
            reads_recover_on_upgrade: false,
            fail_mint: false,
            fail_upgrade: false,
            init_calldata: None,
            calls: Vec::new(),
        }
    }

    /// The number of times `call` was made
    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }
}

/// A framework backed by a single in-memory proxy
#[derive(Clone)]
pub struct MockFramework {
    /// The shared chain state
    state: Arc<Mutex<ChainState>>,
}

impl MockFramework {
    /// Create a framework over the given state
    pub fn new(state: ChainState) -> Self {
        Self { state: Arc::new(Mutex::new(state)) }
    }

    /// Lock the chain state
    pub fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap()
    }
}

impl BlockSource for MockFramework {
    async fn block_number(&self) -> Result<u64, ScriptError> {
        Ok(self.state().head)
    }
}

impl ProxyFramework for MockFramework {
    type Contract = MockContract;

    fn signer(&self) -> Address {
        CALLER
    }

    fn contract(&self, _kind: ContractKind, address: Address) -> MockContract {
        MockContract { address, state: self.state.clone() }
    }

    async fn deploy_proxy(
        &self,
        _kind: ContractKind,
        _admin_owner: Address,
        init_calldata: Bytes,
    ) -> Result<ProxyDeployment, ScriptError> {
        let mut state = self.state();
        state.calls.push("deploy_proxy");
        state.init_calldata = Some(init_calldata);
        state.head += 1;

        Ok(ProxyDeployment {
            proxy_address: PROXY,
            implementation: IMPL_V1,
            tx_hash: TxHash::repeat_byte(0xaa),
            block_number: state.head,
            constructor_args: sample_constructor_args(),
        })
    }

    async fn upgrade_proxy(
        &self,
        _proxy: Address,
        _kind: ContractKind,
    ) -> Result<UpgradeReceipt, ScriptError> {
        let mut state = self.state();
        state.calls.push("upgrade_proxy");
        if state.fail_upgrade {
            return Err(ScriptError::ContractUpgrade("insufficient funds".to_string()));
        }

        state.implementation = IMPL_V2;
        state.version = Some("2.0.0".to_string());
        state.head += 1;
        if state.reads_recover_on_upgrade {
            state.fail_reads = false;
        }

        Ok(UpgradeReceipt {
            implementation: IMPL_V2,
            tx_hash: TxHash::repeat_byte(0xbb),
            block_number: state.head,
        })
    }

    async fn implementation_address(&self, _proxy: Address) -> Result<Address, ScriptError> {
        let state = self.state();
        if state.fail_impl_read {
            return Err(ScriptError::ContractInteraction("rpc timeout".to_string()));
        }
        Ok(state.implementation)
    }

    async fn admin_address(&self, _proxy: Address) -> Result<Address, ScriptError> {
        Ok(ADMIN)
    }
}

/// A handle to the mocked proxy, calls are made as [`CALLER`]
pub struct MockContract {
    /// The address the handle was created for
    address: Address,
    /// The shared chain state
    state: Arc<Mutex<ChainState>>,
}

impl MockContract {
    /// Lock the chain state, failing if reads are disabled
    fn read(&self) -> Result<MutexGuard<'_, ChainState>, ScriptError> {
        let state = self.state.lock().unwrap();
        if state.fail_reads {
            return Err(ScriptError::ContractInteraction("call reverted".to_string()));
        }
        Ok(state)
    }

    /// Lock the chain state & log a state-changing call
    fn write(&self, call: &'static str) -> MutexGuard<'_, ChainState> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state
    }
}

impl ManagedContract for MockContract {
    fn address(&self) -> Address {
        self.address
    }

    async fn name(&self) -> Result<String, ScriptError> {
        Ok(self.read()?.name.clone())
    }

    async fn symbol(&self) -> Result<String, ScriptError> {
        Ok(self.read()?.symbol.clone())
    }

    async fn owner(&self) -> Result<Address, ScriptError> {
        Ok(self.read()?.owner)
    }

    async fn supply(&self) -> Result<U256, ScriptError> {
        let state = self.read()?;
        if state.fail_supply {
            return Err(ScriptError::ContractInteraction("execution reverted".to_string()));
        }
        Ok(state.supply)
    }

    async fn version(&self) -> Result<String, ScriptError> {
        self.read()?
            .version
            .clone()
            .ok_or_else(|| ScriptError::ContractInteraction("execution reverted".to_string()))
    }

    async fn base_uri(&self) -> Result<Option<String>, ScriptError> {
        Ok(self.read()?.base_uri.clone())
    }

    async fn initialize_v2(&self) -> Result<(), ScriptError> {
        let mut state = self.write("initialize_v2");
        if state.initialized_v2 {
            return Err(ScriptError::ContractInteraction(
                "execution reverted: InvalidInitialization()".to_string(),
            ));
        }
        state.initialized_v2 = true;
        Ok(())
    }

    async fn update_info(&self, name: &str, symbol: &str) -> Result<TxHash, ScriptError> {
        let mut state = self.write("update_info");
        if state.owner != CALLER {
            return Err(ScriptError::ContractInteraction(
                "execution reverted: OwnableUnauthorizedAccount".to_string(),
            ));
        }
        if name.is_empty() {
            return Err(ScriptError::ContractInteraction(
                "execution reverted: Name cannot be empty".to_string(),
            ));
        }

        state.name = name.to_string();
        state.symbol = symbol.to_string();
        Ok(METADATA_TX)
    }

    async fn set_base_uri(&self, base_uri: &str) -> Result<(), ScriptError> {
        let mut state = self.write("set_base_uri");
        state.base_uri = Some(base_uri.to_string());
        Ok(())
    }

    async fn safe_mint(&self, _to: Address) -> Result<(), ScriptError> {
        let mut state = self.write("safe_mint");
        if state.fail_mint {
            return Err(ScriptError::ContractInteraction("execution reverted".to_string()));
        }
        state.supply += U256::from(1);
        Ok(())
    }
}

/// A chain head which advances by `step` on every poll
pub struct MockBlockSource {
    /// The next head to report
    head: AtomicU64,
    /// How far the head moves per poll
    step: u64,
    /// The number of polls made
    polls: AtomicU64,
}

impl MockBlockSource {
    /// A chain producing one block per poll, starting at `head`
    pub fn advancing(head: u64) -> Self {
        Self { head: AtomicU64::new(head), step: 1, polls: AtomicU64::new(0) }
    }

    /// A chain stuck at `head`
    pub fn stalled(head: u64) -> Self {
        Self { head: AtomicU64::new(head), step: 0, polls: AtomicU64::new(0) }
    }

    /// The number of polls made
    pub fn polls(&self) -> u64 {
        self.polls.load(Ordering::SeqCst)
    }
}

impl BlockSource for MockBlockSource {
    async fn block_number(&self) -> Result<u64, ScriptError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(self.head.fetch_add(self.step, Ordering::SeqCst))
    }
}

/// A verifier returning scripted outcomes per address
#[derive(Default)]
pub struct MockVerifier {
    /// Outcomes by address, anything else verifies successfully
    outcomes: HashMap<Address, StepOutcome>,
    /// The targets submitted, in order
    submitted: Mutex<Vec<VerificationTarget>>,
}

impl MockVerifier {
    /// Script the outcome of verifying `address`
    pub fn with_outcome(mut self, address: Address, outcome: StepOutcome) -> Self {
        self.outcomes.insert(address, outcome);
        self
    }

    /// The targets submitted, in order
    pub fn submitted(&self) -> Vec<VerificationTarget> {
        self.submitted.lock().unwrap().clone()
    }
}

impl SourceVerifier for MockVerifier {
    async fn verify(&self, target: &VerificationTarget) -> StepOutcome {
        self.submitted.lock().unwrap().push(target.clone());
        self.outcomes.get(&target.address).cloned().unwrap_or(StepOutcome::Success)
    }
}
