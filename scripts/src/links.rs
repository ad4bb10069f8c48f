//! Block explorer links & the token info update reference

use std::fmt::{self, Display};

use alloy::primitives::{Address, TxHash};

use crate::{record::DeploymentRecord, types::ContractKind};

/// Builds links into a block explorer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExplorerLinks {
    /// The explorer base URL, without a trailing slash
    base: String,
}

impl ExplorerLinks {
    /// Create links into the explorer at `base_url`
    pub fn new(base_url: &str) -> Self {
        Self { base: base_url.trim_end_matches('/').to_string() }
    }

    /// The page of an account or contract
    pub fn address(&self, address: Address) -> String {
        format!("{}/address/{address}", self.base)
    }

    /// The token tracker page of a contract
    pub fn token(&self, address: Address) -> String {
        format!("{}/token/{address}", self.base)
    }

    /// The "Read as Proxy" tab of a proxy
    pub fn read_proxy(&self, address: Address) -> String {
        format!("{}#readProxyContract", self.address(address))
    }

    /// The page of a transaction
    pub fn tx(&self, hash: TxHash) -> String {
        format!("{}/tx/{hash}", self.base)
    }

    /// The explorer account page
    pub fn account(&self) -> String {
        format!("{}/myaccount", self.base)
    }

    /// The explorer login page
    pub fn login(&self) -> String {
        format!("{}/login", self.base)
    }
}

/// The links & form values needed to update a token's info on the explorer
/// after its name or symbol changed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateLinksReport {
    /// The explorer links are built against
    links: ExplorerLinks,
    /// The kind of contract
    kind: ContractKind,
    /// The proxy, i.e. the token's public address
    proxy: Address,
    /// The current implementation
    implementation: Address,
    /// The deployer, whose address must be verified on the explorer
    deployer: Address,
    /// The current name
    name: String,
    /// The current symbol
    symbol: String,
    /// The current version
    version: String,
    /// The upgrade transaction, if known
    upgrade_tx: Option<TxHash>,
}

impl UpdateLinksReport {
    /// Build the report for a recorded deployment
    pub fn new(explorer_url: &str, record: &DeploymentRecord, upgrade_tx: Option<TxHash>) -> Self {
        Self {
            links: ExplorerLinks::new(explorer_url),
            kind: record.kind(),
            proxy: record.proxy_address,
            implementation: record.implementation_address,
            deployer: record.deployer,
            name: record.name().to_string(),
            symbol: record.symbol().to_string(),
            version: record.version().to_string(),
            upgrade_tx,
        }
    }
}

impl Display for UpdateLinksReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let links = &self.links;

        writeln!(f, "Step 1: log in to the explorer")?;
        writeln!(f, "  {}", links.login())?;
        writeln!(f, "Step 2: verify ownership of the deployer address (once)")?;
        writeln!(f, "  {}", links.account())?;
        writeln!(f, "Step 3: request a token info update")?;
        writeln!(f, "  {}", links.token(self.proxy))?;
        writeln!(f)?;

        writeln!(f, "Check on-chain data:")?;
        writeln!(f, "  {}", links.read_proxy(self.proxy))?;
        writeln!(f, "  name() should return {}", self.name)?;
        writeln!(f, "  symbol() should return {}", self.symbol)?;
        writeln!(f, "  version() should return {}", self.version)?;
        writeln!(f)?;

        writeln!(f, "Update form:")?;
        writeln!(f, "  Request type: Existing Token Info Update")?;
        writeln!(f, "  Name: {}", self.name)?;
        writeln!(f, "  Symbol: {}", self.symbol)?;
        writeln!(f, "  Contract address: {}", self.proxy)?;
        writeln!(f, "  Deployer address: {}", self.deployer)?;
        writeln!(f)?;

        writeln!(f, "Links:")?;
        writeln!(f, "  {} page:     {}", self.kind, links.token(self.proxy))?;
        writeln!(f, "  Proxy:          {}", links.address(self.proxy))?;
        write!(f, "  Implementation: {}", links.address(self.implementation))?;
        if let Some(tx) = self.upgrade_tx {
            write!(f, "\n  Upgrade tx:     {}", links.tx(tx))?;
        }

        Ok(())
    }
}
