//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use alloy::primitives::{Address, U256};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::constants::{
    NFT_V1_ARTIFACT, NFT_V2_ARTIFACT, TOKEN_V1_ARTIFACT, TOKEN_V2_ARTIFACT,
};

/// The kinds of upgradeable contract managed by the scripts
#[derive(ValueEnum, Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContractKind {
    /// The fungible ERC20 token
    #[serde(rename = "Token")]
    Token,
    /// The ERC721 collection
    #[serde(rename = "NFT")]
    Nft,
}

impl ContractKind {
    /// The artifact of the implementation deployed behind a fresh proxy
    pub fn initial_artifact(&self) -> &'static str {
        match self {
            ContractKind::Token => TOKEN_V1_ARTIFACT,
            ContractKind::Nft => NFT_V1_ARTIFACT,
        }
    }

    /// The artifact of the implementation a proxy is upgraded to
    pub fn upgrade_artifact(&self) -> &'static str {
        match self {
            ContractKind::Token => TOKEN_V2_ARTIFACT,
            ContractKind::Nft => NFT_V2_ARTIFACT,
        }
    }

    /// The label used for the supply figure in console output
    pub fn supply_label(&self) -> &'static str {
        match self {
            ContractKind::Token => "Total Supply",
            ContractKind::Nft => "Total Minted",
        }
    }
}

impl Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractKind::Token => write!(f, "token"),
            ContractKind::Nft => write!(f, "nft"),
        }
    }
}

/// A point-in-time read of a contract's view functions
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractSnapshot {
    /// `name()`
    pub name: String,
    /// `symbol()`
    pub symbol: String,
    /// `owner()`
    pub owner: Address,
    /// `totalSupply()` for tokens, `totalMinted()` for collections
    pub supply: U256,
    /// `version()`, absent on implementations that predate it
    pub version: Option<String>,
    /// `baseURI()`, collections only
    pub base_uri: Option<String>,
}

/// The result of a step whose failure is tolerated
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step went through
    Success,
    /// The step had already been performed, e.g. by a previous run
    AlreadyDone,
    /// The step failed for the given reason
    Failed(String),
}

impl StepOutcome {
    /// Classify the result of an auxiliary call.
    ///
    /// Errors whose message contains one of `done_patterns` (case-insensitive)
    /// are downgraded to [`StepOutcome::AlreadyDone`].
    pub fn classify<T, E: Display>(res: Result<T, E>, done_patterns: &[&str]) -> Self {
        match res {
            Ok(_) => StepOutcome::Success,
            Err(e) => {
                let msg = e.to_string();
                if mentions_any(&msg, done_patterns) {
                    StepOutcome::AlreadyDone
                } else {
                    StepOutcome::Failed(msg)
                }
            }
        }
    }

    /// Whether the desired end state holds after the step
    pub fn is_ok(&self) -> bool {
        !matches!(self, StepOutcome::Failed(_))
    }
}

/// Whether `msg` contains any of `patterns`, ignoring case
pub fn mentions_any(msg: &str, patterns: &[&str]) -> bool {
    let lowered = msg.to_lowercase();
    patterns.iter().any(|p| lowered.contains(&p.to_lowercase()))
}

impl Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Success => write!(f, "success"),
            StepOutcome::AlreadyDone => write!(f, "already done"),
            StepOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}
