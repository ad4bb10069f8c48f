//! Definitions of errors that can occur during the execution of the contract management scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use alloy::primitives::Address;

/// Errors that can occur during the execution of the contract management scripts
#[derive(Debug)]
pub enum ScriptError {
    /// One or more required configuration values are absent
    MissingConfig(Vec<String>),
    /// No deployment record exists for the requested network & contract type
    RecordNotFound(String),
    /// The signer is not the owner of the contract it is trying to administer
    NotOwner {
        /// The on-chain owner of the contract
        owner: Address,
        /// The address of the account running the script
        caller: Address,
    },
    /// Error reading a deployment record
    ReadDeployments(String),
    /// Error writing a deployment record
    WriteDeployments(String),
    /// Error parsing a Solidity compilation artifact
    ArtifactParsing(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Error constructing calldata for a contract method
    CalldataConstruction(String),
    /// Error deploying a contract
    ContractDeployment(String),
    /// Error upgrading a proxy to a new implementation
    ContractUpgrade(String),
    /// Error calling a contract method
    ContractInteraction(String),
    /// The confirmation depth was not reached in time
    ConfirmationTimeout(String),
    /// The operation was cancelled by the operator
    Cancelled,
    /// Error submitting a contract for source verification
    Verification(String),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::MissingConfig(names) => {
                write!(f, "missing required configuration: {}", names.join(", "))
            }
            ScriptError::RecordNotFound(s) => {
                write!(f, "deployment record not found at {s}, deploy the contract first")
            }
            ScriptError::NotOwner { owner, caller } => write!(
                f,
                "caller {caller} is not the contract owner ({owner}), only the owner can update contract info"
            ),
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::ContractDeployment(s) => write!(f, "error deploying contract: {}", s),
            ScriptError::ContractUpgrade(s) => write!(f, "error upgrading proxy: {}", s),
            ScriptError::ContractInteraction(s) => {
                write!(f, "error interacting with contract: {}", s)
            }
            ScriptError::ConfirmationTimeout(s) => {
                write!(f, "timed out waiting for confirmations: {}", s)
            }
            ScriptError::Cancelled => write!(f, "operation cancelled"),
            ScriptError::Verification(s) => write!(f, "error verifying contract: {}", s),
        }
    }
}

impl Error for ScriptError {}
