//! Scripts for deploying, upgrading and verifying upgradeable token contracts.
//!
//! Every contract sits behind an OpenZeppelin `TransparentUpgradeableProxy`.
//! Deployments are recorded per network & contract kind, and those records
//! drive later upgrades, verification and reporting.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod chain;
pub mod cli;
mod commands;
pub mod config;
pub mod confirmations;
pub mod constants;
pub mod deploy;
pub mod errors;
pub mod framework;
pub mod links;
pub mod record;
#[allow(missing_docs, clippy::missing_docs_in_private_items)]
pub mod solidity;
pub mod types;
pub mod upgrade;
pub mod utils;
pub mod verify;

#[cfg(test)]
mod test_utils;
