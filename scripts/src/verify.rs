//! Source verification on a block explorer
//!
//! Verification is best effort: it never fails the operation that triggered
//! it. Every outcome is logged and collected into a [`VerificationSummary`].

#![allow(async_fn_in_trait)]

use std::{
    fmt::{self, Display},
    future::Future,
    process::Output,
};

use alloy::{
    hex,
    primitives::{Address, Bytes},
};
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::{
    confirmations::{wait_for_confirmations, ConfirmationPolicy},
    constants::{ALREADY_VERIFIED_PATTERNS, FORGE_COMMAND, PROXY_ARTIFACT, VERIFY_CONTRACT_COMMAND},
    errors::ScriptError,
    framework::BlockSource,
    record::DeploymentRecord,
    types::{mentions_any, StepOutcome},
};

/// A deployed contract to submit for verification
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationTarget {
    /// A human readable label, e.g. "implementation"
    pub label: String,
    /// The address of the deployed contract
    pub address: Address,
    /// The name of the contract in the compiled sources
    pub contract_name: String,
    /// The ABI-encoded constructor arguments, if any
    pub constructor_args: Option<Bytes>,
    /// Let the verifier recover the constructor arguments from the creation
    /// transaction, for deployments recorded without them
    pub guess_constructor_args: bool,
}

impl VerificationTarget {
    /// The implementation currently recorded for a deployment
    pub fn implementation(record: &DeploymentRecord) -> Self {
        let kind = record.kind();
        let contract_name = if record.upgraded_at.is_some() {
            kind.upgrade_artifact()
        } else {
            kind.initial_artifact()
        };

        Self {
            label: "implementation".to_string(),
            address: record.implementation_address,
            contract_name: contract_name.to_string(),
            constructor_args: None,
            guess_constructor_args: false,
        }
    }

    /// The proxy of a deployment, with the constructor arguments it was
    /// recorded with
    pub fn proxy(record: &DeploymentRecord) -> Self {
        let constructor_args = record.proxy_constructor_args.clone();
        Self {
            label: "proxy".to_string(),
            address: record.proxy_address,
            contract_name: PROXY_ARTIFACT.to_string(),
            guess_constructor_args: constructor_args.is_none(),
            constructor_args,
        }
    }

    /// Every contract of a recorded deployment
    pub fn recorded(record: &DeploymentRecord) -> Vec<Self> {
        vec![Self::implementation(record), Self::proxy(record)]
    }
}

/// Submits contract sources to a block explorer
pub trait SourceVerifier {
    /// Verify a single contract. Never fails, the outcome says how it went.
    async fn verify(&self, target: &VerificationTarget) -> StepOutcome;
}

/// Verifies contracts by shelling out to `forge verify-contract`
#[derive(Clone, Debug)]
pub struct ForgeVerifier {
    /// The explorer API key
    api_key: String,
    /// The chain the contracts live on
    chain_id: u64,
    /// The node forge fetches creation transactions from
    rpc_url: Option<String>,
}

impl ForgeVerifier {
    /// Create a verifier for the given chain
    pub fn new(api_key: String, chain_id: u64, rpc_url: Option<String>) -> Self {
        Self { api_key, chain_id, rpc_url }
    }

    /// Build the `forge verify-contract` invocation for `target`
    fn command(&self, target: &VerificationTarget) -> Command {
        let mut cmd = Command::new(FORGE_COMMAND);
        cmd.arg(VERIFY_CONTRACT_COMMAND);
        cmd.arg(target.address.to_string());
        cmd.arg(&target.contract_name);
        cmd.arg("--chain-id");
        cmd.arg(self.chain_id.to_string());
        cmd.arg("--etherscan-api-key");
        cmd.arg(&self.api_key);
        // Block until the explorer reports a result
        cmd.arg("--watch");
        if let Some(args) = &target.constructor_args {
            cmd.arg("--constructor-args");
            cmd.arg(hex::encode_prefixed(args));
        } else if target.guess_constructor_args {
            cmd.arg("--guess-constructor-args");
        }
        if let Some(rpc_url) = &self.rpc_url {
            cmd.arg("--rpc-url");
            cmd.arg(rpc_url);
        }

        cmd
    }
}

/// Join the stdout & stderr of a finished command
fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{}\n{}", stdout.trim(), stderr.trim()).trim().to_string()
}

impl SourceVerifier for ForgeVerifier {
    async fn verify(&self, target: &VerificationTarget) -> StepOutcome {
        let res = match self.command(target).output().await {
            Ok(output) if output.status.success() => Ok(combined_output(&output)),
            Ok(output) => Err(ScriptError::Verification(combined_output(&output))),
            Err(e) => {
                Err(ScriptError::Verification(format!("could not run {FORGE_COMMAND}: {e}")))
            }
        };

        match res {
            // Forge exits successfully when the explorer already has the source
            Ok(out) if mentions_any(&out, &ALREADY_VERIFIED_PATTERNS) => StepOutcome::AlreadyDone,
            res => StepOutcome::classify(res, &ALREADY_VERIFIED_PATTERNS),
        }
    }
}

/// When & how long to verify
#[derive(Clone, Debug)]
pub struct VerificationPolicy {
    /// Networks that are never verified
    pub local_networks: Vec<String>,
    /// The confirmation depth to wait for before submitting
    pub confirmations: ConfirmationPolicy,
}

impl VerificationPolicy {
    /// Whether `network` is a local network
    pub fn is_local(&self, network: &str) -> bool {
        self.local_networks.iter().any(|n| n.eq_ignore_ascii_case(network))
    }
}

/// What became of a verification run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationSummary {
    /// Nothing was submitted
    Skipped(String),
    /// Waiting for confirmations failed, nothing was submitted
    Aborted(String),
    /// Every target was submitted, with the given outcomes by label
    Completed(Vec<(String, StepOutcome)>),
}

impl VerificationSummary {
    /// Whether every submitted target ended up verified
    pub fn all_verified(&self) -> bool {
        match self {
            VerificationSummary::Completed(outcomes) => outcomes.iter().all(|(_, o)| o.is_ok()),
            _ => false,
        }
    }
}

impl Display for VerificationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationSummary::Skipped(reason) => write!(f, "skipped ({reason})"),
            VerificationSummary::Aborted(reason) => write!(f, "aborted ({reason})"),
            VerificationSummary::Completed(outcomes) => {
                let parts: Vec<String> =
                    outcomes.iter().map(|(label, o)| format!("{label}: {o}")).collect();
                write!(f, "{}", parts.join(", "))
            }
        }
    }
}

/// Verify `targets` once the operation mined in `mined_block` is buried deep
/// enough.
///
/// Skipped on local networks and when no verifier is configured (no API key).
pub async fn verify_contracts<V: SourceVerifier, B: BlockSource>(
    policy: &VerificationPolicy,
    network: &str,
    targets: &[VerificationTarget],
    verifier: Option<&V>,
    blocks: &B,
    mined_block: u64,
    cancel: impl Future<Output = ()>,
) -> VerificationSummary {
    if policy.is_local(network) {
        info!(network, "skipping verification on local network");
        return VerificationSummary::Skipped(format!("{network} is a local network"));
    }

    let Some(verifier) = verifier else {
        warn!("no explorer API key configured, skipping verification");
        return VerificationSummary::Skipped("no API key".to_string());
    };

    info!(confirmations = policy.confirmations.confirmations, "waiting before verification");
    if let Err(e) = wait_for_confirmations(blocks, mined_block, &policy.confirmations, cancel).await
    {
        error!("verification aborted: {e}");
        return VerificationSummary::Aborted(e.to_string());
    }

    let mut outcomes = Vec::with_capacity(targets.len());
    for target in targets {
        info!(
            label = %target.label,
            address = %target.address,
            "verifying {}",
            target.contract_name
        );
        let outcome = verifier.verify(target).await;
        match &outcome {
            StepOutcome::Success => info!(label = %target.label, "verified"),
            StepOutcome::AlreadyDone => info!(label = %target.label, "already verified"),
            StepOutcome::Failed(reason) => {
                error!(label = %target.label, "verification failed: {reason}")
            }
        }

        outcomes.push((target.label.clone(), outcome));
    }

    VerificationSummary::Completed(outcomes)
}

#[cfg(test)]
mod tests {
    use std::{future::pending, time::Duration};

    use super::*;
    use crate::{
        test_utils::{
            sample_constructor_args, sample_record, MockBlockSource, MockVerifier, IMPL_V1, PROXY,
        },
        types::ContractKind,
    };

    /// A policy treating the default local networks as local, with fast polling
    fn policy() -> VerificationPolicy {
        VerificationPolicy {
            local_networks: vec!["hardhat".to_string(), "localhost".to_string()],
            confirmations: ConfirmationPolicy {
                confirmations: 5,
                poll_interval: Duration::from_millis(1),
                timeout: Duration::from_secs(5),
            },
        }
    }

    /// The implementation & proxy of the sample NFT deployment
    fn targets() -> Vec<VerificationTarget> {
        VerificationTarget::recorded(&sample_record(ContractKind::Nft))
    }

    /// The arguments `forge` would be invoked with
    fn forge_args(verifier: &ForgeVerifier, target: &VerificationTarget) -> Vec<String> {
        let cmd = verifier.command(target);
        cmd.as_std().get_args().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[tokio::test]
    async fn test_skipped_on_local_network() {
        let verifier = MockVerifier::default();
        let blocks = MockBlockSource::stalled(0);

        let summary = verify_contracts(
            &policy(),
            "localhost",
            &targets(),
            Some(&verifier),
            &blocks,
            0,
            pending(),
        )
        .await;

        assert!(matches!(summary, VerificationSummary::Skipped(_)));
        assert!(verifier.submitted().is_empty());
        assert_eq!(blocks.polls(), 0);
    }

    #[tokio::test]
    async fn test_skipped_without_api_key() {
        let blocks = MockBlockSource::advancing(0);
        let summary = verify_contracts::<MockVerifier, _>(
            &policy(),
            "sepolia",
            &targets(),
            None,
            &blocks,
            0,
            pending(),
        )
        .await;

        assert_eq!(summary, VerificationSummary::Skipped("no API key".to_string()));
    }

    #[tokio::test]
    async fn test_already_verified_is_tolerated() {
        let verifier = MockVerifier::default().with_outcome(IMPL_V1, StepOutcome::AlreadyDone);
        let blocks = MockBlockSource::advancing(10);

        let summary = verify_contracts(
            &policy(),
            "sepolia",
            &targets(),
            Some(&verifier),
            &blocks,
            10,
            pending(),
        )
        .await;

        assert_eq!(
            summary,
            VerificationSummary::Completed(vec![
                ("implementation".to_string(), StepOutcome::AlreadyDone),
                ("proxy".to_string(), StepOutcome::Success),
            ])
        );
        assert!(summary.all_verified());

        let submitted = verifier.submitted();
        assert_eq!(submitted[0].contract_name, "TestNft");
        assert_eq!(submitted[1].address, PROXY);
        assert_eq!(submitted[1].contract_name, PROXY_ARTIFACT);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_other_targets() {
        let verifier = MockVerifier::default()
            .with_outcome(IMPL_V1, StepOutcome::Failed("rate limited".to_string()));
        let blocks = MockBlockSource::advancing(10);

        let summary = verify_contracts(
            &policy(),
            "sepolia",
            &targets(),
            Some(&verifier),
            &blocks,
            10,
            pending(),
        )
        .await;

        assert!(!summary.all_verified());
        assert_eq!(verifier.submitted().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_submission() {
        let verifier = MockVerifier::default();
        let blocks = MockBlockSource::stalled(10);

        let summary = verify_contracts(
            &policy(),
            "sepolia",
            &targets(),
            Some(&verifier),
            &blocks,
            10,
            async {},
        )
        .await;

        assert!(matches!(summary, VerificationSummary::Aborted(_)));
        assert!(verifier.submitted().is_empty());
    }

    #[test]
    fn test_upgraded_record_targets_v2_source() {
        let mut record = sample_record(ContractKind::Token);
        assert_eq!(VerificationTarget::implementation(&record).contract_name, "TestToken");

        record.upgraded_at = Some(record.deployed_at);
        assert_eq!(VerificationTarget::implementation(&record).contract_name, "TestTokenV2");
    }

    #[tokio::test]
    async fn test_recorded_constructor_args_reach_proxy() {
        let verifier = MockVerifier::default();
        let blocks = MockBlockSource::advancing(10);

        verify_contracts(&policy(), "sepolia", &targets(), Some(&verifier), &blocks, 0, pending())
            .await;

        let submitted = verifier.submitted();
        assert_eq!(submitted[0].constructor_args, None);
        assert_eq!(submitted[1].address, PROXY);
        assert_eq!(submitted[1].constructor_args, Some(sample_constructor_args()));
        assert!(!submitted[1].guess_constructor_args);
    }

    #[test]
    fn test_forge_invocation() {
        let verifier =
            ForgeVerifier::new("key".to_string(), 11155111, Some("http://node".to_string()));
        let record = sample_record(ContractKind::Token);

        let args = forge_args(&verifier, &VerificationTarget::proxy(&record));
        let at = args.iter().position(|a| a == "--constructor-args").unwrap();
        assert_eq!(args[at + 1], "0xcafe");
        assert!(!args.contains(&"--guess-constructor-args".to_string()));

        // Records written before the arguments were kept fall back to guessing
        let legacy = DeploymentRecord { proxy_constructor_args: None, ..record };
        let args = forge_args(&verifier, &VerificationTarget::proxy(&legacy));
        assert!(args.contains(&"--guess-constructor-args".to_string()));
        assert!(!args.contains(&"--constructor-args".to_string()));
        let at = args.iter().position(|a| a == "--rpc-url").unwrap();
        assert_eq!(args[at + 1], "http://node");
    }
}
