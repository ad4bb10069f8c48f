//! Integration tests for the token scripts. These assume that a devnet
//! (e.g. anvil) is already running and that the contracts have been compiled.

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use colored::Colorize;
use constants::{DEFAULT_ARTIFACTS_DIR, DEFAULT_PKEY, DEFAULT_RPC_URL, DEFAULT_STRANGER_PKEY};
use eyre::Result;
use test_args::TestArgs;
use test_inventory::IntegrationTest;
use tracing_subscriber::EnvFilter;

mod abis;
mod constants;
mod test_args;
mod test_inventory;
mod tests;
mod util;

/// The CLI arguments for the integration tests
#[derive(Debug, Clone, Parser)]
struct CliArgs {
    /// The directory holding the compiled contracts
    #[clap(long, default_value = DEFAULT_ARTIFACTS_DIR)]
    artifacts: PathBuf,
    /// The private key deploying & owning the contracts
    #[clap(short = 'p', long, default_value = DEFAULT_PKEY)]
    pkey: String,
    /// The private key of an account which owns nothing
    #[clap(long, default_value = DEFAULT_STRANGER_PKEY)]
    stranger_pkey: String,
    /// The RPC url to run the tests against
    #[clap(short = 'r', long, default_value = DEFAULT_RPC_URL)]
    rpc_url: String,

    // --- Test Harness Args --- //
    /// The test to run, all tests run if unset
    #[arg(short, long)]
    test: Option<String>,
    /// Show the scripts' logs
    #[arg(short, long)]
    verbose: bool,
}

// --------------
// | Entrypoint |
// --------------

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli_args = CliArgs::parse();

    let level = if cli_args.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(level)).init();

    let args = TestArgs::connect(&cli_args).await?;
    let tests = inventory::iter::<IntegrationTest>
        .into_iter()
        .filter(|t| cli_args.test.as_deref().map_or(true, |name| t.name == name))
        .collect::<Vec<_>>();
    if tests.is_empty() {
        eyre::bail!("no test named {}", cli_args.test.unwrap_or_default());
    }

    let mut failed = 0;
    for test in &tests {
        match (test.test_fn)(args.clone()).await {
            Ok(()) => println!("{} {}", "PASSED".green().bold(), test.name),
            Err(e) => {
                failed += 1;
                println!("{} {}: {e:?}", "FAILED".red().bold(), test.name);
            }
        }
    }

    println!("\n{} passed, {failed} failed", tests.len() - failed);
    Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
