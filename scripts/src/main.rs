use clap::Parser;
use token_scripts::{cli::Cli, errors::ScriptError};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ScriptError> {
    // Values in `.env` never override the real environment
    dotenvy::dotenv().ok();
    let Cli { settings, command } = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().pretty().with_env_filter(filter).init();

    let res = command.run(&settings).await;
    if let Err(e) = &res {
        error!("{e}");
    }

    res
}
