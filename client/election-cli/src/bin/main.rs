use std::path::PathBuf;

use anyhow::Context;
use election_cli::workflows::Workflows;
use election_cli::{clap, config_path, load_config};
use election_client::ElectionSession;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
/// Vote in and administer an on-chain election
pub struct App {
    /// Configuration file. Defaults to `$ELECTION_CONFIG`, then `election_config.toml`
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    workflow: Workflows,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Unable to set global default subscriber")?;

    let invocation = <App as clap::Parser>::parse();
    let config = load_config(config_path(invocation.config).as_deref())?;
    let session = ElectionSession::connect(&config)
        .await
        .context("Failed to bind to the election contract")?;

    invocation
        .workflow
        .run(&session, &mut std::io::stdout().lock())
        .await
}
