//! Galley CLI - convention-based build orchestrator
//!
//! Entry point for the galley command-line application.

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use galley::cli::output::{display_error, log_level};
use galley::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(log_level(cli.global.verbose, cli.global.quiet).into()),
        )
        .init();

    // Ctrl-C stops the run before the next step
    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping");
            signal.cancel();
        }
    });

    // Run the command and handle errors
    match cli.run(&cancel).await {
        Ok(()) => Ok(()),
        Err(e) => {
            display_error(&e);
            std::process::exit(1);
        }
    }
}
