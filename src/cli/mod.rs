//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no orchestration logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use anyhow::Result;
use clap::{Args, Parser};
use semver::Version;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use crate::core::context::Convention;
use crate::core::destination::Destination;
use commands::Commands;

/// Galley - convention-based build orchestrator
///
/// Recognizes the projects in a source tree, composes a build plan for them
/// and executes it.
#[derive(Parser, Debug)]
#[command(name = "galley")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Source tree to build (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// Version being built
    #[arg(long, global = true)]
    pub build_version: Option<Version>,

    /// Build convention: default or release
    #[arg(long, global = true, default_value = "default")]
    pub convention: Convention,

    /// Publish destination as <artifact>><target>, repeatable
    #[arg(long = "destination", global = true)]
    pub destinations: Vec<Destination>,

    /// Hosting platform API token
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,
}

impl Cli {
    /// Execute the CLI command
    pub async fn run(self, cancel: &CancellationToken) -> Result<()> {
        if let Some(cmd) = self.command {
            cmd.run(&self.global, cancel).await
        } else {
            // No subcommand provided, show help
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            Ok(())
        }
    }
}
