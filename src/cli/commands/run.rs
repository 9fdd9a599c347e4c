//! Run command implementation
//!
//! Implements `galley run`: compose and execute in one go, without writing
//! a plan file.

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use super::{compose, cook, Workspace};
use crate::cli::output::status;

/// Execute the run command
pub async fn execute(workspace: &Workspace, cancel: &CancellationToken) -> Result<()> {
    let client = workspace.hosting_client();
    let (context, book) = compose(workspace, client.clone(), cancel).await?;
    cook(workspace, &context, &book, client, cancel).await?;

    if !workspace.global.quiet {
        println!("{} Built {} step(s)", status::SUCCESS, book.recipes.len());
    }
    Ok(())
}
