//! Apply command implementation
//!
//! Implements `galley apply`: read a plan file and execute it against the
//! context recorded in it.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use super::{cook, Workspace};
use crate::cli::output::status;
use crate::core::book::Book;
use crate::core::context::BuildContext;

/// Execute the apply command
pub async fn execute(
    workspace: &Workspace,
    path: Option<PathBuf>,
    cancel: &CancellationToken,
) -> Result<()> {
    let path = workspace.plan_path(path);
    let book = Book::load(&path)
        .with_context(|| format!("Failed to load plan from '{}'", path.display()))?;
    tracing::info!(
        "Applying {} step(s) for version {}",
        book.recipes.len(),
        book.metadata.version
    );

    let context = BuildContext::from_snapshot(book.metadata.clone());
    cook(workspace, &context, &book, workspace.hosting_client(), cancel).await?;

    if !workspace.global.quiet {
        println!("{} Applied {} step(s)", status::SUCCESS, book.recipes.len());
    }
    Ok(())
}
