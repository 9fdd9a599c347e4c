//! Plan command implementation
//!
//! Implements `galley plan`: gather, compose, and write the plan file.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use super::{compose, Workspace};
use crate::cli::output::status;

/// Execute the plan command
pub async fn execute(
    workspace: &Workspace,
    path: Option<PathBuf>,
    cancel: &CancellationToken,
) -> Result<()> {
    let (_context, book) = compose(workspace, workspace.hosting_client(), cancel).await?;

    let path = workspace.plan_path(path);
    book.save(&path)
        .with_context(|| format!("Failed to write plan to '{}'", path.display()))?;

    if workspace.global.quiet {
        return Ok(());
    }

    if book.recipes.is_empty() {
        println!(
            "{} No projects recognized in '{}'",
            status::WARNING,
            workspace.directory.display()
        );
    }
    for (index, recipe) in book.recipes.iter().enumerate() {
        println!("{:>4}. {recipe}", index + 1);
    }
    println!(
        "{} Wrote {} step(s) to {}",
        status::SUCCESS,
        book.recipes.len(),
        path.display()
    );
    Ok(())
}
