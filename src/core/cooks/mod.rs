//! Cooks
//!
//! A cook carries out recipes of exactly one [`RecipeKind`]. It reports a
//! handled failure (a tool exiting non-zero, a rejected upload) as
//! `Ok(false)`. Returning an error means the cook itself is broken, and the
//! kitchen aborts the run.

mod release;
mod tool;
mod write_file;

pub use release::GitHubReleaseCook;
pub use tool::ToolCook;
pub use write_file::WriteFileCook;

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::core::context::BuildContext;
use crate::core::recipe::{Recipe, RecipeKind};
use crate::error::CookError;
use crate::infra::hosting::HostingClient;
use crate::infra::process::ProcessRunner;

/// Executes recipes of one kind
#[async_trait]
pub trait Cook: Send + Sync + Debug {
    /// Recipe kind this cook handles
    fn kind(&self) -> RecipeKind;

    /// Carry out `recipe`
    ///
    /// Returns whether the step succeeded.
    async fn cook(
        &self,
        context: &BuildContext,
        recipe: &Recipe,
        cancel: &CancellationToken,
    ) -> Result<bool, CookError>;
}

/// A cook for every recipe kind
pub fn standard_cooks(
    runner: Arc<dyn ProcessRunner>,
    client: Arc<dyn HostingClient>,
) -> Vec<Arc<dyn Cook>> {
    let mut cooks: Vec<Arc<dyn Cook>> = RecipeKind::ALL
        .into_iter()
        .filter(|kind| tool::is_tool_kind(*kind))
        .map(|kind| Arc::new(ToolCook::new(kind, Arc::clone(&runner))) as Arc<dyn Cook>)
        .collect();
    cooks.push(Arc::new(WriteFileCook::new()));
    cooks.push(Arc::new(GitHubReleaseCook::new(client)));
    cooks
}

/// Error for a recipe handed to the wrong cook
pub(crate) fn wrong_recipe(cook: RecipeKind, recipe: &Recipe) -> CookError {
    CookError::WrongRecipe {
        cook: cook.as_str(),
        recipe: recipe.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeHosting, RecordingRunner};
    use std::collections::BTreeSet;

    #[test]
    fn test_standard_cooks_cover_every_kind_once() {
        let cooks = standard_cooks(
            Arc::new(RecordingRunner::default()),
            Arc::new(FakeHosting::default()),
        );
        let kinds: BTreeSet<RecipeKind> = cooks.iter().map(|c| c.kind()).collect();

        assert_eq!(kinds.len(), cooks.len());
        assert_eq!(kinds.len(), RecipeKind::ALL.len());
    }
}
