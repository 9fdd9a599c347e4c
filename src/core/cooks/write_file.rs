//! Cook writing generated files

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{wrong_recipe, Cook};
use crate::core::context::BuildContext;
use crate::core::recipe::{Recipe, RecipeKind};
use crate::error::{CookError, FilesystemError};
use crate::infra::filesystem;

/// Writes [`Recipe::WriteFile`] contents under the working directory
#[derive(Debug, Clone, Default)]
pub struct WriteFileCook;

impl WriteFileCook {
    /// Create a file-writing cook
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Cook for WriteFileCook {
    fn kind(&self) -> RecipeKind {
        RecipeKind::WriteFile
    }

    async fn cook(
        &self,
        context: &BuildContext,
        recipe: &Recipe,
        _cancel: &CancellationToken,
    ) -> Result<bool, CookError> {
        let Recipe::WriteFile { path, contents, .. } = recipe else {
            return Err(wrong_recipe(self.kind(), recipe));
        };

        let target = context.working_directory().join(path);
        filesystem::write_file(&target, contents).map_err(|e| match e {
            FilesystemError::CreateDir { path, error }
            | FilesystemError::WriteFile { path, error }
            | FilesystemError::ReadFile { path, error }
            | FilesystemError::Scan { path, error } => CookError::Io { path, error },
        })?;
        tracing::debug!("Wrote {}", target.display());
        Ok(true)
    }
}
