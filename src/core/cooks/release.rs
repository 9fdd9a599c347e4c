//! Cook publishing releases to the hosting platform
//!
//! Creates the release, uploads every asset, then uploads `checksums.txt`
//! with the SHA-256 of each asset in `sha256sum` format.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{wrong_recipe, Cook};
use crate::core::context::BuildContext;
use crate::core::recipe::{Recipe, RecipeKind};
use crate::error::CookError;
use crate::infra::hosting::{HostingClient, NewRelease};

/// Name of the uploaded checksum file
pub const CHECKSUMS_ASSET: &str = "checksums.txt";

/// Publishes [`Recipe::GitHubRelease`] through a hosting client
#[derive(Debug, Clone)]
pub struct GitHubReleaseCook {
    client: Arc<dyn HostingClient>,
}

impl GitHubReleaseCook {
    /// Create a release cook using `client`
    pub fn new(client: Arc<dyn HostingClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Cook for GitHubReleaseCook {
    fn kind(&self) -> RecipeKind {
        RecipeKind::GitHubRelease
    }

    async fn cook(
        &self,
        context: &BuildContext,
        recipe: &Recipe,
        cancel: &CancellationToken,
    ) -> Result<bool, CookError> {
        let Recipe::GitHubRelease {
            owner,
            repository,
            tag,
            name,
            body,
            prerelease,
            assets,
            ..
        } = recipe
        else {
            return Err(wrong_recipe(self.kind(), recipe));
        };

        // Read everything up front so a missing asset fails before publishing
        let mut files = Vec::with_capacity(assets.len());
        for asset in assets {
            let path = context.working_directory().join(asset);
            let content = tokio::fs::read(&path).await.map_err(|e| CookError::Io {
                path: path.clone(),
                error: e.to_string(),
            })?;
            let file_name = asset
                .file_name()
                .map_or_else(|| asset.to_string_lossy(), |n| n.to_string_lossy())
                .into_owned();
            files.push((file_name, content));
        }

        let new_release = NewRelease {
            tag_name: tag.clone(),
            target_commitish: context.git.peek().map(|git| git.sha),
            name: name.clone(),
            body: body.clone(),
            prerelease: *prerelease,
        };
        let release = match self
            .client
            .create_release(owner, repository, &new_release)
            .await
        {
            Ok(release) => release,
            Err(e) => {
                tracing::error!("Failed to create release {tag} on {owner}/{repository}: {e}");
                return Ok(false);
            }
        };
        tracing::info!("Created release {}", release.html_url);

        let mut checksums = String::new();
        for (file_name, content) in files {
            if cancel.is_cancelled() {
                tracing::warn!("Release upload cancelled before '{file_name}'");
                return Ok(false);
            }
            let digest = hex::encode(Sha256::digest(&content));
            let _ = writeln!(checksums, "{digest}  {file_name}");

            if let Err(e) = self.client.upload_asset(&release, &file_name, content).await {
                tracing::error!("Failed to upload '{file_name}': {e}");
                return Ok(false);
            }
            tracing::debug!("Uploaded {file_name}");
        }

        if !checksums.is_empty() {
            if let Err(e) = self
                .client
                .upload_asset(&release, CHECKSUMS_ASSET, checksums.into_bytes())
                .await
            {
                tracing::error!("Failed to upload '{CHECKSUMS_ASSET}': {e}");
                return Ok(false);
            }
        }

        Ok(true)
    }
}
