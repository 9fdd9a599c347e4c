//! Release composer
//!
//! Under the release convention, creates one release per release
//! destination with the built executables attached as assets. The release
//! body combines the release notes with the changelog.

use async_trait::async_trait;

use super::Composer;
use crate::core::artifact::{Artifact, ArtifactType};
use crate::core::context::BuildContext;
use crate::core::destination::Destination;
use crate::core::ordering::Dependent;
use crate::core::recipe::{artifacts_of, Recipe};
use crate::error::ComposeError;

/// Composes hosting platform releases
#[derive(Debug, Clone, Default)]
pub struct ReleaseComposer;

impl ReleaseComposer {
    /// Create a release composer
    pub fn new() -> Self {
        Self
    }
}

impl Dependent for ReleaseComposer {
    fn name(&self) -> &str {
        "release"
    }

    fn produces(&self) -> &[ArtifactType] {
        &[ArtifactType::Release]
    }

    fn consumes(&self) -> &[ArtifactType] {
        &[ArtifactType::Executable]
    }
}

/// Release body from the settled notes and changelog
fn body(context: &BuildContext) -> String {
    let mut body = context
        .release_notes
        .peek()
        .map(|notes| notes.notes)
        .unwrap_or_default();

    let changes = context
        .changelog
        .peek()
        .map(|changelog| changelog.to_markdown())
        .unwrap_or_default();
    if !changes.is_empty() {
        if !body.is_empty() {
            body.push_str("\n\n");
        }
        body.push_str("## Changes\n\n");
        body.push_str(&changes);
    }
    body
}

#[async_trait]
impl Composer for ReleaseComposer {
    async fn compose(
        &self,
        context: &BuildContext,
        cooked: &[Recipe],
    ) -> Result<Vec<Recipe>, ComposeError> {
        if !context.convention().is_release() {
            return Ok(Vec::new());
        }

        let targets: Vec<(String, String)> = context
            .destinations()
            .await
            .into_iter()
            .filter_map(|d| match d {
                Destination::Release { owner, repository } => Some((owner, repository)),
                _ => None,
            })
            .collect();
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let version = context.version();
        let tag = format!("v{version}");
        let body = body(context);
        let assets: Vec<_> = artifacts_of(cooked, ArtifactType::Executable)
            .into_iter()
            .filter_map(|artifact| artifact.path().cloned())
            .collect();

        Ok(targets
            .into_iter()
            .map(|(owner, repository)| Recipe::GitHubRelease {
                artifacts: vec![Artifact::Release {
                    name: format!("{owner}/{repository}"),
                    tag: tag.clone(),
                }],
                owner,
                repository,
                tag: tag.clone(),
                name: version.to_string(),
                body: body.clone(),
                prerelease: !version.pre.is_empty(),
                assets: assets.clone(),
            })
            .collect())
    }
}
