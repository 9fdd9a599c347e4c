//! Container image composer
//!
//! Builds an image for every `Dockerfile` in the source tree and for every
//! build file generated by an earlier composer. Images are tagged for each
//! container destination and pushed under the release convention.

use async_trait::async_trait;
use std::path::PathBuf;

use super::{parent_of, project_name, relative_all, Composer};
use crate::core::artifact::{Artifact, ArtifactType};
use crate::core::context::BuildContext;
use crate::core::destination::Destination;
use crate::core::ordering::Dependent;
use crate::core::recipe::{artifacts_of, Recipe};
use crate::error::ComposeError;
use crate::infra::filesystem;

/// Composes container image builds
#[derive(Debug, Clone, Default)]
pub struct DockerfileComposer;

impl DockerfileComposer {
    /// Create a container image composer
    pub fn new() -> Self {
        Self
    }
}

impl Dependent for DockerfileComposer {
    fn name(&self) -> &str {
        "dockerfile"
    }

    fn produces(&self) -> &[ArtifactType] {
        &[ArtifactType::Container]
    }

    fn consumes(&self) -> &[ArtifactType] {
        &[ArtifactType::BuildFile]
    }
}

/// OCI image labels from the settled facts
fn labels(context: &BuildContext) -> Vec<String> {
    let mut labels = vec![format!(
        "org.opencontainers.image.version={}",
        context.version()
    )];
    if let Some(git) = context.git.peek() {
        labels.push(format!("org.opencontainers.image.revision={}", git.sha));
    }
    if let Some(hosting) = context.hosting.peek() {
        labels.push(format!("org.opencontainers.image.source={}", hosting.url));
    }
    if let Some(description) = context.description.peek() {
        labels.push(format!(
            "org.opencontainers.image.description={}",
            description.text
        ));
    }
    labels
}

#[async_trait]
impl Composer for DockerfileComposer {
    async fn compose(
        &self,
        context: &BuildContext,
        cooked: &[Recipe],
    ) -> Result<Vec<Recipe>, ComposeError> {
        let root = context.working_directory();

        // Existing files first, then generated ones not already on disk
        let mut dockerfiles: Vec<(String, PathBuf)> =
            relative_all(context, filesystem::find_named(root, "Dockerfile")?)
                .into_iter()
                .map(|path| (project_name(context, &parent_of(&path)), path))
                .collect();
        for artifact in artifacts_of(cooked, ArtifactType::BuildFile) {
            if let Artifact::BuildFile { name, path } = artifact {
                if !dockerfiles.iter().any(|(_, existing)| existing == path) {
                    dockerfiles.push((name.clone(), path.clone()));
                }
            }
        }

        let registries: Vec<String> = context
            .destinations()
            .await
            .into_iter()
            .filter_map(|d| match d {
                Destination::Container { registry } => Some(registry),
                _ => None,
            })
            .collect();
        let version = context.version().to_string();
        let publish = context.convention().is_release() && !registries.is_empty();
        let labels = labels(context);
        let mut recipes = Vec::new();

        for (name, dockerfile) in dockerfiles {
            let tags: Vec<String> = if registries.is_empty() {
                vec![format!("{name}:{version}")]
            } else {
                registries
                    .iter()
                    .map(|registry| format!("{registry}/{name}:{version}"))
                    .collect()
            };

            recipes.push(Recipe::DockerBuild {
                context: parent_of(&dockerfile),
                dockerfile,
                tags: tags.clone(),
                labels: labels.clone(),
                artifacts: vec![Artifact::Container {
                    name,
                    tags: tags.clone(),
                }],
            });

            if publish {
                recipes.push(Recipe::DockerPush { tags });
            }
        }

        Ok(recipes)
    }
}
