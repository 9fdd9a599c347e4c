//! Helm chart composer

use async_trait::async_trait;

use super::{output_dir, parent_of, project_name, relative_all, Composer};
use crate::core::artifact::{Artifact, ArtifactType};
use crate::core::context::BuildContext;
use crate::core::destination::Destination;
use crate::core::ordering::Dependent;
use crate::core::recipe::Recipe;
use crate::error::ComposeError;
use crate::infra::filesystem;

/// Composes Helm charts: lint, package, and push under the release
/// convention
#[derive(Debug, Clone, Default)]
pub struct HelmComposer;

impl HelmComposer {
    /// Create a Helm composer
    pub fn new() -> Self {
        Self
    }
}

impl Dependent for HelmComposer {
    fn name(&self) -> &str {
        "helm"
    }

    fn produces(&self) -> &[ArtifactType] {
        &[ArtifactType::HelmChart]
    }

    fn consumes(&self) -> &[ArtifactType] {
        &[]
    }
}

/// Top-level `name:` of a `Chart.yaml`
fn chart_name(chart_yaml: &str) -> Option<&str> {
    chart_yaml.lines().find_map(|line| {
        let value = line.strip_prefix("name:")?.trim();
        let value = value.trim_matches(|c| c == '"' || c == '\'');
        (!value.is_empty()).then_some(value)
    })
}

#[async_trait]
impl Composer for HelmComposer {
    async fn compose(
        &self,
        context: &BuildContext,
        _cooked: &[Recipe],
    ) -> Result<Vec<Recipe>, ComposeError> {
        let root = context.working_directory();
        let charts = relative_all(context, filesystem::find_named(root, "Chart.yaml")?);
        let version = context.version().to_string();
        let output = output_dir("helm");

        let repositories: Vec<String> = if context.convention().is_release() {
            context
                .destinations()
                .await
                .into_iter()
                .filter_map(|d| match d {
                    Destination::ChartRepository { url } => Some(url),
                    _ => None,
                })
                .collect()
        } else {
            Vec::new()
        };

        let mut recipes = Vec::new();
        for chart_file in charts {
            let chart = parent_of(&chart_file);
            let content = filesystem::read_file(&root.join(&chart_file))?;
            let name = chart_name(&content)
                .map_or_else(|| project_name(context, &chart), ToString::to_string);
            let archive = output.join(format!("{name}-{version}.tgz"));

            recipes.push(Recipe::HelmLint {
                chart: chart.clone(),
            });
            recipes.push(Recipe::HelmPackage {
                chart,
                version: version.clone(),
                output: output.clone(),
                artifacts: vec![Artifact::HelmChart {
                    name,
                    version: version.clone(),
                    path: archive.clone(),
                }],
            });
            for repository in &repositories {
                recipes.push(Recipe::ChartPush {
                    archive: archive.clone(),
                    repository: repository.clone(),
                });
            }
        }

        Ok(recipes)
    }
}
