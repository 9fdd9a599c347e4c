//! Python composer
//!
//! A Python service is a directory with a `requirements.txt` next to a
//! `main.py` or `app.py`. Requirements are installed, `tests/` is run with
//! pytest when present, and a Dockerfile is generated for services that do
//! not ship one.

use async_trait::async_trait;

use super::{parent_of, project_name, relative_all, Composer};
use crate::core::artifact::{Artifact, ArtifactType};
use crate::core::context::BuildContext;
use crate::core::ordering::Dependent;
use crate::core::recipe::Recipe;
use crate::error::ComposeError;
use crate::infra::filesystem;

const ENTRY_POINTS: [&str; 2] = ["main.py", "app.py"];

/// Composes Python services
#[derive(Debug, Clone, Default)]
pub struct PythonComposer;

impl PythonComposer {
    /// Create a Python composer
    pub fn new() -> Self {
        Self
    }
}

impl Dependent for PythonComposer {
    fn name(&self) -> &str {
        "python"
    }

    fn produces(&self) -> &[ArtifactType] {
        &[ArtifactType::BuildFile]
    }

    fn consumes(&self) -> &[ArtifactType] {
        &[]
    }
}

/// Dockerfile for a service started by `entry_point`
fn dockerfile(entry_point: &str) -> String {
    format!(
        "FROM python:3.12-slim\n\
         WORKDIR /app\n\
         COPY requirements.txt .\n\
         RUN pip install --no-cache-dir -r requirements.txt\n\
         COPY . .\n\
         CMD [\"python\", \"{entry_point}\"]\n"
    )
}

#[async_trait]
impl Composer for PythonComposer {
    async fn compose(
        &self,
        context: &BuildContext,
        _cooked: &[Recipe],
    ) -> Result<Vec<Recipe>, ComposeError> {
        let root = context.working_directory();
        let manifests = relative_all(context, filesystem::find_named(root, "requirements.txt")?);
        let mut recipes = Vec::new();

        for requirements in manifests {
            let directory = parent_of(&requirements);
            let absolute = root.join(&directory);
            let Some(entry_point) = ENTRY_POINTS
                .into_iter()
                .find(|name| absolute.join(name).is_file())
            else {
                tracing::debug!(
                    "Skipping '{}': no {} next to it",
                    requirements.display(),
                    ENTRY_POINTS.join(" or ")
                );
                continue;
            };

            recipes.push(Recipe::PipInstall {
                directory: directory.clone(),
                requirements: requirements.clone(),
            });

            if absolute.join("tests").is_dir() {
                recipes.push(Recipe::PythonTest {
                    directory: directory.clone(),
                });
            }

            let dockerfile_path = directory.join("Dockerfile");
            if !root.join(&dockerfile_path).exists() {
                recipes.push(Recipe::WriteFile {
                    path: dockerfile_path.clone(),
                    contents: dockerfile(entry_point),
                    artifacts: vec![Artifact::BuildFile {
                        name: project_name(context, &directory),
                        path: dockerfile_path,
                    }],
                });
            }
        }

        Ok(recipes)
    }
}
