//! Composers
//!
//! A composer recognizes one ecosystem in the source tree and turns it into
//! recipes. Composers declare the artifact types they consume and produce;
//! the editor runs them in the order computed by [`crate::core::ordering`]
//! and hands each one the recipes composed before it, so artifact values
//! flow forward.
//!
//! Recipe paths are relative to the working directory. Build outputs go
//! under [`OUTPUT_DIR`](crate::config::defaults::OUTPUT_DIR).

mod dockerfile;
mod dotnet;
mod go;
mod helm;
mod python;
mod release;

pub use dockerfile::DockerfileComposer;
pub use dotnet::DotNetComposer;
pub use go::GoComposer;
pub use helm::HelmComposer;
pub use python::PythonComposer;
pub use release::ReleaseComposer;

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::defaults;
use crate::core::context::BuildContext;
use crate::core::ordering::Dependent;
use crate::core::recipe::Recipe;
use crate::core::settings::Settings;
use crate::error::ComposeError;

/// Produces recipes for one ecosystem
#[async_trait]
pub trait Composer: Dependent + Send + Sync + Debug {
    /// Recipes for this ecosystem
    ///
    /// `cooked` holds every recipe composed by earlier composers.
    async fn compose(
        &self,
        context: &BuildContext,
        cooked: &[Recipe],
    ) -> Result<Vec<Recipe>, ComposeError>;
}

/// Every built-in composer
pub fn standard_composers(settings: &Settings) -> Vec<Arc<dyn Composer>> {
    vec![
        Arc::new(DotNetComposer::new(settings.configuration())),
        Arc::new(GoComposer::new(settings.go_ldflags())),
        Arc::new(PythonComposer::new()),
        Arc::new(DockerfileComposer::new()),
        Arc::new(HelmComposer::new()),
        Arc::new(ReleaseComposer::new()),
    ]
}

/// Output directory for one ecosystem, relative to the working directory
pub(crate) fn output_dir(ecosystem: &str) -> PathBuf {
    Path::new(defaults::OUTPUT_DIR).join(ecosystem)
}

/// Name for the project rooted at `directory` (relative to the working
/// directory)
///
/// Uses the directory name, or the working directory's own name for the
/// root. The result is lowercased and restricted to characters valid in
/// image names.
pub(crate) fn project_name(context: &BuildContext, directory: &Path) -> String {
    let raw = directory
        .file_name()
        .or_else(|| context.working_directory().file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".to_string());

    let name: String = raw
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let name = name.trim_matches(|c: char| !c.is_ascii_alphanumeric());
    if name.is_empty() {
        "app".to_string()
    } else {
        name.to_string()
    }
}

/// Paths under the working directory, made relative to it
pub(crate) fn relative_all(context: &BuildContext, paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths
        .into_iter()
        .map(|p| crate::infra::filesystem::relative_to(context.working_directory(), &p))
        .collect()
}

/// Parent directory of a relative path, empty for files at the root
pub(crate) fn parent_of(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}
