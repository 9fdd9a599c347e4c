//! .NET composer
//!
//! Every `*.csproj` is built. Test projects (`<IsTestProject>true` or a name
//! ending in `Tests`) are run. Executables (`<OutputType>Exe`) are published
//! to a directory, packable libraries are packed, and packages are pushed to
//! package feeds under the release convention.

use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

use super::{output_dir, relative_all, Composer};
use crate::core::artifact::{Artifact, ArtifactType};
use crate::core::context::BuildContext;
use crate::core::destination::Destination;
use crate::core::ordering::Dependent;
use crate::core::recipe::Recipe;
use crate::error::ComposeError;
use crate::infra::filesystem;

/// Kind of .NET project, from its project file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProjectKind {
    Test,
    Executable,
    Library { packable: bool },
}

/// Composes .NET projects
#[derive(Debug, Clone)]
pub struct DotNetComposer {
    configuration: String,
}

impl DotNetComposer {
    /// Create a composer building with `configuration`
    pub fn new(configuration: &str) -> Self {
        Self {
            configuration: configuration.to_string(),
        }
    }
}

impl Dependent for DotNetComposer {
    fn name(&self) -> &str {
        "dotnet"
    }

    fn produces(&self) -> &[ArtifactType] {
        &[ArtifactType::Package, ArtifactType::Directory]
    }

    fn consumes(&self) -> &[ArtifactType] {
        &[]
    }
}

fn property(content: &str, name: &str) -> Option<String> {
    static PROPERTY: OnceLock<Regex> = OnceLock::new();
    let regex = PROPERTY.get_or_init(|| {
        Regex::new(r"<(\w+)>\s*([^<]*?)\s*</(\w+)>")
            .unwrap_or_else(|e| unreachable!("property pattern is valid: {e}"))
    });

    regex
        .captures_iter(content)
        .find(|c| c[1] == *name && c[3] == *name)
        .map(|c| c[2].to_string())
}

fn classify(file_stem: &str, content: &str) -> ProjectKind {
    let flag = |name: &str, value: &str| {
        property(content, name).is_some_and(|v| v.eq_ignore_ascii_case(value))
    };

    if flag("IsTestProject", "true") || file_stem.ends_with("Tests") || file_stem.ends_with(".Test") {
        ProjectKind::Test
    } else if flag("OutputType", "exe") {
        ProjectKind::Executable
    } else {
        ProjectKind::Library {
            packable: !flag("IsPackable", "false"),
        }
    }
}

#[async_trait]
impl Composer for DotNetComposer {
    async fn compose(
        &self,
        context: &BuildContext,
        _cooked: &[Recipe],
    ) -> Result<Vec<Recipe>, ComposeError> {
        let root = context.working_directory();
        let projects = relative_all(context, filesystem::find_with_extension(root, "csproj")?);
        let version = context.version().to_string();
        let output = output_dir("dotnet");

        let mut builds = Vec::new();
        let mut tests = Vec::new();
        let mut outputs = Vec::new();
        let mut packages: Vec<PathBuf> = Vec::new();

        for project in projects {
            let content = filesystem::read_file(&root.join(&project))?;
            let stem = project
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();

            builds.push(Recipe::DotNetBuild {
                project: project.clone(),
                configuration: self.configuration.clone(),
                version: version.clone(),
            });

            match classify(&stem, &content) {
                ProjectKind::Test => tests.push(Recipe::DotNetTest {
                    project,
                    configuration: self.configuration.clone(),
                }),
                ProjectKind::Executable => {
                    let directory = output.join(&stem);
                    outputs.push(Recipe::DotNetPublish {
                        project,
                        configuration: self.configuration.clone(),
                        version: version.clone(),
                        output: directory.clone(),
                        artifacts: vec![Artifact::Directory {
                            name: stem,
                            path: directory,
                        }],
                    });
                }
                ProjectKind::Library { packable: true } => {
                    let package_dir = output.join("packages");
                    let package = package_dir.join(format!("{stem}.{version}.nupkg"));
                    packages.push(package.clone());
                    outputs.push(Recipe::DotNetPack {
                        project,
                        configuration: self.configuration.clone(),
                        version: version.clone(),
                        output: package_dir,
                        artifacts: vec![Artifact::Package {
                            name: stem,
                            version: version.clone(),
                            path: package,
                        }],
                    });
                }
                ProjectKind::Library { packable: false } => {}
            }
        }

        let mut recipes = builds;
        recipes.extend(tests);
        recipes.extend(outputs);

        if context.convention().is_release() {
            let feeds: Vec<String> = context
                .destinations()
                .await
                .into_iter()
                .filter_map(|d| match d {
                    Destination::PackageFeed { url } => Some(url),
                    _ => None,
                })
                .collect();
            for package in &packages {
                for feed in &feeds {
                    recipes.push(Recipe::DotNetNuGetPush {
                        package: package.clone(),
                        feed: feed.clone(),
                    });
                }
            }
        }

        Ok(recipes)
    }
}
