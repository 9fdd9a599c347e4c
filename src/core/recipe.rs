//! Recipes (plan steps)
//!
//! A [`Recipe`] is one concrete build action together with the artifacts it
//! will produce. Recipes are immutable once composed. Every variant has a
//! matching [`RecipeKind`], which the kitchen uses to find its cook.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::core::artifact::{Artifact, ArtifactType, Platform};

/// A single build step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Recipe {
    /// Compile a .NET project
    #[serde(rename = "dotnet-build")]
    DotNetBuild {
        project: PathBuf,
        configuration: String,
        version: String,
    },

    /// Run a .NET test project
    #[serde(rename = "dotnet-test")]
    DotNetTest {
        project: PathBuf,
        configuration: String,
    },

    /// Publish a .NET executable project to a directory
    #[serde(rename = "dotnet-publish")]
    DotNetPublish {
        project: PathBuf,
        configuration: String,
        version: String,
        output: PathBuf,
        #[serde(default)]
        artifacts: Vec<Artifact>,
    },

    /// Pack a .NET library into a package
    #[serde(rename = "dotnet-pack")]
    DotNetPack {
        project: PathBuf,
        configuration: String,
        version: String,
        output: PathBuf,
        #[serde(default)]
        artifacts: Vec<Artifact>,
    },

    /// Push a package to a feed
    #[serde(rename = "dotnet-nuget-push")]
    DotNetNuGetPush { package: PathBuf, feed: String },

    /// Run Go tests for a module
    #[serde(rename = "go-test")]
    GoTest { module: PathBuf },

    /// Build a Go main package for one platform
    #[serde(rename = "go-build")]
    GoBuild {
        module: PathBuf,
        package: String,
        output: PathBuf,
        ldflags: String,
        platform: Platform,
        #[serde(default)]
        artifacts: Vec<Artifact>,
    },

    /// Install Python requirements
    #[serde(rename = "pip-install")]
    PipInstall {
        directory: PathBuf,
        requirements: PathBuf,
    },

    /// Run Python tests
    #[serde(rename = "python-test")]
    PythonTest { directory: PathBuf },

    /// Write a generated file
    #[serde(rename = "write-file")]
    WriteFile {
        path: PathBuf,
        contents: String,
        #[serde(default)]
        artifacts: Vec<Artifact>,
    },

    /// Build a container image
    #[serde(rename = "docker-build")]
    DockerBuild {
        dockerfile: PathBuf,
        context: PathBuf,
        #[serde(default)]
        tags: Vec<String>,
        #[serde(default)]
        labels: Vec<String>,
        #[serde(default)]
        artifacts: Vec<Artifact>,
    },

    /// Push container image tags
    #[serde(rename = "docker-push")]
    DockerPush { tags: Vec<String> },

    /// Lint a Helm chart
    #[serde(rename = "helm-lint")]
    HelmLint { chart: PathBuf },

    /// Package a Helm chart
    #[serde(rename = "helm-package")]
    HelmPackage {
        chart: PathBuf,
        version: String,
        output: PathBuf,
        #[serde(default)]
        artifacts: Vec<Artifact>,
    },

    /// Push a packaged chart to a repository
    #[serde(rename = "chart-push")]
    ChartPush { archive: PathBuf, repository: String },

    /// Create a release on the hosting platform and upload assets
    #[serde(rename = "github-release")]
    GitHubRelease {
        owner: String,
        repository: String,
        tag: String,
        name: String,
        body: String,
        prerelease: bool,
        #[serde(default)]
        assets: Vec<PathBuf>,
        #[serde(default)]
        artifacts: Vec<Artifact>,
    },
}

/// Discriminant of [`Recipe`], used to register cooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecipeKind {
    DotNetBuild,
    DotNetTest,
    DotNetPublish,
    DotNetPack,
    DotNetNuGetPush,
    GoTest,
    GoBuild,
    PipInstall,
    PythonTest,
    WriteFile,
    DockerBuild,
    DockerPush,
    HelmLint,
    HelmPackage,
    ChartPush,
    GitHubRelease,
}

impl RecipeKind {
    /// Every recipe kind
    pub const ALL: [RecipeKind; 16] = [
        Self::DotNetBuild,
        Self::DotNetTest,
        Self::DotNetPublish,
        Self::DotNetPack,
        Self::DotNetNuGetPush,
        Self::GoTest,
        Self::GoBuild,
        Self::PipInstall,
        Self::PythonTest,
        Self::WriteFile,
        Self::DockerBuild,
        Self::DockerPush,
        Self::HelmLint,
        Self::HelmPackage,
        Self::ChartPush,
        Self::GitHubRelease,
    ];

    /// Name as written in plan files
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DotNetBuild => "dotnet-build",
            Self::DotNetTest => "dotnet-test",
            Self::DotNetPublish => "dotnet-publish",
            Self::DotNetPack => "dotnet-pack",
            Self::DotNetNuGetPush => "dotnet-nuget-push",
            Self::GoTest => "go-test",
            Self::GoBuild => "go-build",
            Self::PipInstall => "pip-install",
            Self::PythonTest => "python-test",
            Self::WriteFile => "write-file",
            Self::DockerBuild => "docker-build",
            Self::DockerPush => "docker-push",
            Self::HelmLint => "helm-lint",
            Self::HelmPackage => "helm-package",
            Self::ChartPush => "chart-push",
            Self::GitHubRelease => "github-release",
        }
    }
}

impl fmt::Display for RecipeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Recipe {
    /// Discriminant used for cook lookup
    pub fn kind(&self) -> RecipeKind {
        match self {
            Self::DotNetBuild { .. } => RecipeKind::DotNetBuild,
            Self::DotNetTest { .. } => RecipeKind::DotNetTest,
            Self::DotNetPublish { .. } => RecipeKind::DotNetPublish,
            Self::DotNetPack { .. } => RecipeKind::DotNetPack,
            Self::DotNetNuGetPush { .. } => RecipeKind::DotNetNuGetPush,
            Self::GoTest { .. } => RecipeKind::GoTest,
            Self::GoBuild { .. } => RecipeKind::GoBuild,
            Self::PipInstall { .. } => RecipeKind::PipInstall,
            Self::PythonTest { .. } => RecipeKind::PythonTest,
            Self::WriteFile { .. } => RecipeKind::WriteFile,
            Self::DockerBuild { .. } => RecipeKind::DockerBuild,
            Self::DockerPush { .. } => RecipeKind::DockerPush,
            Self::HelmLint { .. } => RecipeKind::HelmLint,
            Self::HelmPackage { .. } => RecipeKind::HelmPackage,
            Self::ChartPush { .. } => RecipeKind::ChartPush,
            Self::GitHubRelease { .. } => RecipeKind::GitHubRelease,
        }
    }

    /// Artifacts this recipe will produce
    pub fn artifacts(&self) -> &[Artifact] {
        match self {
            Self::DotNetPublish { artifacts, .. }
            | Self::DotNetPack { artifacts, .. }
            | Self::GoBuild { artifacts, .. }
            | Self::WriteFile { artifacts, .. }
            | Self::DockerBuild { artifacts, .. }
            | Self::HelmPackage { artifacts, .. }
            | Self::GitHubRelease { artifacts, .. } => artifacts,
            _ => &[],
        }
    }
}

/// Every artifact of the given type produced by the recipes so far
pub fn artifacts_of(recipes: &[Recipe], artifact_type: ArtifactType) -> Vec<&Artifact> {
    recipes
        .iter()
        .flat_map(Recipe::artifacts)
        .filter(|a| a.artifact_type() == artifact_type)
        .collect()
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DotNetBuild { project, .. } => write!(f, "dotnet build {}", project.display()),
            Self::DotNetTest { project, .. } => write!(f, "dotnet test {}", project.display()),
            Self::DotNetPublish { project, .. } => {
                write!(f, "dotnet publish {}", project.display())
            }
            Self::DotNetPack { project, .. } => write!(f, "dotnet pack {}", project.display()),
            Self::DotNetNuGetPush { package, feed } => {
                write!(f, "dotnet nuget push {} to {feed}", package.display())
            }
            Self::GoTest { module } => write!(f, "go test {}", module.display()),
            Self::GoBuild {
                package, platform, ..
            } => write!(f, "go build {package} ({platform})"),
            Self::PipInstall { requirements, .. } => {
                write!(f, "pip install -r {}", requirements.display())
            }
            Self::PythonTest { directory } => write!(f, "pytest {}", directory.display()),
            Self::WriteFile { path, .. } => write!(f, "write {}", path.display()),
            Self::DockerBuild {
                dockerfile, tags, ..
            } => write!(f, "docker build {} [{}]", dockerfile.display(), tags.join(", ")),
            Self::DockerPush { tags } => write!(f, "docker push [{}]", tags.join(", ")),
            Self::HelmLint { chart } => write!(f, "helm lint {}", chart.display()),
            Self::HelmPackage { chart, .. } => write!(f, "helm package {}", chart.display()),
            Self::ChartPush {
                archive,
                repository,
            } => write!(f, "helm push {} {repository}", archive.display()),
            Self::GitHubRelease {
                owner,
                repository,
                tag,
                ..
            } => write!(f, "release {owner}/{repository} {tag}"),
        }
    }
}
