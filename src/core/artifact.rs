//! Build artifacts
//!
//! Artifacts are the typed outputs a recipe promises to produce. Composers
//! declare the [`ArtifactType`]s they consume and produce, and later composers
//! read the artifact values attached to earlier recipes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of artifact, used for dependency matching between composers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactType {
    /// Native executable
    Executable,
    /// Container image
    Container,
    /// Library package (NuGet and similar)
    Package,
    /// Documentation bundle
    Documentation,
    /// Directory of published output
    Directory,
    /// Generated build file such as a Dockerfile
    BuildFile,
    /// Packaged Helm chart
    HelmChart,
    /// Published release
    Release,
}

impl ArtifactType {
    /// Every artifact type
    pub const ALL: [ArtifactType; 8] = [
        Self::Executable,
        Self::Container,
        Self::Package,
        Self::Documentation,
        Self::Directory,
        Self::BuildFile,
        Self::HelmChart,
        Self::Release,
    ];

    /// Kebab-case name used in destinations and plan files
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Executable => "executable",
            Self::Container => "container",
            Self::Package => "package",
            Self::Documentation => "documentation",
            Self::Directory => "directory",
            Self::BuildFile => "build-file",
            Self::HelmChart => "helm-chart",
            Self::Release => "release",
        }
    }

    /// Parse the kebab-case name
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating system and architecture pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    /// Operating system (`linux`, `windows`, `darwin`)
    pub os: String,
    /// Architecture (`amd64`, `arm64`)
    pub arch: String,
}

impl Platform {
    /// Create a platform
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Suffix appended to executables for this platform
    pub fn executable_suffix(&self) -> &'static str {
        if self.os == "windows" {
            ".exe"
        } else {
            ""
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// A typed build output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Artifact {
    /// Native executable for one platform
    Executable {
        name: String,
        path: PathBuf,
        platform: Platform,
    },
    /// Container image with its full references
    Container { name: String, tags: Vec<String> },
    /// Library package file
    Package {
        name: String,
        version: String,
        path: PathBuf,
    },
    /// Documentation bundle
    Documentation { name: String, path: PathBuf },
    /// Directory of published output
    Directory { name: String, path: PathBuf },
    /// Generated build file
    BuildFile { name: String, path: PathBuf },
    /// Packaged chart archive
    HelmChart {
        name: String,
        version: String,
        path: PathBuf,
    },
    /// Release on the hosting platform
    Release { name: String, tag: String },
}

impl Artifact {
    /// Type used for dependency matching
    pub fn artifact_type(&self) -> ArtifactType {
        match self {
            Self::Executable { .. } => ArtifactType::Executable,
            Self::Container { .. } => ArtifactType::Container,
            Self::Package { .. } => ArtifactType::Package,
            Self::Documentation { .. } => ArtifactType::Documentation,
            Self::Directory { .. } => ArtifactType::Directory,
            Self::BuildFile { .. } => ArtifactType::BuildFile,
            Self::HelmChart { .. } => ArtifactType::HelmChart,
            Self::Release { .. } => ArtifactType::Release,
        }
    }

    /// Artifact name
    pub fn name(&self) -> &str {
        match self {
            Self::Executable { name, .. }
            | Self::Container { name, .. }
            | Self::Package { name, .. }
            | Self::Documentation { name, .. }
            | Self::Directory { name, .. }
            | Self::BuildFile { name, .. }
            | Self::HelmChart { name, .. }
            | Self::Release { name, .. } => name,
        }
    }

    /// Filesystem location, for artifacts that live on disk
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Executable { path, .. }
            | Self::Package { path, .. }
            | Self::Documentation { path, .. }
            | Self::Directory { path, .. }
            | Self::BuildFile { path, .. }
            | Self::HelmChart { path, .. } => Some(path),
            Self::Container { .. } | Self::Release { .. } => None,
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Executable { name, platform, .. } => write!(f, "executable {name} ({platform})"),
            Self::Container { tags, .. } => write!(f, "container {}", tags.join(", ")),
            Self::Release { tag, .. } => write!(f, "release {tag}"),
            other => match other.path() {
                Some(path) => write!(f, "{} {}", other.artifact_type(), path.display()),
                None => write!(f, "{} {}", other.artifact_type(), other.name()),
            },
        }
    }
}
