//! Build context
//!
//! The per-run record of build facts. Some fields are known when the run
//! starts (version, working directory, convention). The rest are [`Fact`]s
//! settled concurrently by gatherers. [`BuildContext::new`] hands back the
//! write halves as [`FactSetters`], one per fact, so each fact has exactly
//! one writer.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::sync::RwLock;

use crate::core::destination::Destination;
use crate::core::fact::{fact, Fact, FactSetter};

/// Fact names, used in logs and errors
pub mod facts {
    /// Version control information
    pub const GIT: &str = "git";
    /// Hosting platform information
    pub const HOSTING: &str = "hosting";
    /// Project description
    pub const DESCRIPTION: &str = "description";
    /// Release notes for the current version
    pub const RELEASE_NOTES: &str = "release-notes";
    /// Pull request associated with the current commit
    pub const PULL_REQUEST: &str = "pull-request";
    /// Changes since the previous release
    pub const CHANGELOG: &str = "changelog";
}

/// Build convention
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Convention {
    /// Build and test only
    #[default]
    Default,
    /// Build, test and publish to destinations
    Release,
}

impl Convention {
    /// Whether publishing recipes should be composed
    pub fn is_release(self) -> bool {
        self == Self::Release
    }
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("default"),
            Self::Release => f.write_str("release"),
        }
    }
}

impl FromStr for Convention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "release" => Ok(Self::Release),
            other => Err(format!(
                "unknown convention '{other}' (expected 'default' or 'release')"
            )),
        }
    }
}

/// Version control information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitInfo {
    /// Current commit SHA
    pub sha: String,
    /// URL of the `origin` remote, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<String>,
}

/// Hosting platform information derived from the origin remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostingInfo {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repository: String,
    /// Web URL of the repository
    pub url: String,
    /// REST API base URL
    pub api_url: String,
}

/// Human-readable project description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    /// Description text
    pub text: String,
}

/// Release notes for one version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseNotes {
    /// Version heading the notes were taken from
    pub version: String,
    /// Notes body
    pub notes: String,
}

/// Pull request associated with the built commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestInfo {
    /// Pull request number
    pub number: u64,
    /// Title
    pub title: String,
    /// Web URL
    pub url: String,
    /// Labels
    #[serde(default)]
    pub labels: Vec<String>,
}

/// One merged change since the previous release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    /// Pull request number
    pub number: u64,
    /// Title
    pub title: String,
    /// Author login
    pub author: String,
}

/// Changes since the previous release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changelog {
    /// Tag of the previous release, if there was one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    /// Entries, newest first
    #[serde(default)]
    pub entries: Vec<ChangelogEntry>,
}

impl Changelog {
    /// Render as a markdown list
    pub fn to_markdown(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("- {} (#{}) @{}", e.title, e.number, e.author))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Write halves of every pending fact in a [`BuildContext`]
#[derive(Debug)]
pub struct FactSetters {
    /// Version control information
    pub git: FactSetter<GitInfo>,
    /// Hosting platform information
    pub hosting: FactSetter<HostingInfo>,
    /// Project description
    pub description: FactSetter<Description>,
    /// Release notes
    pub release_notes: FactSetter<ReleaseNotes>,
    /// Associated pull request
    pub pull_request: FactSetter<PullRequestInfo>,
    /// Changelog
    pub changelog: FactSetter<Changelog>,
}

/// Per-run build context
#[derive(Debug)]
pub struct BuildContext {
    version: Version,
    working_directory: PathBuf,
    convention: Convention,
    /// Written only by the destination gatherer during the gather phase
    destinations: RwLock<Vec<Destination>>,
    /// Version control information
    pub git: Fact<GitInfo>,
    /// Hosting platform information
    pub hosting: Fact<HostingInfo>,
    /// Project description
    pub description: Fact<Description>,
    /// Release notes
    pub release_notes: Fact<ReleaseNotes>,
    /// Associated pull request
    pub pull_request: Fact<PullRequestInfo>,
    /// Changelog
    pub changelog: Fact<Changelog>,
}

impl BuildContext {
    /// Create a context whose facts are all pending
    pub fn new(
        version: Version,
        working_directory: PathBuf,
        convention: Convention,
        destinations: Vec<Destination>,
    ) -> (Self, FactSetters) {
        let (git_setter, git) = fact(facts::GIT);
        let (hosting_setter, hosting) = fact(facts::HOSTING);
        let (description_setter, description) = fact(facts::DESCRIPTION);
        let (release_notes_setter, release_notes) = fact(facts::RELEASE_NOTES);
        let (pull_request_setter, pull_request) = fact(facts::PULL_REQUEST);
        let (changelog_setter, changelog) = fact(facts::CHANGELOG);

        let context = Self {
            version,
            working_directory,
            convention,
            destinations: RwLock::new(destinations),
            git,
            hosting,
            description,
            release_notes,
            pull_request,
            changelog,
        };
        let setters = FactSetters {
            git: git_setter,
            hosting: hosting_setter,
            description: description_setter,
            release_notes: release_notes_setter,
            pull_request: pull_request_setter,
            changelog: changelog_setter,
        };
        (context, setters)
    }

    /// Rebuild a context from a persisted snapshot, with every fact settled
    pub fn from_snapshot(snapshot: ContextSnapshot) -> Self {
        Self {
            version: snapshot.version,
            working_directory: snapshot.working_directory,
            convention: snapshot.convention,
            destinations: RwLock::new(snapshot.destinations),
            git: Fact::settled(facts::GIT, snapshot.git),
            hosting: Fact::settled(facts::HOSTING, snapshot.hosting),
            description: Fact::settled(facts::DESCRIPTION, snapshot.description),
            release_notes: Fact::settled(facts::RELEASE_NOTES, snapshot.release_notes),
            pull_request: Fact::settled(facts::PULL_REQUEST, snapshot.pull_request),
            changelog: Fact::settled(facts::CHANGELOG, snapshot.changelog),
        }
    }

    /// Version being built
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Root of the source tree
    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Build convention
    pub fn convention(&self) -> Convention {
        self.convention
    }

    /// Current publish destinations
    pub async fn destinations(&self) -> Vec<Destination> {
        self.destinations.read().await.clone()
    }

    /// Mutable access to the destinations, for the destination gatherer
    pub(crate) async fn destinations_mut(&self) -> tokio::sync::RwLockWriteGuard<'_, Vec<Destination>> {
        self.destinations.write().await
    }

    /// Capture the context for persistence
    ///
    /// Facts that are pending or failed are recorded as absent.
    pub async fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            version: self.version.clone(),
            working_directory: self.working_directory.clone(),
            convention: self.convention,
            destinations: self.destinations().await,
            git: self.git.peek(),
            hosting: self.hosting.peek(),
            description: self.description.peek(),
            release_notes: self.release_notes.peek(),
            pull_request: self.pull_request.peek(),
            changelog: self.changelog.peek(),
        }
    }
}

/// Persistable copy of a [`BuildContext`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    /// Version being built
    pub version: Version,
    /// Root of the source tree
    pub working_directory: PathBuf,
    /// Build convention
    pub convention: Convention,
    /// Publish destinations (resolved)
    #[serde(default)]
    pub destinations: Vec<Destination>,
    /// Version control information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitInfo>,
    /// Hosting platform information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosting: Option<HostingInfo>,
    /// Project description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Description>,
    /// Release notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<ReleaseNotes>,
    /// Associated pull request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<PullRequestInfo>,
    /// Changelog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<Changelog>,
}
