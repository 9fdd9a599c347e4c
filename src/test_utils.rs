//! Test utilities
//!
//! Fakes for the infrastructure interfaces and proptest generators shared
//! by unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::core::context::GitInfo;
use crate::infra::git::{GitError, OriginProvider};
use crate::infra::hosting::{HostingClient, HostingError, NewRelease, PullRequest, Release};
use crate::infra::process::{CommandSpec, ProcessError, ProcessOutput, ProcessRunner};

/// Origin provider returning a fixed answer
#[derive(Debug, Clone)]
pub enum StaticOrigin {
    /// A repository with this commit and remote
    Repository { sha: String, origin_url: Option<String> },
    /// Not under version control
    Absent,
    /// Lookup fails
    Broken,
}

impl StaticOrigin {
    /// A GitHub-hosted repository at `acme/tool`
    pub fn github() -> Self {
        Self::Repository {
            sha: "0123456789abcdef0123456789abcdef01234567".to_string(),
            origin_url: Some("https://github.com/acme/tool.git".to_string()),
        }
    }
}

impl OriginProvider for StaticOrigin {
    fn origin(&self, directory: &Path) -> Result<Option<GitInfo>, GitError> {
        match self {
            Self::Repository { sha, origin_url } => Ok(Some(GitInfo {
                sha: sha.clone(),
                origin_url: origin_url.clone(),
            })),
            Self::Absent => Ok(None),
            Self::Broken => Err(GitError::InvalidRepository {
                path: directory.to_path_buf(),
                error: "corrupt".to_string(),
            }),
        }
    }
}

/// In-memory hosting client
#[derive(Debug, Default)]
pub struct FakeHosting {
    /// Pull requests for any commit
    pub commit_pulls: Vec<PullRequest>,
    /// Latest release
    pub latest: Option<Release>,
    /// Closed pull requests
    pub closed: Vec<PullRequest>,
    /// Fail every call with a server error
    pub broken: bool,
    /// Releases created so far
    pub created: Mutex<Vec<NewRelease>>,
    /// Uploaded asset names
    pub uploads: Mutex<Vec<String>>,
}

impl FakeHosting {
    fn check(&self) -> Result<(), HostingError> {
        if self.broken {
            Err(HostingError::Status {
                url: "https://api.github.com".to_string(),
                status: 500,
                message: "boom".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Names of uploaded assets
    pub fn uploaded(&self) -> Vec<String> {
        self.uploads.lock().map(|u| u.clone()).unwrap_or_default()
    }

    /// Releases created so far
    pub fn created_releases(&self) -> Vec<NewRelease> {
        self.created.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

/// A pull request as the API would return it
pub fn pull_request(number: u64, title: &str, merged_at: Option<&str>) -> PullRequest {
    PullRequest {
        number,
        title: title.to_string(),
        html_url: format!("https://github.com/acme/tool/pull/{number}"),
        state: if merged_at.is_some() { "closed" } else { "open" }.to_string(),
        merged_at: merged_at.map(ToString::to_string),
        user: Some(crate::infra::hosting::User {
            login: "octo".to_string(),
        }),
        labels: Vec::new(),
    }
}

#[async_trait]
impl HostingClient for FakeHosting {
    async fn pull_requests_for_commit(
        &self,
        _owner: &str,
        _repository: &str,
        _sha: &str,
    ) -> Result<Vec<PullRequest>, HostingError> {
        self.check()?;
        Ok(self.commit_pulls.clone())
    }

    async fn latest_release(
        &self,
        _owner: &str,
        _repository: &str,
    ) -> Result<Option<Release>, HostingError> {
        self.check()?;
        Ok(self.latest.clone())
    }

    async fn closed_pull_requests(
        &self,
        _owner: &str,
        _repository: &str,
    ) -> Result<Vec<PullRequest>, HostingError> {
        self.check()?;
        Ok(self.closed.clone())
    }

    async fn create_release(
        &self,
        owner: &str,
        repository: &str,
        release: &NewRelease,
    ) -> Result<Release, HostingError> {
        self.check()?;
        if let Ok(mut created) = self.created.lock() {
            created.push(release.clone());
        }
        Ok(Release {
            id: 1,
            tag_name: release.tag_name.clone(),
            html_url: format!("https://github.com/{owner}/{repository}/releases/1"),
            upload_url: "https://uploads.github.com/releases/1/assets{?name,label}".to_string(),
            published_at: None,
        })
    }

    async fn upload_asset(
        &self,
        _release: &Release,
        name: &str,
        _content: Vec<u8>,
    ) -> Result<(), HostingError> {
        self.check()?;
        if let Ok(mut uploads) = self.uploads.lock() {
            uploads.push(name.to_string());
        }
        Ok(())
    }
}

/// Process runner that records commands and replays scripted outputs
///
/// Commands without a scripted output succeed with empty output.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    outputs: Mutex<VecDeque<Result<ProcessOutput, ProcessError>>>,
    commands: Mutex<Vec<CommandSpec>>,
}

impl RecordingRunner {
    /// Runner whose next results are `outputs`, in order
    pub fn scripted(outputs: Vec<Result<ProcessOutput, ProcessError>>) -> Self {
        Self {
            outputs: Mutex::new(outputs.into()),
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Commands run so far, rendered as command lines
    pub fn command_lines(&self) -> Vec<String> {
        self.commands
            .lock()
            .map(|c| c.iter().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    /// Commands run so far
    pub fn commands(&self) -> Vec<CommandSpec> {
        self.commands.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ProcessRunner for RecordingRunner {
    async fn run(
        &self,
        command: &CommandSpec,
        _cancel: &CancellationToken,
    ) -> Result<ProcessOutput, ProcessError> {
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(command.clone());
        }
        self.outputs
            .lock()
            .ok()
            .and_then(|mut outputs| outputs.pop_front())
            .unwrap_or_else(|| Ok(ProcessOutput::ok("")))
    }
}

/// Proptest generators
pub mod generators {
    use proptest::prelude::*;
    use std::path::PathBuf;

    use semver::Version;

    use crate::core::artifact::{Artifact, ArtifactType, Platform};
    use crate::core::context::{
        Changelog, ChangelogEntry, ContextSnapshot, Convention, Description, GitInfo,
        HostingInfo, PullRequestInfo, ReleaseNotes,
    };
    use crate::core::destination::Destination;
    use crate::core::recipe::Recipe;

    /// Lowercase identifier
    pub fn identifier() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,12}"
    }

    /// Relative path of one to three segments
    pub fn relative_path() -> impl Strategy<Value = PathBuf> {
        proptest::collection::vec(identifier(), 1..=3).prop_map(|parts| parts.iter().collect())
    }

    /// Semver version string
    pub fn semver_version() -> impl Strategy<Value = String> {
        (0u32..20, 0u32..20, 0u32..50)
            .prop_map(|(major, minor, patch)| format!("{major}.{minor}.{patch}"))
    }

    /// Target platform
    pub fn platform() -> impl Strategy<Value = Platform> {
        prop_oneof![
            Just(Platform::new("linux", "amd64")),
            Just(Platform::new("linux", "arm64")),
            Just(Platform::new("windows", "amd64")),
        ]
    }

    /// Multi-line free text with characters TOML must escape and either
    /// line ending style
    pub fn multiline_text() -> impl Strategy<Value = String> {
        (
            proptest::collection::vec("[ -~\t\u{e9}\u{4e2d}]{0,30}", 0..6),
            any::<bool>(),
        )
            .prop_map(|(lines, crlf)| lines.join(if crlf { "\r\n" } else { "\n" }))
    }

    /// A recipe of any kind with arbitrary parameters
    pub fn recipe() -> impl Strategy<Value = Recipe> {
        prop_oneof![dotnet_recipe(), source_recipe(), publish_recipe()]
    }

    fn dotnet_recipe() -> impl Strategy<Value = Recipe> {
        prop_oneof![
            (relative_path(), identifier(), semver_version()).prop_map(
                |(project, configuration, version)| Recipe::DotNetBuild {
                    project,
                    configuration,
                    version,
                }
            ),
            (relative_path(), identifier()).prop_map(|(project, configuration)| {
                Recipe::DotNetTest {
                    project,
                    configuration,
                }
            }),
            (relative_path(), identifier(), semver_version(), relative_path(), platform())
                .prop_map(|(project, configuration, version, output, platform)| {
                    let name = project
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    Recipe::DotNetPublish {
                        artifacts: vec![
                            Artifact::Executable {
                                name: name.clone(),
                                path: output.join(&name),
                                platform,
                            },
                            Artifact::Directory {
                                name,
                                path: output.clone(),
                            },
                        ],
                        project,
                        configuration,
                        version,
                        output,
                    }
                }),
            (relative_path(), identifier(), semver_version(), relative_path()).prop_map(
                |(project, name, version, output)| Recipe::DotNetPack {
                    artifacts: vec![Artifact::Package {
                        name: name.clone(),
                        version: version.clone(),
                        path: output.join(format!("{name}.{version}.nupkg")),
                    }],
                    configuration: "Release".to_string(),
                    project,
                    version,
                    output,
                }
            ),
            (relative_path(), identifier()).prop_map(|(package, feed)| {
                Recipe::DotNetNuGetPush {
                    package: package.with_extension("nupkg"),
                    feed: format!("https://nuget.example.com/{feed}/index.json"),
                }
            }),
        ]
    }

    fn source_recipe() -> impl Strategy<Value = Recipe> {
        prop_oneof![
            (relative_path(), identifier())
                .prop_map(|(module, package)| Recipe::GoTest { module: module.join(package) }),
            (relative_path(), identifier(), relative_path(), platform(), "[ -~]{0,40}").prop_map(
                |(module, name, output, platform, ldflags)| {
                    let artifact = Artifact::Executable {
                        name: name.clone(),
                        path: output.join(&name),
                        platform: platform.clone(),
                    };
                    Recipe::GoBuild {
                        module,
                        package: format!("./cmd/{name}"),
                        output: output.join(&name),
                        ldflags,
                        platform,
                        artifacts: vec![artifact],
                    }
                }
            ),
            relative_path().prop_map(|directory| Recipe::PipInstall {
                requirements: directory.join("requirements.txt"),
                directory,
            }),
            relative_path().prop_map(|directory| Recipe::PythonTest { directory }),
            (relative_path(), multiline_text()).prop_map(|(path, contents)| Recipe::WriteFile {
                artifacts: vec![Artifact::BuildFile {
                    name: "Dockerfile".to_string(),
                    path: path.clone(),
                }],
                path,
                contents,
            }),
        ]
    }

    fn publish_recipe() -> impl Strategy<Value = Recipe> {
        prop_oneof![
            (relative_path(), proptest::collection::vec(identifier(), 1..3)).prop_map(
                |(context, names)| {
                    let tags: Vec<String> =
                        names.iter().map(|n| format!("ghcr.io/acme/{n}:1.0.0")).collect();
                    Recipe::DockerBuild {
                        dockerfile: context.join("Dockerfile"),
                        context,
                        labels: vec!["org.opencontainers.image.version=1.0.0".to_string()],
                        artifacts: vec![Artifact::Container {
                            name: names[0].clone(),
                            tags: tags.clone(),
                        }],
                        tags,
                    }
                }
            ),
            proptest::collection::vec(identifier(), 0..3).prop_map(|names| Recipe::DockerPush {
                tags: names.iter().map(|n| format!("ghcr.io/acme/{n}:latest")).collect(),
            }),
            relative_path().prop_map(|chart| Recipe::HelmLint { chart }),
            (relative_path(), identifier(), semver_version(), relative_path()).prop_map(
                |(chart, name, version, output)| Recipe::HelmPackage {
                    artifacts: vec![Artifact::HelmChart {
                        name: name.clone(),
                        version: version.clone(),
                        path: output.join(format!("{name}-{version}.tgz")),
                    }],
                    chart: chart.join(&name),
                    version,
                    output,
                }
            ),
            (relative_path(), identifier()).prop_map(|(archive, repository)| Recipe::ChartPush {
                archive: archive.with_extension("tgz"),
                repository: format!("oci://ghcr.io/{repository}/charts"),
            }),
            (identifier(), semver_version(), multiline_text(), any::<bool>()).prop_map(
                |(repository, version, body, prerelease)| Recipe::GitHubRelease {
                    owner: "acme".to_string(),
                    tag: format!("v{version}"),
                    artifacts: vec![Artifact::Release {
                        name: version.clone(),
                        tag: format!("v{version}"),
                    }],
                    name: version,
                    repository,
                    body,
                    prerelease,
                    assets: vec![PathBuf::from(".galley/go/tool-linux-amd64")],
                }
            ),
        ]
    }

    /// Build context snapshot with every fact settled
    pub fn context_snapshot() -> impl Strategy<Value = ContextSnapshot> {
        let facts = (
            ("[0-9a-f]{40}", proptest::option::of(identifier())).prop_map(|(sha, remote)| {
                GitInfo {
                    sha,
                    origin_url: remote.map(|r| format!("https://github.com/acme/{r}.git")),
                }
            }),
            (identifier(), identifier()).prop_map(|(owner, repository)| HostingInfo {
                url: format!("https://github.com/{owner}/{repository}"),
                api_url: "https://api.github.com".to_string(),
                owner,
                repository,
            }),
            multiline_text().prop_map(|text| Description { text }),
            (semver_version(), multiline_text())
                .prop_map(|(version, notes)| ReleaseNotes { version, notes }),
            (1u64..100_000, "[ -~]{0,40}", proptest::collection::vec(identifier(), 0..3))
                .prop_map(|(number, title, labels)| PullRequestInfo {
                    url: format!("https://github.com/acme/tool/pull/{number}"),
                    number,
                    title,
                    labels,
                }),
            (
                proptest::option::of(semver_version()),
                proptest::collection::vec((1u64..10_000, "[ -~]{0,40}", identifier()), 0..4),
            )
                .prop_map(|(since, entries)| Changelog {
                    since: since.map(|v| format!("v{v}")),
                    entries: entries
                        .into_iter()
                        .map(|(number, title, author)| ChangelogEntry {
                            number,
                            title,
                            author,
                        })
                        .collect(),
                }),
        );

        (
            (0u64..10, 0u64..10, 0u64..50),
            relative_path(),
            any::<bool>(),
            destinations(),
            facts,
        )
            .prop_map(
                |(
                    (major, minor, patch),
                    directory,
                    release,
                    destinations,
                    (git, hosting, description, release_notes, pull_request, changelog),
                )| ContextSnapshot {
                    version: Version::new(major, minor, patch),
                    working_directory: PathBuf::from("/work").join(directory),
                    convention: if release {
                        Convention::Release
                    } else {
                        Convention::Default
                    },
                    destinations,
                    git: Some(git),
                    hosting: Some(hosting),
                    description: Some(description),
                    release_notes: Some(release_notes),
                    pull_request: Some(pull_request),
                    changelog: Some(changelog),
                },
            )
    }

    fn destinations() -> impl Strategy<Value = Vec<Destination>> {
        let destination = prop_oneof![
            identifier().prop_map(|owner| Destination::Container {
                registry: format!("ghcr.io/{owner}"),
            }),
            identifier().prop_map(|feed| Destination::PackageFeed {
                url: format!("https://nuget.example.com/{feed}/index.json"),
            }),
            (identifier(), identifier())
                .prop_map(|(owner, repository)| Destination::Release { owner, repository }),
            identifier().prop_map(|owner| Destination::ChartRepository {
                url: format!("oci://ghcr.io/{owner}/charts"),
            }),
            proptest::sample::select(ArtifactType::ALL.to_vec())
                .prop_map(|artifact| Destination::Dynamic { artifact }),
        ];
        proptest::collection::vec(destination, 0..4)
    }
}
