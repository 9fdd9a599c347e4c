//! Cooks backed by external tools
//!
//! Each tool-backed recipe maps to one or more command lines run from the
//! working directory (or the project directory for Go and Python).

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{wrong_recipe, Cook};
use crate::core::context::BuildContext;
use crate::core::recipe::{Recipe, RecipeKind};
use crate::error::CookError;
use crate::infra::filesystem;
use crate::infra::process::{CommandSpec, ProcessError, ProcessRunner};

/// Whether recipes of `kind` are carried out by an external tool
pub(crate) fn is_tool_kind(kind: RecipeKind) -> bool {
    !matches!(kind, RecipeKind::WriteFile | RecipeKind::GitHubRelease)
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Command lines for a tool-backed recipe, run in order
///
/// Returns `None` for recipes not carried out by a tool.
pub(crate) fn command_for(recipe: &Recipe, root: &Path) -> Option<Vec<CommandSpec>> {
    let commands = match recipe {
        Recipe::DotNetBuild {
            project,
            configuration,
            version,
        } => vec![CommandSpec::new("dotnet", root)
            .arg("build")
            .arg(path_arg(project))
            .arg("--configuration")
            .arg(configuration)
            .arg(format!("-p:Version={version}"))],
        Recipe::DotNetTest {
            project,
            configuration,
        } => vec![CommandSpec::new("dotnet", root)
            .arg("test")
            .arg(path_arg(project))
            .arg("--configuration")
            .arg(configuration)],
        Recipe::DotNetPublish {
            project,
            configuration,
            version,
            output,
            ..
        } => vec![CommandSpec::new("dotnet", root)
            .arg("publish")
            .arg(path_arg(project))
            .arg("--configuration")
            .arg(configuration)
            .arg(format!("-p:Version={version}"))
            .arg("--output")
            .arg(path_arg(output))],
        Recipe::DotNetPack {
            project,
            configuration,
            version,
            output,
            ..
        } => vec![CommandSpec::new("dotnet", root)
            .arg("pack")
            .arg(path_arg(project))
            .arg("--configuration")
            .arg(configuration)
            .arg(format!("-p:Version={version}"))
            .arg("--output")
            .arg(path_arg(output))],
        Recipe::DotNetNuGetPush { package, feed } => vec![CommandSpec::new("dotnet", root)
            .args(["nuget", "push"])
            .arg(path_arg(package))
            .arg("--source")
            .arg(feed)
            .arg("--skip-duplicate")],
        Recipe::GoTest { module } => {
            vec![CommandSpec::new("go", root.join(module)).args(["test", "./..."])]
        }
        Recipe::GoBuild {
            module,
            package,
            output,
            ldflags,
            platform,
            ..
        } => vec![CommandSpec::new("go", root.join(module))
            .args(["build", "-trimpath", "-ldflags"])
            .arg(ldflags)
            .arg("-o")
            .arg(path_arg(&root.join(output)))
            .arg(package)
            .env("GOOS", &platform.os)
            .env("GOARCH", &platform.arch)
            .env("CGO_ENABLED", "0")],
        Recipe::PipInstall {
            directory,
            requirements,
        } => vec![CommandSpec::new("python3", root.join(directory))
            .args(["-m", "pip", "install", "-r"])
            .arg(path_arg(&root.join(requirements)))],
        Recipe::PythonTest { directory } => {
            vec![CommandSpec::new("python3", root.join(directory)).args(["-m", "pytest"])]
        }
        Recipe::DockerBuild {
            dockerfile,
            context,
            tags,
            labels,
            ..
        } => {
            let mut command = CommandSpec::new("docker", root)
                .arg("build")
                .arg("--file")
                .arg(path_arg(dockerfile));
            for tag in tags {
                command = command.arg("--tag").arg(tag);
            }
            for label in labels {
                command = command.arg("--label").arg(label);
            }
            let context = if context.as_os_str().is_empty() {
                ".".to_string()
            } else {
                path_arg(context)
            };
            vec![command.arg(context)]
        }
        Recipe::DockerPush { tags } => tags
            .iter()
            .map(|tag| CommandSpec::new("docker", root).arg("push").arg(tag))
            .collect(),
        Recipe::HelmLint { chart } => {
            vec![CommandSpec::new("helm", root).arg("lint").arg(path_arg(chart))]
        }
        Recipe::HelmPackage {
            chart,
            version,
            output,
            ..
        } => vec![CommandSpec::new("helm", root)
            .arg("package")
            .arg(path_arg(chart))
            .arg("--version")
            .arg(version)
            .arg("--app-version")
            .arg(version)
            .arg("--destination")
            .arg(path_arg(output))],
        Recipe::ChartPush {
            archive,
            repository,
        } => vec![CommandSpec::new("helm", root)
            .arg("push")
            .arg(path_arg(archive))
            .arg(repository)],
        Recipe::WriteFile { .. } | Recipe::GitHubRelease { .. } => return None,
    };
    Some(commands)
}

/// Directory a recipe writes into, created before its tool runs
fn output_directory(recipe: &Recipe) -> Option<PathBuf> {
    match recipe {
        Recipe::DotNetPublish { output, .. }
        | Recipe::DotNetPack { output, .. }
        | Recipe::HelmPackage { output, .. } => Some(output.clone()),
        Recipe::GoBuild { output, .. } => output.parent().map(Path::to_path_buf),
        _ => None,
    }
}

/// Runs recipes of one kind through an external tool
#[derive(Debug, Clone)]
pub struct ToolCook {
    kind: RecipeKind,
    runner: Arc<dyn ProcessRunner>,
}

impl ToolCook {
    /// Create a cook for `kind` running commands with `runner`
    pub fn new(kind: RecipeKind, runner: Arc<dyn ProcessRunner>) -> Self {
        Self { kind, runner }
    }
}

#[async_trait]
impl Cook for ToolCook {
    fn kind(&self) -> RecipeKind {
        self.kind
    }

    async fn cook(
        &self,
        context: &BuildContext,
        recipe: &Recipe,
        cancel: &CancellationToken,
    ) -> Result<bool, CookError> {
        let root = context.working_directory();
        let commands = command_for(recipe, root)
            .filter(|_| recipe.kind() == self.kind)
            .ok_or_else(|| wrong_recipe(self.kind, recipe))?;

        if let Some(directory) = output_directory(recipe) {
            let directory = root.join(directory);
            filesystem::create_dir_all(&directory).map_err(|e| CookError::Io {
                path: directory,
                error: e.to_string(),
            })?;
        }

        for command in &commands {
            let output = match self.runner.run(command, cancel).await {
                Ok(output) => output,
                Err(e @ (ProcessError::NotFound { .. } | ProcessError::Cancelled { .. })) => {
                    tracing::error!("{recipe}: {e}");
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            };

            if !output.success {
                let status = output
                    .status
                    .map_or_else(|| "a signal".to_string(), |code| format!("code {code}"));
                tracing::error!("'{command}' exited with {status}");
                for line in output.stderr.lines().filter(|l| !l.trim().is_empty()) {
                    tracing::error!("  {line}");
                }
                return Ok(false);
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::artifact::Platform;
    use crate::core::context::Convention;
    use crate::infra::process::ProcessOutput;
    use crate::test_utils::RecordingRunner;
    use semver::Version;
    use tempfile::TempDir;

    fn context_in(root: &Path) -> BuildContext {
        BuildContext::new(
            Version::new(1, 0, 0),
            root.to_path_buf(),
            Convention::Default,
            Vec::new(),
        )
        .0
    }

    #[test]
    fn test_every_tool_kind_has_commands() {
        let root = Path::new("/src");
        let samples = [
            Recipe::DotNetTest {
                project: PathBuf::from("App.Tests/App.Tests.csproj"),
                configuration: "Release".to_string(),
            },
            Recipe::GoTest {
                module: PathBuf::from("tool"),
            },
            Recipe::HelmLint {
                chart: PathBuf::from("chart"),
            },
        ];
        for recipe in &samples {
            assert!(is_tool_kind(recipe.kind()));
            assert!(command_for(recipe, root).is_some_and(|c| !c.is_empty()));
        }
        assert!(command_for(
            &Recipe::WriteFile {
                path: PathBuf::from("Dockerfile"),
                contents: String::new(),
                artifacts: Vec::new(),
            },
            root
        )
        .is_none());
    }

    #[test]
    fn test_go_build_command() {
        let recipe = Recipe::GoBuild {
            module: PathBuf::from("tool"),
            package: "./cmd/tool".to_string(),
            output: PathBuf::from(".galley/go/tool-linux-arm64"),
            ldflags: "-s -w -X main.version=1.0.0".to_string(),
            platform: Platform::new("linux", "arm64"),
            artifacts: Vec::new(),
        };
        let commands = command_for(&recipe, Path::new("/src")).unwrap();

        assert_eq!(commands.len(), 1);
        let command = &commands[0];
        assert_eq!(command.working_directory, PathBuf::from("/src/tool"));
        assert_eq!(
            command.to_string(),
            "go build -trimpath -ldflags \"-s -w -X main.version=1.0.0\" -o /src/.galley/go/tool-linux-arm64 ./cmd/tool"
        );
        assert_eq!(command.env.get("GOARCH").map(String::as_str), Some("arm64"));
    }

    #[test]
    fn test_docker_push_runs_once_per_tag() {
        let recipe = Recipe::DockerPush {
            tags: vec!["a:1".to_string(), "b:1".to_string()],
        };
        let lines: Vec<String> = command_for(&recipe, Path::new("/src"))
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(lines, vec!["docker push a:1", "docker push b:1"]);
    }

    #[test]
    fn test_docker_build_at_root_uses_dot_context() {
        let recipe = Recipe::DockerBuild {
            dockerfile: PathBuf::from("Dockerfile"),
            context: PathBuf::new(),
            tags: vec!["app:1.0.0".to_string()],
            labels: Vec::new(),
            artifacts: Vec::new(),
        };
        let commands = command_for(&recipe, Path::new("/src")).unwrap();
        assert_eq!(
            commands[0].to_string(),
            "docker build --file Dockerfile --tag app:1.0.0 ."
        );
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_handled_failure() {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::scripted(vec![
            Ok(ProcessOutput::ok("")),
            Ok(ProcessOutput::failed(1, "denied")),
        ]));
        let cook = ToolCook::new(RecipeKind::DockerPush, runner.clone());
        let recipe = Recipe::DockerPush {
            tags: vec!["a:1".to_string(), "b:1".to_string(), "c:1".to_string()],
        };

        let ok = cook
            .cook(&context_in(temp.path()), &recipe, &CancellationToken::new())
            .await
            .unwrap();

        assert!(!ok);
        assert_eq!(runner.command_lines(), vec!["docker push a:1", "docker push b:1"]);
    }

    #[tokio::test]
    async fn test_missing_tool_is_handled_failure() {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::scripted(vec![Err(ProcessError::NotFound {
            program: "helm".to_string(),
        })]));
        let cook = ToolCook::new(RecipeKind::HelmLint, runner);
        let recipe = Recipe::HelmLint {
            chart: PathBuf::from("chart"),
        };

        let ok = cook
            .cook(&context_in(temp.path()), &recipe, &CancellationToken::new())
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_spawn_failure_breaks_cook() {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(RecordingRunner::scripted(vec![Err(ProcessError::Spawn {
            program: "go".to_string(),
            error: "permission denied".to_string(),
        })]));
        let cook = ToolCook::new(RecipeKind::GoTest, runner);
        let recipe = Recipe::GoTest {
            module: PathBuf::from("tool"),
        };

        let result = cook
            .cook(&context_in(temp.path()), &recipe, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(CookError::Process(_))));
    }

    #[tokio::test]
    async fn test_creates_output_directory() {
        let temp = TempDir::new().unwrap();
        let cook = ToolCook::new(RecipeKind::HelmPackage, Arc::new(RecordingRunner::default()));
        let recipe = Recipe::HelmPackage {
            chart: PathBuf::from("chart"),
            version: "1.0.0".to_string(),
            output: PathBuf::from(".galley/helm"),
            artifacts: Vec::new(),
        };

        let ok = cook
            .cook(&context_in(temp.path()), &recipe, &CancellationToken::new())
            .await
            .unwrap();
        assert!(ok);
        assert!(temp.path().join(".galley/helm").is_dir());
    }

    #[tokio::test]
    async fn test_wrong_recipe_is_rejected() {
        let temp = TempDir::new().unwrap();
        let cook = ToolCook::new(RecipeKind::GoTest, Arc::new(RecordingRunner::default()));
        let recipe = Recipe::HelmLint {
            chart: PathBuf::from("chart"),
        };

        let result = cook
            .cook(&context_in(temp.path()), &recipe, &CancellationToken::new())
            .await;
        assert!(matches!(
            result,
            Err(CookError::WrongRecipe { cook: "go-test", .. })
        ));
    }
}
