//! CLI command implementations
//!
//! Each command is implemented in its own submodule. The shared steps
//! (loading settings, composing a plan, cooking it) live here.

pub mod apply;
pub mod plan;
pub mod run;

use anyhow::{Context, Result};
use clap::Subcommand;
use semver::Version;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::output::{create_spinner, create_step_bar};
use super::GlobalArgs;
use crate::config::defaults;
use crate::core::book::Book;
use crate::core::composers::standard_composers;
use crate::core::context::BuildContext;
use crate::core::editor::Editor;
use crate::core::gatherers::standard_gatherers;
use crate::core::kitchen::Kitchen;
use crate::core::settings::Settings;
use crate::infra::dirs::GalleyDirs;
use crate::infra::git::GitRepository;
use crate::infra::hosting::{GitHubClient, HostingClient};
use crate::infra::process::TokioProcessRunner;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Gather facts and compose a plan, then write it to a file
    Plan {
        /// Plan file to write
        #[arg(long)]
        plan: Option<PathBuf>,
    },

    /// Execute a previously written plan
    Apply {
        /// Plan file to read
        #[arg(long)]
        plan: Option<PathBuf>,
    },

    /// Compose and execute a plan without writing it
    Run,
}

impl Commands {
    /// Execute the command
    pub async fn run(self, global: &GlobalArgs, cancel: &CancellationToken) -> Result<()> {
        let workspace = Workspace::load(global)?;
        match self {
            Self::Plan { plan: path } => plan::execute(&workspace, path, cancel).await,
            Self::Apply { plan: path } => apply::execute(&workspace, path, cancel).await,
            Self::Run => run::execute(&workspace, cancel).await,
        }
    }
}

/// Working directory, settings and command-line options for one invocation
#[derive(Debug)]
pub struct Workspace {
    /// Root of the source tree
    pub directory: PathBuf,
    /// Merged settings
    pub settings: Settings,
    /// Command-line options
    pub global: GlobalArgs,
}

impl Workspace {
    /// Resolve the working directory and load its settings
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let requested = match &global.directory {
            Some(directory) => directory.clone(),
            None => std::env::current_dir().context("Failed to read current directory")?,
        };
        let directory = std::fs::canonicalize(&requested)
            .with_context(|| format!("Directory '{}' does not exist", requested.display()))?;
        let settings = Settings::load(&GalleyDirs::new(), &directory)
            .context("Failed to load settings")?;

        Ok(Self {
            directory,
            settings,
            global: global.clone(),
        })
    }

    /// Plan file from the command line or settings
    pub fn plan_path(&self, requested: Option<PathBuf>) -> PathBuf {
        match requested {
            Some(path) if path.is_absolute() => path,
            Some(path) => self.directory.join(path),
            None => self.settings.plan_path(&self.directory),
        }
    }

    /// Hosting client with the configured endpoint and token
    pub fn hosting_client(&self) -> Arc<dyn HostingClient> {
        let token = self
            .global
            .github_token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .or_else(|| self.settings.token_from_env());
        Arc::new(GitHubClient::with_api_url(
            self.settings.api_url().to_string(),
            token,
        ))
    }

    /// Fresh build context for this invocation
    pub fn context(&self) -> Result<(BuildContext, crate::core::context::FactSetters)> {
        let version = match &self.global.build_version {
            Some(version) => version.clone(),
            None => Version::parse(defaults::DEFAULT_BUILD_VERSION)
                .context("Invalid default build version")?,
        };
        let destinations = if self.global.destinations.is_empty() {
            self.settings
                .default_destinations()
                .context("Invalid destination in settings")?
        } else {
            self.global.destinations.clone()
        };

        Ok(BuildContext::new(
            version,
            self.directory.clone(),
            self.global.convention,
            destinations,
        ))
    }
}

/// Gather facts and compose a plan
pub(crate) async fn compose(
    workspace: &Workspace,
    client: Arc<dyn HostingClient>,
    cancel: &CancellationToken,
) -> Result<(BuildContext, Book)> {
    let (context, setters) = workspace.context()?;
    tracing::info!(
        "Composing {} build of {} in '{}'",
        context.convention(),
        context.version(),
        context.working_directory().display()
    );

    let gatherers = standard_gatherers(
        setters,
        Arc::new(GitRepository::new()),
        client,
        workspace.settings.api_url(),
    );
    let editor = Editor::new(standard_composers(&workspace.settings));

    let spinner = create_spinner("Composing plan...", workspace.global.quiet);
    let result = editor.compose_plan(&context, gatherers, cancel).await;
    spinner.finish_and_clear();

    let book = result.context("Failed to compose plan")?;
    Ok((context, book))
}

/// Execute a plan, failing when any step fails
pub(crate) async fn cook(
    workspace: &Workspace,
    context: &BuildContext,
    book: &Book,
    client: Arc<dyn HostingClient>,
    cancel: &CancellationToken,
) -> Result<()> {
    let bar = create_step_bar(book.recipes.len() as u64, workspace.global.quiet);
    let progress = bar.clone();
    let kitchen = Kitchen::standard(Arc::new(TokioProcessRunner::new()), client)?
        .with_progress(Arc::new(move |step, _total, recipe| {
            progress.set_position(step.saturating_sub(1) as u64);
            progress.set_message(recipe.to_string());
        }));

    let result = kitchen.execute_plan(context, book, cancel).await;
    bar.finish_and_clear();

    if !result.context("Plan execution aborted")? {
        anyhow::bail!("Build failed");
    }
    Ok(())
}
