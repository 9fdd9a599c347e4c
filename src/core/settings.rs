//! Configuration files
//!
//! Settings come from an optional global `config.toml` in the config
//! directory and an optional `galley.toml` in the working directory. Values
//! from the project file win over global ones; missing files yield defaults
//! and malformed files are errors.
//!
//! ```toml
//! [hosting]
//! api_url = "https://api.github.com"
//! token_env = "GITHUB_TOKEN"
//!
//! [build]
//! configuration = "Release"
//! go_ldflags = "-s -w"
//!
//! [destinations]
//! defaults = ["container>dynamic"]
//!
//! [plan]
//! path = "galley.plan.toml"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{defaults, urls};
use crate::core::destination::Destination;
use crate::error::DestinationError;
use crate::infra::dirs::GalleyDirs;

/// Default linker flags for Go builds
const DEFAULT_GO_LDFLAGS: &str = "-s -w";

/// Settings file errors
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Failed to read a settings file
    #[error("Failed to read config file '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Failed to parse a settings file
    #[error("Failed to parse config file '{path}': {error}")]
    Parse { path: PathBuf, error: String },
}

/// Hosting platform settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostingSettings {
    /// API base URL
    pub api_url: Option<String>,
    /// Environment variable holding the API token
    pub token_env: Option<String>,
}

/// Build settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSettings {
    /// .NET build configuration
    pub configuration: Option<String>,
    /// Linker flags passed to `go build`
    pub go_ldflags: Option<String>,
}

/// Destination settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DestinationSettings {
    /// Destinations used when none are given on the command line
    pub defaults: Option<Vec<String>>,
}

/// Plan file settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanSettings {
    /// Plan file path, relative to the working directory
    pub path: Option<PathBuf>,
}

/// Merged settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Hosting platform settings
    #[serde(default)]
    pub hosting: HostingSettings,
    /// Build settings
    #[serde(default)]
    pub build: BuildSettings,
    /// Destination settings
    #[serde(default)]
    pub destinations: DestinationSettings,
    /// Plan file settings
    #[serde(default)]
    pub plan: PlanSettings,
}

impl Settings {
    /// Load global then project settings and merge them
    pub fn load(dirs: &GalleyDirs, working_directory: &Path) -> Result<Self, SettingsError> {
        let global = Self::load_from_path(&dirs.global_config_path())?;
        let project =
            Self::load_from_path(&working_directory.join(defaults::PROJECT_CONFIG_FILE))?;
        Ok(global.merge(project))
    }

    /// Load settings from one file, defaulting when it does not exist
    pub fn load_from_path(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        tracing::debug!("Loaded settings from '{}'", path.display());
        toml::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Overlay `other` on top of `self`; values set in `other` win
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            hosting: HostingSettings {
                api_url: other.hosting.api_url.or(self.hosting.api_url),
                token_env: other.hosting.token_env.or(self.hosting.token_env),
            },
            build: BuildSettings {
                configuration: other.build.configuration.or(self.build.configuration),
                go_ldflags: other.build.go_ldflags.or(self.build.go_ldflags),
            },
            destinations: DestinationSettings {
                defaults: other.destinations.defaults.or(self.destinations.defaults),
            },
            plan: PlanSettings {
                path: other.plan.path.or(self.plan.path),
            },
        }
    }

    /// Hosting API base URL
    pub fn api_url(&self) -> &str {
        self.hosting.api_url.as_deref().unwrap_or(urls::GITHUB_API)
    }

    /// Name of the environment variable holding the API token
    pub fn token_env(&self) -> &str {
        self.hosting
            .token_env
            .as_deref()
            .unwrap_or(defaults::DEFAULT_TOKEN_ENV)
    }

    /// API token from the configured environment variable
    pub fn token_from_env(&self) -> Option<String> {
        std::env::var(self.token_env())
            .ok()
            .filter(|token| !token.trim().is_empty())
    }

    /// .NET build configuration
    pub fn configuration(&self) -> &str {
        self.build
            .configuration
            .as_deref()
            .unwrap_or(defaults::DEFAULT_CONFIGURATION)
    }

    /// Go linker flags
    pub fn go_ldflags(&self) -> &str {
        self.build.go_ldflags.as_deref().unwrap_or(DEFAULT_GO_LDFLAGS)
    }

    /// Plan file path, resolved against the working directory
    pub fn plan_path(&self, working_directory: &Path) -> PathBuf {
        let path = self
            .plan
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(defaults::DEFAULT_PLAN_FILE));
        if path.is_absolute() {
            path
        } else {
            working_directory.join(path)
        }
    }

    /// Parsed default destinations
    pub fn default_destinations(&self) -> Result<Vec<Destination>, DestinationError> {
        self.destinations
            .defaults
            .iter()
            .flatten()
            .map(|raw| raw.parse())
            .collect()
    }
}
