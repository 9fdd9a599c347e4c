//! Platform-specific directory lookup
//!
//! Resolves where the global configuration lives. Follows the XDG Base
//! Directory Specification on Linux and standard locations on macOS.
//!
//! `GALLEY_CONFIG_DIR` overrides the default config directory.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config directory
pub const ENV_CONFIG_DIR: &str = "GALLEY_CONFIG_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "galley";

/// Global config file name
const CONFIG_FILE: &str = "config.toml";

/// Directory provider for galley
#[derive(Debug, Clone)]
pub struct GalleyDirs {
    config_dir: PathBuf,
}

impl GalleyDirs {
    /// Resolve directories from the environment or platform defaults
    #[must_use]
    pub fn new() -> Self {
        let config_dir = env::var_os(ENV_CONFIG_DIR)
            .filter(|value| !value.is_empty())
            .map_or_else(Self::platform_config_dir, PathBuf::from);
        Self { config_dir }
    }

    /// Use an explicit config directory
    #[must_use]
    pub fn with_config_dir(config_dir: impl AsRef<Path>) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
        }
    }

    /// Config directory
    ///
    /// - Linux: `$XDG_CONFIG_HOME/galley` or `~/.config/galley`
    /// - macOS: `~/Library/Application Support/galley`
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Path of the global `config.toml`
    #[must_use]
    pub fn global_config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    fn platform_config_dir() -> PathBuf {
        dirs::config_dir().map_or_else(
            || {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".config")
                    .join(APP_NAME)
            },
            |p| p.join(APP_NAME),
        )
    }
}

impl Default for GalleyDirs {
    fn default() -> Self {
        Self::new()
    }
}
