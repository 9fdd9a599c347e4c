//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary source tree and an isolated config directory, and
/// runs the galley binary against them.
pub struct TestProject {
    /// Temporary directory for the source tree
    pub dir: TempDir,
    /// Temporary directory standing in for the global config directory
    pub config_dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
            config_dir: TempDir::new().expect("Failed to create config directory"),
        }
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Run galley in the project directory
    pub fn galley(&self, args: &[&str]) -> Output {
        galley_in(self.dir.path(), self.config_dir.path(), args)
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Run galley in `directory` with an isolated config directory
pub fn galley_in(directory: &Path, config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_galley"))
        .current_dir(directory)
        .env("GALLEY_CONFIG_DIR", config_dir)
        .env_remove("GITHUB_TOKEN")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute galley")
}

/// Stdout of a finished command
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stderr of a finished command
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// A Go module with one command at its root
pub const GO_MODULE: &str = "module example.com/tool\n\ngo 1.22\n";

/// Entry point of the Go command
pub const GO_MAIN: &str = "package main\n\nfunc main() {}\n";
