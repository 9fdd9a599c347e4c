//! External process execution
//!
//! Cooks run build tools (dotnet, go, docker, helm, ...) through the
//! [`ProcessRunner`] interface. The tokio implementation resolves programs on
//! `PATH`, captures output and kills the child when cancellation is requested.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Process execution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// Program is not installed or not on `PATH`
    #[error("Program '{program}' not found on PATH")]
    NotFound { program: String },

    /// Program could not be started or awaited
    #[error("Failed to run '{program}': {error}")]
    Spawn { program: String, error: String },

    /// Cancellation was requested while the program ran
    #[error("'{program}' was cancelled")]
    Cancelled { program: String },
}

/// A command line to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or path
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Working directory
    pub working_directory: PathBuf,
    /// Extra environment variables
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    /// Create a command running `program` in `working_directory`
    pub fn new(program: impl Into<String>, working_directory: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_directory: working_directory.as_ref().to_path_buf(),
            env: BTreeMap::new(),
        }
    }

    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, absent when terminated by a signal
    pub status: Option<i32>,
    /// Whether the process exited successfully
    pub success: bool,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ProcessOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs external processes
#[async_trait]
pub trait ProcessRunner: Send + Sync + Debug {
    /// Run a command to completion and capture its output
    ///
    /// A non-zero exit is reported through [`ProcessOutput::success`], not as
    /// an error.
    async fn run(
        &self,
        command: &CommandSpec,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, ProcessError>;
}

/// Process runner backed by `tokio::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    /// Create a new runner
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        command: &CommandSpec,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput, ProcessError> {
        let program = which::which(&command.program).map_err(|_| ProcessError::NotFound {
            program: command.program.clone(),
        })?;

        tracing::debug!("Running: {command}");

        let child = tokio::process::Command::new(&program)
            .args(&command.args)
            .current_dir(&command.working_directory)
            .envs(&command.env)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                return Err(ProcessError::Cancelled {
                    program: command.program.clone(),
                });
            }
            output = child => output.map_err(|e| ProcessError::Spawn {
                program: command.program.clone(),
                error: e.to_string(),
            })?,
        };

        Ok(ProcessOutput {
            status: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
