//! Error types for galley
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::artifact::ArtifactType;
use crate::infra::hosting::HostingError;
use crate::infra::process::ProcessError;

/// Errors raised inside a gatherer
///
/// These never leave the gatherer that produced them: the gatherer logs the
/// error and settles the facts it owns as failed.
#[derive(Error, Debug)]
pub enum GatherError {
    /// An awaited upstream fact failed
    #[error("Upstream fact '{fact}' is unavailable")]
    MissingFact { fact: &'static str },

    /// Cancellation was requested while gathering
    #[error("Gathering was cancelled")]
    Cancelled,

    /// Version control lookup failed
    #[error("Git error: {error}")]
    Git { error: String },

    /// Hosting platform lookup failed
    #[error("Hosting error: {0}")]
    Hosting(#[from] HostingError),

    /// Nothing to gather
    #[error("{what} not found")]
    NotFound { what: String },

    /// IO error
    #[error("IO error for '{path}': {error}")]
    Io { path: PathBuf, error: String },
}

/// A composer whose consumed artifact types can never be satisfied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmetDependency {
    /// Composer name
    pub composer: String,
    /// Consumed types not yet produced by any ordered composer
    pub missing: Vec<ArtifactType>,
}

impl std::fmt::Display for UnmetDependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let missing: Vec<String> = self.missing.iter().map(ToString::to_string).collect();
        if missing.is_empty() {
            write!(f, "{} (waiting on a pending producer)", self.composer)
        } else {
            write!(f, "{} needs [{}]", self.composer, missing.join(", "))
        }
    }
}

fn format_unmet(unmet: &[UnmetDependency]) -> String {
    unmet
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Plan composition errors
#[derive(Error, Debug)]
pub enum ComposeError {
    /// No valid composer order exists
    #[error("Unsatisfiable composer dependencies: {}", format_unmet(unmet))]
    Unsatisfiable { unmet: Vec<UnmetDependency> },

    /// A composer failed while producing recipes
    #[error("Composer '{composer}' failed: {source}")]
    Composer {
        composer: String,
        #[source]
        source: Box<ComposeError>,
    },

    /// IO error while scanning the source tree
    #[error("IO error for '{path}': {error}")]
    Io { path: PathBuf, error: String },

    /// A project file could not be understood
    #[error("Failed to parse '{path}': {error}")]
    Parse { path: PathBuf, error: String },

    /// Composition was cancelled
    #[error("Composition was cancelled")]
    Cancelled,
}

/// Errors raised by a cook
///
/// Returning one of these marks the cook as broken. A handled step failure
/// is reported as `Ok(false)` instead.
#[derive(Error, Debug)]
pub enum CookError {
    /// The cook was handed a recipe it does not handle
    #[error("Cook '{cook}' cannot handle recipe '{recipe}'")]
    WrongRecipe { cook: &'static str, recipe: String },

    /// Spawning or awaiting an external process failed
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    /// IO error
    #[error("IO error for '{path}': {error}")]
    Io { path: PathBuf, error: String },
}

/// Plan execution errors
#[derive(Error, Debug)]
pub enum KitchenError {
    /// No cook is registered for a recipe kind
    #[error("No cook registered for recipe kind '{kind}'")]
    NoCook { kind: String },

    /// More than one cook is registered for a recipe kind
    #[error("More than one cook registered for recipe kind '{kind}'")]
    DuplicateCook { kind: String },

    /// A cook raised instead of reporting failure
    #[error("Cook for '{recipe}' broke: {source}")]
    Cook {
        recipe: String,
        #[source]
        source: CookError,
    },

    /// Execution stopped because cancellation was requested
    #[error("Execution cancelled with {remaining} recipe(s) not started")]
    Cancelled { remaining: usize },
}

/// Plan persistence errors
#[derive(Error, Debug)]
pub enum BookError {
    /// Failed to read the plan file
    #[error("Failed to read plan '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Failed to write the plan file
    #[error("Failed to write plan '{path}': {error}")]
    Write { path: PathBuf, error: String },

    /// Plan content is malformed
    #[error("Failed to parse plan: {0}")]
    Parse(String),

    /// Plan could not be serialized
    #[error("Failed to serialize plan: {0}")]
    Serialize(String),

    /// Plan was written by an incompatible format version
    #[error("Unsupported plan format version {found} (expected {expected})")]
    UnsupportedFormat { found: u32, expected: u32 },
}

/// Destination parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DestinationError {
    /// Destination is not of the form `<artifact>><target>`
    #[error("Invalid destination '{input}': expected '<artifact>><target>'")]
    Malformed { input: String },

    /// Artifact type cannot be published
    #[error("Invalid destination '{input}': artifact '{artifact}' cannot be published")]
    UnsupportedArtifact { input: String, artifact: String },

    /// Target is not understood for the artifact type
    #[error("Invalid destination '{input}': {reason}")]
    InvalidTarget { input: String, reason: String },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// Failed to walk a directory tree
    #[error("Failed to scan '{path}': {error}")]
    Scan { path: PathBuf, error: String },
}

impl From<FilesystemError> for ComposeError {
    fn from(err: FilesystemError) -> Self {
        match err {
            FilesystemError::CreateDir { path, error }
            | FilesystemError::WriteFile { path, error }
            | FilesystemError::ReadFile { path, error }
            | FilesystemError::Scan { path, error } => ComposeError::Io { path, error },
        }
    }
}
