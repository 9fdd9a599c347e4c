//! Galley - convention-based build orchestrator
//!
//! Galley inspects a source tree, gathers facts about the build (version
//! control, hosting platform, release notes), composes a plan of build steps
//! for every ecosystem it recognizes, and executes that plan.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Facts, composition and execution
//! - [`infra`] - Infrastructure layer (git, hosting API, processes, filesystem)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
