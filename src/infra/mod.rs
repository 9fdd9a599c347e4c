//! Infrastructure layer
//!
//! Handles all I/O operations: hosting API, filesystem, git and external
//! processes. This module is the only place where side effects occur.

pub mod dirs;
pub mod filesystem;
pub mod git;
pub mod hosting;
pub mod process;
