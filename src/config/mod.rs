//! Configuration constants
//!
//! - [`defaults`] - Default values and file names
//! - [`urls`] - Hosting platform endpoints

pub mod defaults;
pub mod urls;
