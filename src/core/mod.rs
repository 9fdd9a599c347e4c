//! Core orchestration logic
//!
//! Side effects live behind the traits in [`crate::infra`]; everything here
//! works against those traits.
//!
//! # Submodules
//!
//! - [`fact`] - Single-writer, many-reader future values
//! - [`context`] - Build context and fact value types
//! - [`artifact`] - Artifact types and values
//! - [`destination`] - Publish destinations
//! - [`recipe`] - Plan steps
//! - [`ordering`] - Composer ordering
//! - [`gatherers`] - Concurrent fact collection
//! - [`composers`] - Per-ecosystem plan generation
//! - [`editor`] - Plan composition
//! - [`book`] - Plan persistence
//! - [`cooks`] - Step execution
//! - [`kitchen`] - Plan execution
//! - [`settings`] - Configuration files

pub mod artifact;
pub mod book;
pub mod composers;
pub mod context;
pub mod cooks;
pub mod destination;
pub mod editor;
pub mod fact;
pub mod gatherers;
pub mod kitchen;
pub mod ordering;
pub mod recipe;
pub mod settings;
