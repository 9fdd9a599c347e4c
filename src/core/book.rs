//! Plan persistence
//!
//! A [`Book`] is the ordered list of recipes produced by the editor together
//! with a snapshot of the build context. It is written as TOML with a
//! `[metadata]` table and a `[[recipes]]` array, so a plan composed on one
//! machine can be reviewed and applied later.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::context::ContextSnapshot;
use crate::core::recipe::Recipe;
use crate::error::BookError;

/// Plan file format version
pub const BOOK_FORMAT_VERSION: u32 = 1;

/// A composed plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Plan file format version
    pub format: u32,

    /// Build context the plan was composed from
    pub metadata: ContextSnapshot,

    /// Recipes in execution order
    #[serde(default)]
    pub recipes: Vec<Recipe>,
}

impl Book {
    /// Create a book in the current format
    pub fn new(metadata: ContextSnapshot, recipes: Vec<Recipe>) -> Self {
        Self {
            format: BOOK_FORMAT_VERSION,
            metadata,
            recipes,
        }
    }

    /// Parse from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, BookError> {
        let book: Self = toml::from_str(content).map_err(|e| BookError::Parse(e.to_string()))?;
        if book.format != BOOK_FORMAT_VERSION {
            return Err(BookError::UnsupportedFormat {
                found: book.format,
                expected: BOOK_FORMAT_VERSION,
            });
        }
        Ok(book)
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String, BookError> {
        toml::to_string_pretty(self).map_err(|e| BookError::Serialize(e.to_string()))
    }

    /// Load a book from a file
    pub fn load(path: &Path) -> Result<Self, BookError> {
        let content = std::fs::read_to_string(path).map_err(|e| BookError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Write the book to a file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), BookError> {
        let content = self.to_toml()?;
        crate::infra::filesystem::write_file(path, &content).map_err(|e| BookError::Write {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }
}
