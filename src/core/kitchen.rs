//! Plan execution
//!
//! The [`Kitchen`] runs a book's recipes strictly in order. Each recipe is
//! handed to the one cook registered for its kind. The first recipe that
//! reports failure stops the run; a cook that returns an error aborts it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::core::book::Book;
use crate::core::context::BuildContext;
use crate::core::cooks::{standard_cooks, Cook};
use crate::core::recipe::{Recipe, RecipeKind};
use crate::error::KitchenError;
use crate::infra::hosting::HostingClient;
use crate::infra::process::ProcessRunner;

/// Called before each recipe with its 1-based position and the total
pub type ProgressCallback = Arc<dyn Fn(usize, usize, &Recipe) + Send + Sync>;

/// Executes books with a fixed set of cooks
#[derive(Clone)]
pub struct Kitchen {
    cooks: HashMap<RecipeKind, Arc<dyn Cook>>,
    progress: Option<ProgressCallback>,
}

impl fmt::Debug for Kitchen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&RecipeKind> = self.cooks.keys().collect();
        kinds.sort();
        f.debug_struct("Kitchen").field("cooks", &kinds).finish_non_exhaustive()
    }
}

impl Kitchen {
    /// Create a kitchen, rejecting two cooks for the same recipe kind
    pub fn new(cooks: Vec<Arc<dyn Cook>>) -> Result<Self, KitchenError> {
        let mut by_kind = HashMap::with_capacity(cooks.len());
        for cook in cooks {
            let kind = cook.kind();
            if by_kind.insert(kind, cook).is_some() {
                return Err(KitchenError::DuplicateCook {
                    kind: kind.to_string(),
                });
            }
        }
        Ok(Self {
            cooks: by_kind,
            progress: None,
        })
    }

    /// Kitchen with the built-in cooks
    pub fn standard(
        runner: Arc<dyn ProcessRunner>,
        client: Arc<dyn HostingClient>,
    ) -> Result<Self, KitchenError> {
        Self::new(standard_cooks(runner, client))
    }

    /// Report progress to `callback` before each recipe
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Check that every recipe in `book` has a cook
    pub fn validate(&self, book: &Book) -> Result<(), KitchenError> {
        book.recipes
            .iter()
            .try_for_each(|recipe| self.cook_for(recipe).map(|_| ()))
    }

    fn cook_for(&self, recipe: &Recipe) -> Result<&Arc<dyn Cook>, KitchenError> {
        self.cooks
            .get(&recipe.kind())
            .ok_or_else(|| KitchenError::NoCook {
                kind: recipe.kind().to_string(),
            })
    }

    /// Run every recipe in order, stopping at the first failure
    ///
    /// Returns `Ok(false)` when a recipe failed. A missing cook is reported
    /// before anything runs.
    pub async fn execute_plan(
        &self,
        context: &BuildContext,
        book: &Book,
        cancel: &CancellationToken,
    ) -> Result<bool, KitchenError> {
        self.validate(book)?;

        let total = book.recipes.len();
        for (index, recipe) in book.recipes.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(KitchenError::Cancelled {
                    remaining: total - index,
                });
            }

            let step = index + 1;
            tracing::info!("[{step}/{total}] {recipe}");
            if let Some(progress) = &self.progress {
                progress(step, total, recipe);
            }

            let cook = self.cook_for(recipe)?;
            let succeeded = cook
                .cook(context, recipe, cancel)
                .await
                .map_err(|source| KitchenError::Cook {
                    recipe: recipe.to_string(),
                    source,
                })?;

            if !succeeded {
                tracing::error!("[{step}/{total}] {recipe} failed");
                return Ok(false);
            }
        }

        Ok(true)
    }
}
