//! Plan composition
//!
//! The [`Editor`] runs the gather phase to completion, orders the composers
//! by their artifact declarations, and runs them one after another. Each
//! composer sees every recipe composed before it. The concatenated recipes
//! and a snapshot of the context form the [`Book`].

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::core::book::Book;
use crate::core::composers::Composer;
use crate::core::context::BuildContext;
use crate::core::gatherers::{gather_all, Gatherer};
use crate::core::ordering::{order, Dependent};
use crate::error::ComposeError;

/// Composes a plan from a set of composers
#[derive(Debug, Clone)]
pub struct Editor {
    composers: Vec<Arc<dyn Composer>>,
}

impl Editor {
    /// Create an editor over `composers`
    pub fn new(composers: Vec<Arc<dyn Composer>>) -> Self {
        Self { composers }
    }

    /// Gather facts, then compose every recipe in composer order
    ///
    /// Fails without running any composer if no valid order exists, and
    /// stops at the first composer that fails.
    pub async fn compose_plan(
        &self,
        context: &BuildContext,
        gatherers: Vec<Box<dyn Gatherer>>,
        cancel: &CancellationToken,
    ) -> Result<Book, ComposeError> {
        gather_all(context, gatherers, cancel).await;

        let composers = order(self.composers.clone())?;
        let names: Vec<&str> = composers.iter().map(|c| c.name()).collect();
        tracing::info!("Composer order: {}", names.join(" -> "));

        let mut recipes = Vec::new();
        for composer in &composers {
            if cancel.is_cancelled() {
                return Err(ComposeError::Cancelled);
            }

            let composed = composer
                .compose(context, &recipes)
                .await
                .map_err(|e| ComposeError::Composer {
                    composer: composer.name().to_string(),
                    source: Box::new(e),
                })?;
            tracing::debug!(
                "Composer '{}' produced {} recipe(s)",
                composer.name(),
                composed.len()
            );
            recipes.extend(composed);
        }

        Ok(Book::new(context.snapshot().await, recipes))
    }
}
