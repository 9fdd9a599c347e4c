//! Version control gatherer

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{settle, Gatherer};
use crate::core::context::{BuildContext, GitInfo};
use crate::core::fact::FactSetter;
use crate::error::GatherError;
use crate::infra::git::OriginProvider;

/// Settles the `git` fact from the origin provider
#[derive(Debug)]
pub struct GitGatherer {
    setter: FactSetter<GitInfo>,
    origin: Arc<dyn OriginProvider>,
}

impl GitGatherer {
    /// Create a gatherer owning the `git` fact
    pub fn new(setter: FactSetter<GitInfo>, origin: Arc<dyn OriginProvider>) -> Self {
        Self { setter, origin }
    }
}

#[async_trait]
impl Gatherer for GitGatherer {
    fn name(&self) -> &'static str {
        "git"
    }

    async fn gather(self: Box<Self>, context: &BuildContext, cancel: &CancellationToken) {
        let Self { setter, origin } = *self;
        let directory = context.working_directory().to_path_buf();

        settle(setter, cancel, async move {
            // gix is blocking
            let info = tokio::task::spawn_blocking(move || origin.origin(&directory))
                .await
                .map_err(|e| GatherError::Git {
                    error: e.to_string(),
                })?
                .map_err(|e| GatherError::Git {
                    error: e.to_string(),
                })?;

            info.ok_or_else(|| GatherError::NotFound {
                what: "Git repository".to_string(),
            })
        })
        .await;
    }
}
