//! Pull request gatherer

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{require, settle, Gatherer};
use crate::core::context::{BuildContext, PullRequestInfo};
use crate::core::fact::FactSetter;
use crate::error::GatherError;
use crate::infra::hosting::HostingClient;

/// Settles the `pull_request` fact with the pull request for the built commit
///
/// Waits for the `git` and `hosting` facts.
#[derive(Debug)]
pub struct PullRequestGatherer {
    setter: FactSetter<PullRequestInfo>,
    client: Arc<dyn HostingClient>,
}

impl PullRequestGatherer {
    /// Create a gatherer owning the `pull_request` fact
    pub fn new(setter: FactSetter<PullRequestInfo>, client: Arc<dyn HostingClient>) -> Self {
        Self { setter, client }
    }
}

#[async_trait]
impl Gatherer for PullRequestGatherer {
    fn name(&self) -> &'static str {
        "pull-request"
    }

    async fn gather(self: Box<Self>, context: &BuildContext, cancel: &CancellationToken) {
        let Self { setter, client } = *self;

        settle(setter, cancel, async move {
            let git = require(&context.git).await?;
            let hosting = require(&context.hosting).await?;

            let pulls = client
                .pull_requests_for_commit(&hosting.owner, &hosting.repository, &git.sha)
                .await?;

            // Open pull requests first, then merged ones; closed-unmerged are ignored
            let pull = pulls
                .iter()
                .find(|p| p.state == "open")
                .or_else(|| pulls.iter().find(|p| p.merged_at.is_some()))
                .ok_or_else(|| GatherError::NotFound {
                    what: format!("Pull request for commit {}", git.sha),
                })?;

            Ok(PullRequestInfo {
                number: pull.number,
                title: pull.title.clone(),
                url: pull.html_url.clone(),
                labels: pull.labels.iter().map(|l| l.name.clone()).collect(),
            })
        })
        .await;
    }
}
