//! Changelog gatherer

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::{require, settle, Gatherer};
use crate::core::context::{BuildContext, Changelog, ChangelogEntry};
use crate::core::fact::FactSetter;
use crate::infra::hosting::{HostingClient, PullRequest};

/// Settles the `changelog` fact with pull requests merged since the latest
/// release
///
/// Waits for the `git` and `hosting` facts.
#[derive(Debug)]
pub struct ChangelogGatherer {
    setter: FactSetter<Changelog>,
    client: Arc<dyn HostingClient>,
}

impl ChangelogGatherer {
    /// Create a gatherer owning the `changelog` fact
    pub fn new(setter: FactSetter<Changelog>, client: Arc<dyn HostingClient>) -> Self {
        Self { setter, client }
    }
}

#[async_trait]
impl Gatherer for ChangelogGatherer {
    fn name(&self) -> &'static str {
        "changelog"
    }

    async fn gather(self: Box<Self>, context: &BuildContext, cancel: &CancellationToken) {
        let Self { setter, client } = *self;

        settle(setter, cancel, async move {
            require(&context.git).await?;
            let hosting = require(&context.hosting).await?;

            let latest = client
                .latest_release(&hosting.owner, &hosting.repository)
                .await?;
            let pulls = client
                .closed_pull_requests(&hosting.owner, &hosting.repository)
                .await?;

            let cutoff = latest.as_ref().and_then(|r| r.published_at.as_deref());
            Ok(Changelog {
                since: latest.as_ref().map(|r| r.tag_name.clone()),
                entries: merged_since(pulls, cutoff),
            })
        })
        .await;
    }
}

/// Entries for pull requests merged after `cutoff`, newest first
///
/// Timestamps are RFC 3339 in UTC as returned by the API, so they compare
/// lexicographically.
fn merged_since(pulls: Vec<PullRequest>, cutoff: Option<&str>) -> Vec<ChangelogEntry> {
    let mut merged: Vec<(String, ChangelogEntry)> = pulls
        .into_iter()
        .filter_map(|pull| {
            let merged_at = pull.merged_at?;
            if cutoff.is_some_and(|cutoff| merged_at.as_str() <= cutoff) {
                return None;
            }
            let entry = ChangelogEntry {
                number: pull.number,
                title: pull.title,
                author: pull.user.map(|u| u.login).unwrap_or_default(),
            };
            Some((merged_at, entry))
        })
        .collect();

    merged.sort_by(|(a, _), (b, _)| b.cmp(a));
    merged.into_iter().map(|(_, entry)| entry).collect()
}
