//! Hosting platform gatherer

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{require, settle, Gatherer};
use crate::config::urls;
use crate::core::context::{BuildContext, HostingInfo};
use crate::core::fact::FactSetter;
use crate::error::GatherError;
use crate::infra::hosting::parse_github_remote;

/// Settles the `hosting` fact from the origin remote URL
///
/// Waits for the `git` fact.
#[derive(Debug)]
pub struct HostingGatherer {
    setter: FactSetter<HostingInfo>,
    api_url: String,
}

impl HostingGatherer {
    /// Create a gatherer owning the `hosting` fact
    pub fn new(setter: FactSetter<HostingInfo>, api_url: &str) -> Self {
        Self {
            setter,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Gatherer for HostingGatherer {
    fn name(&self) -> &'static str {
        "hosting"
    }

    async fn gather(self: Box<Self>, context: &BuildContext, cancel: &CancellationToken) {
        let Self { setter, api_url } = *self;

        settle(setter, cancel, async move {
            let git = require(&context.git).await?;
            let remote = git.origin_url.ok_or_else(|| GatherError::NotFound {
                what: "Origin remote".to_string(),
            })?;
            let (owner, repository) =
                parse_github_remote(&remote).ok_or_else(|| GatherError::NotFound {
                    what: format!("GitHub repository in remote '{remote}'"),
                })?;

            Ok(HostingInfo {
                url: format!("{}/{owner}/{repository}", urls::GITHUB),
                owner,
                repository,
                api_url,
            })
        })
        .await;
    }
}
