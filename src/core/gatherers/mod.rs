//! Gatherers
//!
//! A gatherer settles one or more facts on the [`BuildContext`]. All
//! gatherers run concurrently and are joined at a single barrier. A gatherer
//! never reports an error: if it cannot determine its fact it settles the
//! fact as failed, and a gatherer waiting on a failed upstream fact fails its
//! own fact in turn. The gather phase therefore always completes.

mod changelog;
mod description;
mod destinations;
mod git;
mod hosting;
mod pull_request;
mod release_notes;

pub use changelog::ChangelogGatherer;
pub use description::DescriptionGatherer;
pub use destinations::DestinationGatherer;
pub use git::GitGatherer;
pub use hosting::HostingGatherer;
pub use pull_request::PullRequestGatherer;
pub use release_notes::ReleaseNotesGatherer;

use async_trait::async_trait;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::core::context::{BuildContext, FactSetters};
use crate::core::fact::{Fact, FactSetter};
use crate::error::GatherError;
use crate::infra::git::OriginProvider;
use crate::infra::hosting::HostingClient;

/// Populates facts on the build context
#[async_trait]
pub trait Gatherer: Send {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Settle every fact this gatherer owns
    ///
    /// Consumes the gatherer, and with it the fact setters it owns.
    async fn gather(self: Box<Self>, context: &BuildContext, cancel: &CancellationToken);
}

/// Run every gatherer concurrently and wait for all of them
///
/// A panicking gatherer is contained here so the barrier is always reached.
pub async fn gather_all(
    context: &BuildContext,
    gatherers: Vec<Box<dyn Gatherer>>,
    cancel: &CancellationToken,
) {
    let runs = gatherers.into_iter().map(|gatherer| {
        let name = gatherer.name();
        async move {
            tracing::debug!("Gatherer '{name}' started");
            let outcome = AssertUnwindSafe(gatherer.gather(context, cancel))
                .catch_unwind()
                .await;
            if outcome.is_err() {
                tracing::warn!("Gatherer '{name}' panicked, its facts are unavailable");
            }
            tracing::debug!("Gatherer '{name}' finished");
        }
    });

    futures::future::join_all(runs).await;
}

/// The gatherers for every fact on the build context
pub fn standard_gatherers(
    setters: FactSetters,
    origin: Arc<dyn OriginProvider>,
    client: Arc<dyn HostingClient>,
    api_url: &str,
) -> Vec<Box<dyn Gatherer>> {
    let FactSetters {
        git,
        hosting,
        description,
        release_notes,
        pull_request,
        changelog,
    } = setters;

    vec![
        Box::new(GitGatherer::new(git, origin)),
        Box::new(HostingGatherer::new(hosting, api_url)),
        Box::new(DescriptionGatherer::new(description)),
        Box::new(ReleaseNotesGatherer::new(release_notes)),
        Box::new(PullRequestGatherer::new(pull_request, Arc::clone(&client))),
        Box::new(ChangelogGatherer::new(changelog, client)),
        Box::new(DestinationGatherer::new()),
    ]
}

/// Settle `setter` from the outcome of `work`
///
/// Cancellation wins over `work`. Failures caused by an upstream fact are
/// logged at debug level since the upstream gatherer already reported them.
pub(crate) async fn settle<T, F>(setter: FactSetter<T>, cancel: &CancellationToken, work: F)
where
    F: Future<Output = Result<T, GatherError>> + Send,
    T: Send,
{
    let name = setter.name();
    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => Err(GatherError::Cancelled),
        result = work => result,
    };

    match result {
        Ok(value) => {
            tracing::debug!("Fact '{name}' resolved");
            setter.resolve(value);
        }
        Err(
            e @ (GatherError::MissingFact { .. }
            | GatherError::Cancelled
            | GatherError::NotFound { .. }),
        ) => {
            tracing::debug!("Fact '{name}' unavailable: {e}");
            setter.fail();
        }
        Err(e) => {
            tracing::warn!("Failed to gather '{name}': {e}");
            setter.fail();
        }
    }
}

/// Wait for an upstream fact, turning failure into [`GatherError::MissingFact`]
pub(crate) async fn require<T: Clone>(fact: &Fact<T>) -> Result<T, GatherError> {
    fact.wait()
        .await
        .ok_or(GatherError::MissingFact { fact: fact.name() })
}
