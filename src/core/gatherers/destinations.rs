//! Destination gatherer
//!
//! Rewrites `dynamic` destinations once hosting information is known. This
//! is the only writer of the context's destination list.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::Gatherer;
use crate::core::context::BuildContext;
use crate::core::destination::resolve_dynamic;

/// Resolves dynamic destinations from the `hosting` fact
#[derive(Debug, Default)]
pub struct DestinationGatherer;

impl DestinationGatherer {
    /// Create a destination gatherer
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Gatherer for DestinationGatherer {
    fn name(&self) -> &'static str {
        "destinations"
    }

    async fn gather(self: Box<Self>, context: &BuildContext, cancel: &CancellationToken) {
        let hosting = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            hosting = context.hosting.wait() => hosting,
        };

        let mut destinations = context.destinations_mut().await;
        let rewritten = resolve_dynamic(&mut destinations, hosting.as_ref());
        if rewritten > 0 {
            tracing::debug!("Resolved {rewritten} dynamic destination(s)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::artifact::ArtifactType;
    use crate::core::context::{Convention, HostingInfo};
    use crate::core::destination::Destination;
    use semver::Version;

    fn context() -> (BuildContext, crate::core::context::FactSetters) {
        BuildContext::new(
            Version::new(1, 0, 0),
            std::env::temp_dir(),
            Convention::Release,
            vec![
                Destination::Container {
                    registry: "docker.io/acme".to_string(),
                },
                Destination::Dynamic {
                    artifact: ArtifactType::Container,
                },
                Destination::Dynamic {
                    artifact: ArtifactType::Release,
                },
            ],
        )
    }

    #[tokio::test]
    async fn test_rewrites_in_place() {
        let (ctx, setters) = context();
        setters.hosting.resolve(HostingInfo {
            owner: "Acme".to_string(),
            repository: "tool".to_string(),
            url: "https://github.com/Acme/tool".to_string(),
            api_url: "https://api.github.com".to_string(),
        });

        Box::new(DestinationGatherer::new())
            .gather(&ctx, &CancellationToken::new())
            .await;

        assert_eq!(
            ctx.destinations().await,
            vec![
                Destination::Container {
                    registry: "docker.io/acme".to_string()
                },
                Destination::Container {
                    registry: "ghcr.io/acme".to_string()
                },
                Destination::Release {
                    owner: "Acme".to_string(),
                    repository: "tool".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_drops_placeholders_without_hosting() {
        let (ctx, setters) = context();
        setters.hosting.fail();

        Box::new(DestinationGatherer::new())
            .gather(&ctx, &CancellationToken::new())
            .await;

        assert_eq!(
            ctx.destinations().await,
            vec![Destination::Container {
                registry: "docker.io/acme".to_string()
            }]
        );
    }
}
