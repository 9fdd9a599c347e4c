//! Publish destinations
//!
//! Destinations are given on the command line as `<artifact>><target>`, for
//! example `container>ghcr.io/acme` or `release>dynamic`. A `dynamic` target
//! is a placeholder that the destination gatherer rewrites once hosting
//! platform information is known.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::urls;
use crate::core::artifact::ArtifactType;
use crate::core::context::HostingInfo;
use crate::error::DestinationError;

/// Target keyword that defers the destination to hosting information
pub const DYNAMIC: &str = "dynamic";

/// A typed publish target
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Destination {
    /// Container registry, e.g. `ghcr.io/acme`
    Container { registry: String },
    /// Package feed URL
    PackageFeed { url: String },
    /// Release on the hosting platform
    Release { owner: String, repository: String },
    /// Chart repository (OCI reference or URL)
    ChartRepository { url: String },
    /// Placeholder resolved from hosting information
    Dynamic { artifact: ArtifactType },
}

impl Destination {
    /// Artifact type published to this destination
    pub fn artifact_type(&self) -> ArtifactType {
        match self {
            Self::Container { .. } => ArtifactType::Container,
            Self::PackageFeed { .. } => ArtifactType::Package,
            Self::Release { .. } => ArtifactType::Release,
            Self::ChartRepository { .. } => ArtifactType::HelmChart,
            Self::Dynamic { artifact } => *artifact,
        }
    }

    /// Whether this is an unresolved placeholder
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic { .. })
    }

    /// Concrete destination for a placeholder, given hosting information
    ///
    /// Concrete destinations are returned unchanged.
    pub fn resolve(&self, hosting: &HostingInfo) -> Destination {
        let Self::Dynamic { artifact } = self else {
            return self.clone();
        };
        let owner = hosting.owner.to_lowercase();
        match artifact {
            ArtifactType::Package => Self::PackageFeed {
                url: format!("{}/{}/index.json", urls::GITHUB_NUGET, hosting.owner),
            },
            ArtifactType::Release => Self::Release {
                owner: hosting.owner.clone(),
                repository: hosting.repository.clone(),
            },
            ArtifactType::HelmChart => Self::ChartRepository {
                url: format!("oci://{}/{owner}/charts", urls::GITHUB_CONTAINER_REGISTRY),
            },
            _ => Self::Container {
                registry: format!("{}/{owner}", urls::GITHUB_CONTAINER_REGISTRY),
            },
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container { registry } => write!(f, "container>{registry}"),
            Self::PackageFeed { url } => write!(f, "package>{url}"),
            Self::Release { owner, repository } => {
                write!(f, "release>github.com/{owner}/{repository}")
            }
            Self::ChartRepository { url } => write!(f, "helm-chart>{url}"),
            Self::Dynamic { artifact } => write!(f, "{artifact}>{DYNAMIC}"),
        }
    }
}

impl FromStr for Destination {
    type Err = DestinationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (artifact, target) = input
            .split_once('>')
            .map(|(a, t)| (a.trim(), t.trim()))
            .filter(|(a, t)| !a.is_empty() && !t.is_empty())
            .ok_or_else(|| DestinationError::Malformed {
                input: input.to_string(),
            })?;

        let artifact_type = ArtifactType::parse(artifact)
            .filter(|t| {
                matches!(
                    t,
                    ArtifactType::Container
                        | ArtifactType::Package
                        | ArtifactType::Release
                        | ArtifactType::HelmChart
                )
            })
            .ok_or_else(|| DestinationError::UnsupportedArtifact {
                input: input.to_string(),
                artifact: artifact.to_string(),
            })?;

        if target == DYNAMIC {
            return Ok(Self::Dynamic {
                artifact: artifact_type,
            });
        }

        let invalid = |reason: &str| DestinationError::InvalidTarget {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        match artifact_type {
            ArtifactType::Container => Ok(Self::Container {
                registry: target.trim_end_matches('/').to_string(),
            }),
            ArtifactType::Package => {
                if target.starts_with("https://") || target.starts_with("http://") {
                    Ok(Self::PackageFeed {
                        url: target.to_string(),
                    })
                } else {
                    Err(invalid("package feeds must be http(s) URLs"))
                }
            }
            ArtifactType::HelmChart => {
                if ["oci://", "https://", "http://"]
                    .iter()
                    .any(|scheme| target.starts_with(scheme))
                {
                    Ok(Self::ChartRepository {
                        url: target.trim_end_matches('/').to_string(),
                    })
                } else {
                    Err(invalid("chart repositories must be oci:// or http(s) URLs"))
                }
            }
            _ => {
                let path = target
                    .trim_start_matches("https://")
                    .trim_start_matches("github.com/");
                match path.split('/').collect::<Vec<_>>().as_slice() {
                    [owner, repository] if !owner.is_empty() && !repository.is_empty() => {
                        Ok(Self::Release {
                            owner: (*owner).to_string(),
                            repository: repository.trim_end_matches(".git").to_string(),
                        })
                    }
                    _ => Err(invalid("releases must name github.com/<owner>/<repository>")),
                }
            }
        }
    }
}

/// Rewrite every dynamic destination in place
///
/// Each placeholder is replaced by its concrete destination at the same
/// position. Without hosting information placeholders cannot be resolved and
/// are removed. Duplicates produced by the rewrite are dropped. Returns the
/// number of placeholders that were rewritten.
pub fn resolve_dynamic(destinations: &mut Vec<Destination>, hosting: Option<&HostingInfo>) -> usize {
    let mut rewritten = 0;
    destinations.retain_mut(|destination| {
        if !destination.is_dynamic() {
            return true;
        }
        match hosting {
            Some(hosting) => {
                *destination = destination.resolve(hosting);
                rewritten += 1;
                true
            }
            None => {
                tracing::warn!("Dropping destination '{destination}': hosting information is unavailable");
                false
            }
        }
    });

    let mut seen = Vec::with_capacity(destinations.len());
    destinations.retain(|destination| {
        if seen.contains(destination) {
            false
        } else {
            seen.push(destination.clone());
            true
        }
    });

    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosting() -> HostingInfo {
        HostingInfo {
            owner: "Acme".to_string(),
            repository: "tool".to_string(),
            url: "https://github.com/Acme/tool".to_string(),
            api_url: "https://api.github.com".to_string(),
        }
    }

    #[test]
    fn test_parse_concrete_destinations() {
        assert_eq!(
            "container>ghcr.io/acme/".parse::<Destination>().unwrap(),
            Destination::Container {
                registry: "ghcr.io/acme".to_string()
            }
        );
        assert_eq!(
            "release>github.com/acme/tool".parse::<Destination>().unwrap(),
            Destination::Release {
                owner: "acme".to_string(),
                repository: "tool".to_string()
            }
        );
        assert_eq!(
            "helm-chart>oci://registry.acme.io/charts"
                .parse::<Destination>()
                .unwrap(),
            Destination::ChartRepository {
                url: "oci://registry.acme.io/charts".to_string()
            }
        );
    }

    #[test]
    fn test_parse_dynamic() {
        assert_eq!(
            "container>dynamic".parse::<Destination>().unwrap(),
            Destination::Dynamic {
                artifact: ArtifactType::Container
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            "container".parse::<Destination>(),
            Err(DestinationError::Malformed { .. })
        ));
        assert!(matches!(
            "executable>somewhere".parse::<Destination>(),
            Err(DestinationError::UnsupportedArtifact { .. })
        ));
        assert!(matches!(
            "release>acme".parse::<Destination>(),
            Err(DestinationError::InvalidTarget { .. })
        ));
        assert!(matches!(
            "package>feed.local".parse::<Destination>(),
            Err(DestinationError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn test_display_parses_back() {
        for input in [
            "container>ghcr.io/acme",
            "release>github.com/acme/tool",
            "helm-chart>https://charts.acme.io",
            "package>dynamic",
        ] {
            let destination: Destination = input.parse().unwrap();
            assert_eq!(destination.to_string(), input);
        }
    }

    #[test]
    fn test_resolve_dynamic_rewrites_in_place() {
        let mut destinations = vec![
            Destination::Container {
                registry: "docker.io/acme".to_string(),
            },
            Destination::Dynamic {
                artifact: ArtifactType::Container,
            },
            Destination::Dynamic {
                artifact: ArtifactType::Release,
            },
        ];

        let rewritten = resolve_dynamic(&mut destinations, Some(&hosting()));

        assert_eq!(rewritten, 2);
        assert_eq!(
            destinations,
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

    #[test]
    fn test_resolve_dynamic_without_hosting_drops_placeholders() {
        let mut destinations = vec![
            Destination::Dynamic {
                artifact: ArtifactType::HelmChart,
            },
            Destination::ChartRepository {
                url: "https://charts.acme.io".to_string(),
            },
        ];

        let rewritten = resolve_dynamic(&mut destinations, None);

        assert_eq!(rewritten, 0);
        assert_eq!(destinations.len(), 1);
        assert!(!destinations[0].is_dynamic());
    }

    #[test]
    fn test_resolve_dynamic_drops_duplicates() {
        let mut destinations = vec![
            Destination::Container {
                registry: "ghcr.io/acme".to_string(),
            },
            Destination::Dynamic {
                artifact: ArtifactType::Container,
            },
        ];
        resolve_dynamic(&mut destinations, Some(&hosting()));
        assert_eq!(destinations.len(), 1);
    }
}
