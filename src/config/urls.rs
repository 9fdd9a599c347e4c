//! Hosting platform URLs

/// GitHub web base URL
pub const GITHUB: &str = "https://github.com";

/// GitHub REST API base URL
pub const GITHUB_API: &str = "https://api.github.com";

/// GitHub container registry host
pub const GITHUB_CONTAINER_REGISTRY: &str = "ghcr.io";

/// GitHub NuGet package feed
pub const GITHUB_NUGET: &str = "https://nuget.pkg.github.com";
