//! Hosting platform API client
//!
//! Talks to the GitHub REST API for pull request, release and asset
//! operations. Transient failures (network errors, 5xx, rate limits) of
//! idempotent requests are retried with exponential backoff.

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use regex::Regex;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

use crate::config::{defaults, urls};

/// Hosting API errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostingError {
    /// Request could not be sent or the response not received
    #[error("Network error calling '{url}': {error}")]
    Network { url: String, error: String },

    /// API answered with an error status
    #[error("Hosting API returned {status} for '{url}': {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    /// Response body did not have the expected shape
    #[error("Unexpected response from '{url}': {error}")]
    Decode { url: String, error: String },
}

/// Pull request label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label name
    pub name: String,
}

/// Account reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Login name
    pub login: String,
}

/// Pull request as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Number
    pub number: u64,
    /// Title
    pub title: String,
    /// Web URL
    pub html_url: String,
    /// State (`open` or `closed`)
    pub state: String,
    /// Merge timestamp (RFC 3339), if merged
    #[serde(default)]
    pub merged_at: Option<String>,
    /// Author
    #[serde(default)]
    pub user: Option<User>,
    /// Labels
    #[serde(default)]
    pub labels: Vec<Label>,
}

/// Release as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Release id
    pub id: u64,
    /// Git tag
    pub tag_name: String,
    /// Web URL
    pub html_url: String,
    /// Asset upload URL template
    pub upload_url: String,
    /// Publication timestamp (RFC 3339)
    #[serde(default)]
    pub published_at: Option<String>,
}

/// Request body for creating a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRelease {
    /// Git tag to create or use
    pub tag_name: String,
    /// Commit the tag points at when it does not exist yet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_commitish: Option<String>,
    /// Release title
    pub name: String,
    /// Release body (markdown)
    pub body: String,
    /// Mark as pre-release
    pub prerelease: bool,
}

/// Narrow interface to the hosting platform
#[async_trait]
pub trait HostingClient: Send + Sync + Debug {
    /// Pull requests associated with a commit
    async fn pull_requests_for_commit(
        &self,
        owner: &str,
        repository: &str,
        sha: &str,
    ) -> Result<Vec<PullRequest>, HostingError>;

    /// Latest published release, if any
    async fn latest_release(
        &self,
        owner: &str,
        repository: &str,
    ) -> Result<Option<Release>, HostingError>;

    /// Recently closed pull requests, most recently updated first
    async fn closed_pull_requests(
        &self,
        owner: &str,
        repository: &str,
    ) -> Result<Vec<PullRequest>, HostingError>;

    /// Create a release
    async fn create_release(
        &self,
        owner: &str,
        repository: &str,
        release: &NewRelease,
    ) -> Result<Release, HostingError>;

    /// Upload a release asset
    async fn upload_asset(
        &self,
        release: &Release,
        name: &str,
        content: Vec<u8>,
    ) -> Result<(), HostingError>;
}

/// GitHub REST API client
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
    retry_window: Duration,
}

impl GitHubClient {
    /// Create a client for the public GitHub API
    pub fn new(token: Option<String>) -> Self {
        Self::with_api_url(urls::GITHUB_API.to_string(), token)
    }

    /// Create a client for a custom API base URL (GitHub Enterprise, tests)
    pub fn with_api_url(api_url: String, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .connect_timeout(Duration::from_secs(15))
                .user_agent(concat!("galley/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            retry_window: Duration::from_secs(defaults::API_RETRY_WINDOW_SECS),
        }
    }

    /// Limit how long transient failures are retried
    #[must_use]
    pub fn with_retry_window(mut self, window: Duration) -> Self {
        self.retry_window = window;
        self
    }

    /// API base URL
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_millis(500),
            max_elapsed_time: Some(self.retry_window),
            ..ExponentialBackoff::default()
        }
    }

    /// Send a request, retrying transient failures
    ///
    /// Non-idempotent requests are retried only when the connection could
    /// not be opened, since a failed response may follow a completed write.
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<Body>,
    ) -> Result<reqwest::Response, HostingError> {
        let retryable = is_idempotent(&method);
        let attempt = || {
            let method = method.clone();
            let body = body.clone();
            async move {
                let mut request = self
                    .client
                    .request(method, url)
                    .header("Accept", "application/vnd.github+json")
                    .header("X-GitHub-Api-Version", "2022-11-28");
                if let Some(token) = &self.token {
                    request = request.bearer_auth(token);
                }
                request = match body {
                    Some(Body::Json(value)) => request.json(&value),
                    Some(Body::Bytes(bytes)) => request
                        .header("Content-Type", "application/octet-stream")
                        .body(bytes),
                    None => request,
                };

                let response = request.send().await.map_err(|e| {
                    let error = HostingError::Network {
                        url: url.to_string(),
                        error: e.to_string(),
                    };
                    if retryable || e.is_connect() {
                        backoff::Error::transient(error)
                    } else {
                        backoff::Error::permanent(error)
                    }
                })?;

                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }

                let message = response.text().await.unwrap_or_default();
                let error = HostingError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                    message,
                };
                if retryable && (status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS) {
                    Err(backoff::Error::transient(error))
                } else {
                    Err(backoff::Error::permanent(error))
                }
            }
        };

        backoff::future::retry(self.backoff(), attempt).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, HostingError> {
        let response = self.send(Method::GET, url, None).await?;
        decode(url, response).await
    }
}

fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::PUT | Method::DELETE
    )
}

#[derive(Debug, Clone)]
enum Body {
    Json(serde_json::Value),
    Bytes(Vec<u8>),
}

async fn decode<T: DeserializeOwned>(url: &str, response: reqwest::Response) -> Result<T, HostingError> {
    response.json::<T>().await.map_err(|e| HostingError::Decode {
        url: url.to_string(),
        error: e.to_string(),
    })
}

#[async_trait]
impl HostingClient for GitHubClient {
    async fn pull_requests_for_commit(
        &self,
        owner: &str,
        repository: &str,
        sha: &str,
    ) -> Result<Vec<PullRequest>, HostingError> {
        let url = format!(
            "{}/repos/{owner}/{repository}/commits/{sha}/pulls",
            self.api_url
        );
        self.get_json(&url).await
    }

    async fn latest_release(
        &self,
        owner: &str,
        repository: &str,
    ) -> Result<Option<Release>, HostingError> {
        let url = format!("{}/repos/{owner}/{repository}/releases/latest", self.api_url);
        match self.get_json(&url).await {
            Ok(release) => Ok(Some(release)),
            Err(HostingError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn closed_pull_requests(
        &self,
        owner: &str,
        repository: &str,
    ) -> Result<Vec<PullRequest>, HostingError> {
        let url = format!(
            "{}/repos/{owner}/{repository}/pulls?state=closed&sort=updated&direction=desc&per_page=100",
            self.api_url
        );
        self.get_json(&url).await
    }

    async fn create_release(
        &self,
        owner: &str,
        repository: &str,
        release: &NewRelease,
    ) -> Result<Release, HostingError> {
        let url = format!("{}/repos/{owner}/{repository}/releases", self.api_url);
        let body = serde_json::to_value(release).map_err(|e| HostingError::Decode {
            url: url.clone(),
            error: e.to_string(),
        })?;
        let response = self.send(Method::POST, &url, Some(Body::Json(body))).await?;
        decode(&url, response).await
    }

    async fn upload_asset(
        &self,
        release: &Release,
        name: &str,
        content: Vec<u8>,
    ) -> Result<(), HostingError> {
        let base = release
            .upload_url
            .split('{')
            .next()
            .unwrap_or(&release.upload_url);
        let url = reqwest::Url::parse_with_params(base, &[("name", name)])
            .map_err(|e| HostingError::Network {
                url: base.to_string(),
                error: e.to_string(),
            })?
            .to_string();
        self.send(Method::POST, &url, Some(Body::Bytes(content)))
            .await
            .map(|_| ())
    }
}

/// Owner and repository of a GitHub remote URL
///
/// Accepts HTTPS (with or without credentials), SCP-like SSH and `ssh://`
/// forms, with or without a `.git` suffix.
pub fn parse_github_remote(url: &str) -> Option<(String, String)> {
    static REMOTE: OnceLock<Regex> = OnceLock::new();
    let regex = REMOTE.get_or_init(|| {
        Regex::new(
            r"^(?:https?://(?:[^@/]+@)?github\.com/|git@github\.com:|ssh://git@github\.com/)([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+?)(?:\.git)?/?$",
        )
        .unwrap_or_else(|e| unreachable!("remote pattern is valid: {e}"))
    });

    let captures = regex.captures(url.trim())?;
    Some((captures[1].to_string(), captures[2].to_string()))
}
