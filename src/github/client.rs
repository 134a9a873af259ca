//! GitHub REST v3 client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::{IssueSource, SourceError};
use crate::domain::{IssueRef, IssueState, RawIssue};

/// GitHub API base URL
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Environment variable holding the optional token
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub api_base: String,
    /// Timeout for issue listings
    pub list_timeout: Duration,
    /// Timeout for single-issue state checks
    pub state_timeout: Duration,
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: GITHUB_API_URL.to_string(),
            list_timeout: Duration::from_secs(10),
            state_timeout: Duration::from_secs(5),
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IssueStateBody {
    state: IssueState,
}

pub struct GitHubClient {
    client: Client,
    token: Option<String>,
    config: GitHubConfig,
}

impl GitHubClient {
    /// Create a client. A token raises the rate limit but is not required.
    pub fn new(config: GitHubConfig, token: Option<String>) -> Result<Self, SourceError> {
        let client = Client::builder().user_agent(config.user_agent.clone()).build()?;
        Ok(Self { client, token, config })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn repo_url(&self, repo: &str) -> String {
        format!("{}/repos/{}", self.config.api_base.trim_end_matches('/'), repo)
    }

    fn get(&self, url: String, timeout: Duration) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .timeout(timeout)
            .header("Accept", "application/vnd.github+json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn check_status(status: StatusCode) -> Result<(), SourceError> {
        match status.as_u16() {
            200 => Ok(()),
            403 | 429 => Err(SourceError::RateLimited),
            other => Err(SourceError::Status { status: other }),
        }
    }

    /// Decode a listing, skipping individual entries that do not look like issues.
    fn parse_listing(body: &str) -> Result<Vec<RawIssue>, SourceError> {
        let value: Value = serde_json::from_str(body).map_err(|e| SourceError::Malformed(e.to_string()))?;
        let Value::Array(items) = value else {
            return Err(SourceError::Malformed("expected a list of issues".to_string()));
        };

        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<RawIssue>(item) {
                Ok(issue) => Some(issue),
                Err(e) => {
                    log::debug!("Skipping malformed issue entry: {}", e);
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl IssueSource for GitHubClient {
    async fn list_open_issues(&self, repo: &str, per_page: u32) -> Result<Vec<RawIssue>, SourceError> {
        let url = format!("{}/issues", self.repo_url(repo));
        let response = self
            .get(url, self.config.list_timeout)
            .query(&[
                ("state", "open".to_string()),
                ("sort", "created".to_string()),
                ("direction", "desc".to_string()),
                ("per_page", per_page.to_string()),
            ])
            .send()
            .await?;

        Self::check_status(response.status())?;
        let body = response.text().await?;
        Self::parse_listing(&body)
    }

    async fn issue_state(&self, issue: &IssueRef) -> Result<IssueState, SourceError> {
        let url = format!("{}/issues/{}", self.repo_url(&issue.repo), issue.number);
        let response = self.get(url, self.config.state_timeout).send().await?;

        Self::check_status(response.status())?;
        let body = response.text().await?;
        let parsed: IssueStateBody = serde_json::from_str(&body).map_err(|e| SourceError::Malformed(e.to_string()))?;
        Ok(parsed.state)
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_base", &self.config.api_base)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
