//! Issue source - GitHub REST API access.
//!
//! This module provides:
//! - IssueSource trait: list open issues of a repo, look up one issue's state
//! - GitHubClient implementation
//! - MockIssueSource for tests

pub mod client;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::{IssueRef, IssueState, RawIssue};

pub use client::{GITHUB_TOKEN_ENV, GitHubClient, GitHubConfig};

/// Errors from the issue source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// 403 (or 429): the API rate limit is used up
    #[error("rate limit hit")]
    RateLimited,

    #[error("unexpected status {status}")]
    Status { status: u16 },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl SourceError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, SourceError::RateLimited)
    }
}

#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Up to `per_page` open issues (pull requests included), newest first.
    async fn list_open_issues(&self, repo: &str, per_page: u32) -> Result<Vec<RawIssue>, SourceError>;

    /// Current upstream state of one issue.
    async fn issue_state(&self, issue: &IssueRef) -> Result<IssueState, SourceError>;
}

/// Canned answer for a repository listing.
#[derive(Debug, Clone)]
pub enum MockListing {
    Issues(Vec<RawIssue>),
    RateLimited,
    Status(u16),
    Malformed,
}

/// Canned answer for an issue-state lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockState {
    Open,
    Closed,
    Unreachable,
}

/// In-memory issue source. Unknown repos answer 404.
#[derive(Debug, Default)]
pub struct MockIssueSource {
    listings: HashMap<String, MockListing>,
    states: HashMap<(String, u64), MockState>,
    listed: Mutex<Vec<String>>,
    looked_up: Mutex<Vec<IssueRef>>,
}

impl MockIssueSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issues(self, repo: impl Into<String>, issues: Vec<RawIssue>) -> Self {
        self.with_listing(repo, MockListing::Issues(issues))
    }

    pub fn with_listing(mut self, repo: impl Into<String>, listing: MockListing) -> Self {
        self.listings.insert(repo.into(), listing);
        self
    }

    pub fn with_state(mut self, repo: impl Into<String>, number: u64, state: MockState) -> Self {
        self.states.insert((repo.into(), number), state);
        self
    }

    /// Repositories listed so far, in order.
    pub fn listed(&self) -> Vec<String> {
        self.listed.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Issues whose state was looked up, in order.
    pub fn looked_up(&self) -> Vec<IssueRef> {
        self.looked_up.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl IssueSource for MockIssueSource {
    async fn list_open_issues(&self, repo: &str, per_page: u32) -> Result<Vec<RawIssue>, SourceError> {
        if let Ok(mut listed) = self.listed.lock() {
            listed.push(repo.to_string());
        }

        match self.listings.get(repo) {
            Some(MockListing::Issues(issues)) => Ok(issues.iter().take(per_page as usize).cloned().collect()),
            Some(MockListing::RateLimited) => Err(SourceError::RateLimited),
            Some(MockListing::Status(status)) => Err(SourceError::Status { status: *status }),
            Some(MockListing::Malformed) => Err(SourceError::Malformed("expected a list of issues".to_string())),
            None => Err(SourceError::Status { status: 404 }),
        }
    }

    async fn issue_state(&self, issue: &IssueRef) -> Result<IssueState, SourceError> {
        if let Ok(mut looked_up) = self.looked_up.lock() {
            looked_up.push(issue.clone());
        }

        match self.states.get(&(issue.repo.clone(), issue.number)) {
            Some(MockState::Open) => Ok(IssueState::Open),
            Some(MockState::Closed) => Ok(IssueState::Closed),
            Some(MockState::Unreachable) => Err(SourceError::Malformed("connection reset".to_string())),
            None => Err(SourceError::Status { status: 404 }),
        }
    }
}
