//! The persisted `issues` row.

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::{Candidate, Difficulty, Verdict};

/// Hint stored when the judge did not provide one.
pub const DEFAULT_HINT: &str = "No hint available.";

/// Lifecycle status of a persisted record. Only published rows exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueStatus {
    #[default]
    Published,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Published => "PUBLISHED",
        }
    }
}

/// Store key of a record. Issue ids are only trusted to be unique within a
/// repository, so the repository is part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IssueKey {
    pub repo_name: String,
    pub id: u64,
}

impl std::fmt::Display for IssueKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} #{}", self.repo_name, self.id)
    }
}

/// Repository and issue number, enough to address an issue upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRef {
    pub repo: String,
    pub number: u64,
}

impl IssueRef {
    /// Parse `https://github.com/{owner}/{repo}/issues/{number}`.
    ///
    /// Host, query, fragment and trailing slashes are ignored; anything that
    /// does not have that path shape yields `None`.
    pub fn from_html_url(url: &str) -> Option<Self> {
        let parsed = Url::parse(url).ok()?;
        let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [owner, repo, "issues", number] => Some(Self {
                repo: format!("{}/{}", owner, repo),
                number: number.parse().ok()?,
            }),
            _ => None,
        }
    }
}

/// A published issue as stored in the `issues` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedIssueRecord {
    pub id: u64,

    /// Per-repository issue number; absent on rows written before the column existed
    #[serde(default)]
    pub number: Option<u64>,

    pub title: String,
    pub repo_name: String,
    pub difficulty: Difficulty,

    /// Local classifier confidence
    pub ai_score: f64,

    /// Judge-written guide (goal, likely files, plan)
    pub ai_hint: String,

    pub category: String,
    pub url: String,

    #[serde(default)]
    pub status: IssueStatus,

    pub created_at: DateTime<Utc>,
}

impl PublishedIssueRecord {
    /// Build the record for an accepted candidate.
    ///
    /// The judge's difficulty and hint win; the local estimate and
    /// [`DEFAULT_HINT`] fill in whatever the judge left out.
    pub fn from_candidate(candidate: &Candidate, verdict: &Verdict) -> Self {
        let issue = &candidate.issue;
        Self {
            id: issue.id,
            number: Some(issue.number),
            title: issue.title.clone(),
            repo_name: candidate.repo.clone(),
            difficulty: verdict.verified_difficulty.unwrap_or(candidate.analysis.difficulty),
            ai_score: candidate.analysis.score,
            ai_hint: verdict
                .hint
                .clone()
                .filter(|h| !h.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_HINT.to_string()),
            category: candidate.category.clone(),
            url: issue.html_url.clone(),
            status: IssueStatus::Published,
            created_at: issue.created_at,
        }
    }

    pub fn key(&self) -> IssueKey {
        IssueKey {
            repo_name: self.repo_name.clone(),
            id: self.id,
        }
    }

    /// Where to ask about this issue upstream.
    ///
    /// Uses the stored repository and number when available and only falls
    /// back to parsing the HTML URL for older rows.
    pub fn upstream_ref(&self) -> Option<IssueRef> {
        match self.number {
            Some(number) => Some(IssueRef {
                repo: self.repo_name.clone(),
                number,
            }),
            None => IssueRef::from_html_url(&self.url),
        }
    }
}
