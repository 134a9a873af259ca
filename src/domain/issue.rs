//! Issues as fetched from the issue source, and the candidates derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Difficulty;

/// Upstream state of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
}

/// An issue as returned by the GitHub issues API.
///
/// Only the fields the pipeline reads are kept; everything else in the
/// payload is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawIssue {
    /// Globally unique issue id
    pub id: u64,

    /// Per-repository issue number (the one in the URL)
    pub number: u64,

    pub title: String,

    pub body: Option<String>,

    pub html_url: String,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub state: IssueState,

    /// Present only when the "issue" is really a pull request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<serde_json::Value>,
}

impl RawIssue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    /// Body text, empty when the issue has none.
    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }

    /// The text the local classifier scores: title and body joined by a space.
    pub fn classifier_text(&self) -> String {
        format!("{} {}", self.title, self.body_text())
    }
}

/// The local classifier's estimate for one issue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalAnalysis {
    pub difficulty: Difficulty,
    /// Confidence in [0, 1]
    pub score: f64,
}

impl LocalAnalysis {
    /// Build an analysis, clamping the score into [0, 1].
    pub fn new(difficulty: Difficulty, score: f64) -> Self {
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
        Self { difficulty, score }
    }

    /// The analysis used whenever there is nothing meaningful to score.
    pub fn reject() -> Self {
        Self {
            difficulty: Difficulty::Reject,
            score: 0.0,
        }
    }
}

/// An open issue that passed the local confidence filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub issue: RawIssue,
    pub analysis: LocalAnalysis,
    /// Repository identifier, `owner/name`
    pub repo: String,
    pub category: String,
}

impl Candidate {
    pub fn score(&self) -> f64 {
        self.analysis.score
    }
}
