//! Counters produced by each pipeline stage.

use serde::Serialize;

use crate::llm::Usage;

/// How the janitor sweep ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum SweepStatus {
    #[default]
    Completed,
    /// Dry-run mode: the sweep did not run at all
    SkippedDryRun,
    /// The published records could not be listed
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JanitorReport {
    pub status: SweepStatus,
    /// Records whose upstream state was asked for
    pub checked: usize,
    /// Records deleted because the issue is closed
    pub removed: usize,
    /// Records still open upstream
    pub kept: usize,
    /// State lookups that failed (network, status, payload)
    pub unreachable: usize,
    /// Records with neither a number nor a parseable URL
    pub unresolvable: usize,
    /// Closed issues whose delete failed
    pub delete_failed: usize,
}

impl JanitorReport {
    pub fn skipped() -> Self {
        Self {
            status: SweepStatus::SkippedDryRun,
            ..Self::default()
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: SweepStatus::Failed(reason.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HuntReport {
    pub repos_scanned: usize,
    pub repos_failed: usize,
    pub repos_rate_limited: usize,
    pub issues_seen: usize,
    pub pull_requests_skipped: usize,
    /// Scored, but below the minimum confidence
    pub below_threshold: usize,
    /// Empty text or classifier failure
    pub unscored: usize,
    pub candidates: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub published: usize,
    pub would_publish: usize,
    pub rejected: usize,
    pub exhausted: usize,
    pub malformed: usize,
    pub store_failed: usize,
}

impl PublishReport {
    pub fn attempted(&self) -> usize {
        self.published + self.would_publish + self.rejected + self.exhausted + self.malformed + self.store_failed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryReport {
    pub category: String,
    pub hunt: HuntReport,
    /// Candidates kept by the selector
    pub selected: usize,
    /// Candidates cut by the batch limit
    pub dropped_by_limit: usize,
    pub publish: PublishReport,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub janitor: JanitorReport,
    pub categories: Vec<CategoryReport>,
    /// Tokens spent by the judge over the whole run
    pub judge_usage: Usage,
}

impl RunReport {
    /// Sum of the publish counters over all categories.
    pub fn totals(&self) -> PublishReport {
        self.categories.iter().fold(PublishReport::default(), |mut acc, c| {
            acc.published += c.publish.published;
            acc.would_publish += c.publish.would_publish;
            acc.rejected += c.publish.rejected;
            acc.exhausted += c.publish.exhausted;
            acc.malformed += c.publish.malformed;
            acc.store_failed += c.publish.store_failed;
            acc
        })
    }
}
