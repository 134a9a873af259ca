//! Publisher: asks the judge about each selected candidate and persists the
//! ones it accepts.

use std::sync::Arc;

use crate::domain::{Candidate, Difficulty, IssueKey, PublishedIssueRecord, Verdict};
use crate::judge::{IssueBrief, Judge, JudgeOutcome};
use crate::store::IssueStore;
use crate::text::preview;

use super::report::PublishReport;

/// What happened to one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    /// Written to the store
    Published { key: IssueKey, difficulty: Difficulty },
    /// Dry run: would have been written
    WouldPublish { key: IssueKey, difficulty: Difficulty },
    /// The judge answered Reject
    Rejected { key: IssueKey, reason: Option<String> },
    /// Every judge model failed
    Exhausted { key: IssueKey },
    /// The judge's answer could not be parsed
    Malformed { key: IssueKey, error: String },
    /// The upsert failed
    StoreFailed { key: IssueKey, error: String },
}

impl PublishOutcome {
    pub fn key(&self) -> &IssueKey {
        match self {
            PublishOutcome::Published { key, .. }
            | PublishOutcome::WouldPublish { key, .. }
            | PublishOutcome::Rejected { key, .. }
            | PublishOutcome::Exhausted { key }
            | PublishOutcome::Malformed { key, .. }
            | PublishOutcome::StoreFailed { key, .. } => key,
        }
    }
}

impl PublishReport {
    pub fn record(&mut self, outcome: &PublishOutcome) {
        match outcome {
            PublishOutcome::Published { .. } => self.published += 1,
            PublishOutcome::WouldPublish { .. } => self.would_publish += 1,
            PublishOutcome::Rejected { .. } => self.rejected += 1,
            PublishOutcome::Exhausted { .. } => self.exhausted += 1,
            PublishOutcome::Malformed { .. } => self.malformed += 1,
            PublishOutcome::StoreFailed { .. } => self.store_failed += 1,
        }
    }
}

pub struct Publisher {
    judge: Judge,
    store: Arc<dyn IssueStore>,
}

impl Publisher {
    pub fn new(judge: Judge, store: Arc<dyn IssueStore>) -> Self {
        Self { judge, store }
    }

    /// The judge, for its token usage
    pub fn judge(&self) -> &Judge {
        &self.judge
    }

    /// Judge one candidate and persist it unless rejected. Never fails; every
    /// problem becomes an outcome.
    pub async fn publish(&self, candidate: &Candidate, dry_run: bool) -> PublishOutcome {
        let issue = &candidate.issue;
        let key = IssueKey {
            repo_name: candidate.repo.clone(),
            id: issue.id,
        };

        let brief = IssueBrief {
            repo: &candidate.repo,
            title: &issue.title,
            body: issue.body_text(),
            initial_difficulty: candidate.analysis.difficulty,
        };

        let content = match self.judge.evaluate(&brief).await {
            JudgeOutcome::Answered { model, content } => {
                log::debug!("Judge answered for {} with {}", key, model);
                content
            }
            JudgeOutcome::Exhausted(_) => return PublishOutcome::Exhausted { key },
        };

        let verdict = match Verdict::parse(&content) {
            Ok(verdict) => verdict,
            Err(e) => {
                log::warn!("Unparseable verdict for {}: {} ({})", key, e, preview(&content, 80));
                return PublishOutcome::Malformed {
                    key,
                    error: e.to_string(),
                };
            }
        };

        if verdict.is_reject() {
            log::info!(
                "Judge rejected '{}': {}",
                preview(&issue.title, 40),
                verdict.reason.as_deref().unwrap_or("no reason given")
            );
            return PublishOutcome::Rejected {
                key,
                reason: verdict.reason,
            };
        }

        let record = PublishedIssueRecord::from_candidate(candidate, &verdict);
        let difficulty = record.difficulty;

        if dry_run {
            log::info!(
                "Dry run: would publish [{}] '{}' ({})",
                difficulty,
                preview(&record.title, 40),
                record.url
            );
            return PublishOutcome::WouldPublish { key, difficulty };
        }

        match self.store.upsert(&record).await {
            Ok(()) => {
                log::info!("Published [{}] '{}'", difficulty, preview(&record.title, 40));
                PublishOutcome::Published { key, difficulty }
            }
            Err(e) => {
                log::warn!("Failed to publish {}: {}", key, e);
                PublishOutcome::StoreFailed {
                    key,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Publish each candidate in order.
    pub async fn publish_all(&self, candidates: &[Candidate], dry_run: bool) -> PublishReport {
        let mut report = PublishReport::default();
        for candidate in candidates {
            let outcome = self.publish(candidate, dry_run).await;
            report.record(&outcome);
        }
        report
    }
}
