//! Candidate hunter: scans a category's repositories for promising issues.

use std::sync::Arc;

use crate::classifier::{ClassifierOutcome, DifficultyClassifier};
use crate::config::CategoryConfig;
use crate::domain::Candidate;
use crate::github::{IssueSource, SourceError};
use crate::text::preview;

use super::report::HuntReport;

pub struct Hunter {
    source: Arc<dyn IssueSource>,
    classifier: DifficultyClassifier,
    fetch_per_repo: u32,
    min_confidence: f64,
}

impl Hunter {
    pub fn new(
        source: Arc<dyn IssueSource>,
        classifier: DifficultyClassifier,
        fetch_per_repo: u32,
        min_confidence: f64,
    ) -> Self {
        Self {
            source,
            classifier,
            fetch_per_repo,
            min_confidence,
        }
    }

    /// Scan every repository of the category, in order.
    ///
    /// A failing repository is logged and skipped; it never aborts the
    /// category.
    pub async fn hunt(&self, category: &CategoryConfig) -> (Vec<Candidate>, HuntReport) {
        let mut candidates = Vec::new();
        let mut report = HuntReport::default();

        for repo in &category.repos {
            let issues = match self.source.list_open_issues(repo, self.fetch_per_repo).await {
                Ok(issues) => issues,
                Err(SourceError::RateLimited) => {
                    log::warn!("{}: rate limit hit (403), skipping", repo);
                    report.repos_rate_limited += 1;
                    continue;
                }
                Err(e) => {
                    log::warn!("{}: scan failed: {}", repo, e);
                    report.repos_failed += 1;
                    continue;
                }
            };

            log::info!("{}: scanned {} issues", repo, issues.len());
            report.repos_scanned += 1;
            report.issues_seen += issues.len();

            for issue in issues {
                if issue.is_pull_request() {
                    report.pull_requests_skipped += 1;
                    continue;
                }

                let analysis = match self.classifier.classify(&issue.classifier_text()).await {
                    ClassifierOutcome::Scored(analysis) => analysis,
                    ClassifierOutcome::Empty | ClassifierOutcome::Failed(_) => {
                        report.unscored += 1;
                        continue;
                    }
                };

                if analysis.score < self.min_confidence {
                    log::debug!(
                        "{}: '{}' below threshold ({:.2} < {:.2})",
                        repo,
                        preview(&issue.title, 40),
                        analysis.score,
                        self.min_confidence
                    );
                    report.below_threshold += 1;
                    continue;
                }

                candidates.push(Candidate {
                    issue,
                    analysis,
                    repo: repo.clone(),
                    category: category.name.clone(),
                });
            }
        }

        report.candidates = candidates.len();
        (candidates, report)
    }
}
