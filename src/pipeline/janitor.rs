//! Janitor: prunes published records whose issue has been closed upstream.

use std::sync::Arc;

use crate::domain::{IssueState, IssueStatus};
use crate::github::IssueSource;
use crate::store::{IssueStore, StoreError};

use super::report::JanitorReport;

pub struct Janitor {
    source: Arc<dyn IssueSource>,
    store: Arc<dyn IssueStore>,
}

impl Janitor {
    pub fn new(source: Arc<dyn IssueSource>, store: Arc<dyn IssueStore>) -> Self {
        Self { source, store }
    }

    /// Check every published record and delete the ones closed upstream.
    ///
    /// Only a failure to list the records is returned; per-record lookup and
    /// delete failures are counted and the sweep moves on. A record is only
    /// deleted after its issue was observed closed in this sweep.
    pub async fn sweep(&self, dry_run: bool) -> Result<JanitorReport, StoreError> {
        if dry_run {
            log::info!("Dry run: janitor skipped");
            return Ok(JanitorReport::skipped());
        }

        log::info!("Janitor: checking for closed issues ({})", self.store.backend());
        let records = self.store.list_by_status(IssueStatus::Published).await?;
        let mut report = JanitorReport::default();

        for record in records {
            let key = record.key();
            let Some(issue_ref) = record.upstream_ref() else {
                log::warn!("Janitor: cannot derive upstream issue for {} from {:?}", key, record.url);
                report.unresolvable += 1;
                continue;
            };

            report.checked += 1;
            match self.source.issue_state(&issue_ref).await {
                Ok(IssueState::Closed) => match self.store.delete(&key).await {
                    Ok(()) => {
                        log::info!("Janitor: removed closed issue {}", key);
                        report.removed += 1;
                    }
                    Err(e) => {
                        log::warn!("Janitor: failed to delete {}: {}", key, e);
                        report.delete_failed += 1;
                    }
                },
                Ok(IssueState::Open) => report.kept += 1,
                Err(e) => {
                    log::debug!("Janitor: state check for {} failed: {}", key, e);
                    report.unreachable += 1;
                }
            }
        }

        log::info!("Janitor finished: removed {} closed issues", report.removed);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Difficulty, PublishedIssueRecord};
    use crate::github::{MockIssueSource, MockState};
    use crate::store::{MemoryStore, StoreOp};

    fn record(repo: &str, id: u64, number: Option<u64>, url: &str) -> PublishedIssueRecord {
        PublishedIssueRecord {
            id,
            number,
            title: format!("Issue {}", id),
            repo_name: repo.to_string(),
            difficulty: Difficulty::Novice,
            ai_score: 0.6,
            ai_hint: "hint".to_string(),
            category: "Frontend".to_string(),
            url: url.to_string(),
            status: IssueStatus::Published,
            created_at: "2025-01-01T00:00:00Z".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_removes_only_closed() {
        let store = Arc::new(MemoryStore::with_records([
            record("octo/demo", 101, Some(1), "https://github.com/octo/demo/issues/1"),
            record("octo/demo", 102, Some(2), "https://github.com/octo/demo/issues/2"),
            record("octo/demo", 103, Some(3), "https://github.com/octo/demo/issues/3"),
        ]));
        let source = Arc::new(
            MockIssueSource::new()
                .with_state("octo/demo", 1, MockState::Closed)
                .with_state("octo/demo", 2, MockState::Open)
                .with_state("octo/demo", 3, MockState::Unreachable),
        );

        let janitor = Janitor::new(source, store.clone());
        let report = janitor.sweep(false).await.unwrap();

        assert_eq!(report.checked, 3);
        assert_eq!(report.removed, 1);
        assert_eq!(report.kept, 1);
        assert_eq!(report.unreachable, 1);
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.writes(),
            vec![StoreOp::Delete(record("octo/demo", 101, None, "").key())]
        );
    }

    #[tokio::test]
    async fn test_falls_back_to_url() {
        let store = Arc::new(MemoryStore::with_records([
            record("octo/demo", 101, None, "https://github.com/octo/demo/issues/9"),
            record("octo/demo", 102, None, "not a url"),
        ]));
        let source = Arc::new(MockIssueSource::new().with_state("octo/demo", 9, MockState::Closed));

        let janitor = Janitor::new(source.clone(), store.clone());
        let report = janitor.sweep(false).await.unwrap();

        assert_eq!(report.removed, 1);
        assert_eq!(report.unresolvable, 1);
        assert_eq!(source.looked_up().len(), 1);
        assert_eq!(source.looked_up()[0].number, 9);
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        let store = Arc::new(MemoryStore::with_records([record(
            "octo/demo",
            101,
            Some(1),
            "https://github.com/octo/demo/issues/1",
        )]));
        let source = Arc::new(MockIssueSource::new().with_state("octo/demo", 1, MockState::Closed));

        let janitor = Janitor::new(source.clone(), store.clone());
        let report = janitor.sweep(true).await.unwrap();

        assert_eq!(report, JanitorReport::skipped());
        assert!(store.ops().is_empty());
        assert!(source.looked_up().is_empty());
    }
}
