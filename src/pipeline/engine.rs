//! The engine wires the stages together and runs them in order.

use std::sync::Arc;

use crate::classifier::DifficultyClassifier;
use crate::config::{CategoryConfig, PipelineConfig};
use crate::domain::Candidate;
use crate::error::{GitnovaError, Result};
use crate::github::IssueSource;
use crate::judge::Judge;
use crate::store::IssueStore;

use super::hunter::Hunter;
use super::janitor::Janitor;
use super::publisher::Publisher;
use super::report::{CategoryReport, HuntReport, JanitorReport, RunReport};
use super::selector::select;

/// The external services a pipeline run talks to.
pub struct Services {
    pub source: Arc<dyn IssueSource>,
    pub classifier: DifficultyClassifier,
    pub judge: Judge,
    pub store: Arc<dyn IssueStore>,
}

/// Hunt and selection results for one category, without judging.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub category: String,
    pub hunt: HuntReport,
    pub selected: Vec<Candidate>,
}

pub struct Engine {
    janitor: Janitor,
    hunter: Hunter,
    publisher: Publisher,
    categories: Vec<CategoryConfig>,
    batch_limit: usize,
    dry_run: bool,
}

impl Engine {
    pub fn new(services: Services, pipeline: &PipelineConfig, categories: Vec<CategoryConfig>, dry_run: bool) -> Self {
        let Services {
            source,
            classifier,
            judge,
            store,
        } = services;

        Self {
            janitor: Janitor::new(Arc::clone(&source), Arc::clone(&store)),
            hunter: Hunter::new(
                source,
                classifier,
                pipeline.fetch_per_repo,
                pipeline.local_min_confidence,
            ),
            publisher: Publisher::new(judge, store),
            categories,
            batch_limit: pipeline.judge_batch_limit,
            dry_run,
        }
    }

    /// Run the janitor alone.
    pub async fn sweep(&self) -> Result<JanitorReport> {
        Ok(self.janitor.sweep(self.dry_run).await?)
    }

    /// Full pass: janitor once, then hunt, select and publish per category.
    pub async fn run(&self) -> RunReport {
        log::info!(
            "Starting run ({} mode, judge limited to top {} per category)",
            if self.dry_run { "dry-run" } else { "production" },
            self.batch_limit
        );

        let janitor = match self.sweep().await {
            Ok(report) => report,
            Err(e) => {
                log::error!("Janitor error: {}", e);
                JanitorReport::failed(e.to_string())
            }
        };

        let mut categories = Vec::with_capacity(self.categories.len());
        for category in &self.categories {
            categories.push(self.run_category(category).await);
        }

        log::info!("Run complete");
        let judge_usage = self.publisher.judge().usage();
        log::info!(
            "Judge used {} tokens ({} prompt, {} completion)",
            judge_usage.total(),
            judge_usage.prompt_tokens,
            judge_usage.completion_tokens
        );

        RunReport {
            dry_run: self.dry_run,
            janitor,
            categories,
            judge_usage,
        }
    }

    /// Hunt, select and publish one category.
    pub async fn run_category(&self, category: &CategoryConfig) -> CategoryReport {
        log::info!("Category: {}", category.name);

        let (candidates, hunt) = self.hunter.hunt(category).await;
        let mut report = CategoryReport {
            category: category.name.clone(),
            hunt,
            ..CategoryReport::default()
        };

        if candidates.is_empty() {
            log::info!("{}: no candidates found", category.name);
            return report;
        }

        let found = candidates.len();
        let selected = select(candidates, self.batch_limit);
        report.selected = selected.len();
        report.dropped_by_limit = found - selected.len();
        log::info!(
            "{}: {} candidates, judging top {}",
            category.name,
            found,
            selected.len()
        );

        report.publish = self.publisher.publish_all(&selected, self.dry_run).await;
        report
    }

    /// Hunt and select without calling the judge or the store.
    ///
    /// With `only`, restricts the scan to that category (case-insensitive).
    pub async fn scan(&self, only: Option<&str>) -> Result<Vec<ScanReport>> {
        let categories: Vec<&CategoryConfig> = match only {
            Some(name) => {
                let category = self
                    .categories
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(name))
                    .ok_or_else(|| GitnovaError::Config(format!("unknown category '{}'", name)))?;
                vec![category]
            }
            None => self.categories.iter().collect(),
        };

        let mut reports = Vec::with_capacity(categories.len());
        for category in categories {
            let (candidates, hunt) = self.hunter.hunt(category).await;
            reports.push(ScanReport {
                category: category.name.clone(),
                hunt,
                selected: select(candidates, self.batch_limit),
            });
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::classifier::MockZeroShotModel;
    use crate::domain::{Difficulty, IssueState, RawIssue};
    use crate::github::MockIssueSource;
    use crate::llm::{MockLlmClient, Usage};
    use crate::store::MemoryStore;

    fn issue(id: u64, title: &str) -> RawIssue {
        RawIssue {
            id,
            number: id,
            title: title.to_string(),
            body: None,
            html_url: format!("https://github.com/octo/demo/issues/{}", id),
            created_at: "2025-01-01T00:00:00Z".parse().unwrap(),
            state: IssueState::Open,
            pull_request: None,
        }
    }

    fn engine(llm: Arc<MockLlmClient>, store: Arc<MemoryStore>, dry_run: bool) -> Engine {
        let source = Arc::new(
            MockIssueSource::new()
                .with_issues("octo/demo", vec![issue(1, "Fix typo"), issue(2, "Fix typo again")])
                .with_issues("octo/empty", Vec::new()),
        );
        let model = Arc::new(MockZeroShotModel::new().with_fallback(Difficulty::Novice, 0.9));
        let services = Services {
            source,
            classifier: DifficultyClassifier::new(model),
            judge: Judge::new(llm).with_pacing(Duration::ZERO),
            store,
        };
        let categories = vec![
            CategoryConfig::new("Docs", &["octo/demo"]),
            CategoryConfig::new("Quiet", &["octo/empty"]),
        ];
        Engine::new(services, &PipelineConfig::default(), categories, dry_run)
    }

    #[tokio::test]
    async fn test_run_publishes_and_skips_empty_category() {
        let llm = Arc::new(
            MockLlmClient::answering(r#"{"verified_difficulty":"Novice","hint":"h"}"#).with_usage(Usage::new(50, 10)),
        );
        let store = Arc::new(MemoryStore::new());
        let engine = engine(llm.clone(), store.clone(), false);

        let report = engine.run().await;

        assert_eq!(report.judge_usage, Usage::new(100, 20));
        assert_eq!(report.categories.len(), 2);
        assert_eq!(report.categories[0].publish.published, 2);
        assert_eq!(report.categories[1].selected, 0);
        assert_eq!(report.categories[1].publish.attempted(), 0);
        assert_eq!(llm.call_count(), 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_scan_never_judges_or_writes() {
        let llm = Arc::new(MockLlmClient::answering("{}"));
        let store = Arc::new(MemoryStore::new());
        let engine = engine(llm.clone(), store.clone(), false);

        let reports = engine.scan(Some("docs")).await.unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].category, "Docs");
        assert_eq!(reports[0].selected.len(), 2);
        assert_eq!(llm.call_count(), 0);
        assert!(store.ops().is_empty());
    }

    #[tokio::test]
    async fn test_scan_unknown_category() {
        let engine = engine(Arc::new(MockLlmClient::new()), Arc::new(MemoryStore::new()), false);
        assert!(matches!(engine.scan(Some("Games")).await, Err(GitnovaError::Config(_))));
    }
}
