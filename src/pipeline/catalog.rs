//! Catalog: the read side of the published issues.
//!
//! Lists published issues for one category, best score first. An empty
//! category falls back to a short list of published issues from any category
//! so a reader always has something to look at.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::PublishedIssueRecord;
use crate::store::{IssueQuery, IssueStore, StoreError};

/// How many issues the fallback listing shows.
pub const FALLBACK_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    /// The category asked for, if any
    pub category: Option<String>,
    pub records: Vec<PublishedIssueRecord>,
    /// The category was empty and `records` come from any category
    pub fell_back: bool,
}

pub struct Catalog {
    store: Arc<dyn IssueStore>,
}

impl Catalog {
    pub fn new(store: Arc<dyn IssueStore>) -> Self {
        Self { store }
    }

    /// Published issues in `category` (all categories when `None`).
    pub async fn browse(&self, category: Option<&str>, limit: Option<usize>) -> Result<Listing, StoreError> {
        let mut query = IssueQuery::published();
        if let Some(name) = category {
            query = query.in_category(name);
        }
        if let Some(limit) = limit {
            query = query.with_limit(limit);
        }

        let records = self.store.query(&query).await?;
        log::info!(
            "Catalog: {} published issues in {}",
            records.len(),
            category.unwrap_or("all categories")
        );

        let Some(name) = category.filter(|_| records.is_empty()) else {
            return Ok(Listing {
                category: category.map(str::to_string),
                records,
                fell_back: false,
            });
        };

        log::warn!("Category {} is empty, listing any published issues", name);
        let fallback_limit = limit.map_or(FALLBACK_LIMIT, |l| l.min(FALLBACK_LIMIT));
        let records = self
            .store
            .query(&IssueQuery::published().with_limit(fallback_limit))
            .await?;

        Ok(Listing {
            category: Some(name.to_string()),
            records,
            fell_back: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Difficulty, IssueStatus};
    use crate::store::{MemoryStore, StoreOp};

    fn record(id: u64, category: &str, score: f64) -> PublishedIssueRecord {
        PublishedIssueRecord {
            id,
            number: Some(id),
            title: format!("Issue {}", id),
            repo_name: "octo/demo".to_string(),
            difficulty: Difficulty::Novice,
            ai_score: score,
            ai_hint: "hint".to_string(),
            category: category.to_string(),
            url: format!("https://github.com/octo/demo/issues/{}", id),
            status: IssueStatus::Published,
            created_at: "2025-01-01T00:00:00Z".parse().unwrap(),
        }
    }

    fn ids(listing: &Listing) -> Vec<u64> {
        listing.records.iter().map(|r| r.id).collect()
    }

    #[tokio::test]
    async fn test_browse_category() {
        let store = Arc::new(MemoryStore::with_records([
            record(1, "Frontend", 0.4),
            record(2, "Frontend", 0.9),
            record(3, "DevOps", 0.7),
        ]));
        let listing = Catalog::new(store.clone()).browse(Some("Frontend"), None).await.unwrap();

        assert_eq!(ids(&listing), vec![2, 1]);
        assert!(!listing.fell_back);
        assert_eq!(listing.category.as_deref(), Some("Frontend"));
        assert_eq!(store.ops().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_category_falls_back_to_any_published() {
        let store = Arc::new(MemoryStore::with_records((1..=12).map(|i| record(i, "DevOps", i as f64 / 20.0))));
        let listing = Catalog::new(store.clone()).browse(Some("Mobile"), None).await.unwrap();

        assert!(listing.fell_back);
        assert_eq!(listing.records.len(), FALLBACK_LIMIT);
        assert_eq!(listing.records[0].id, 12);
        assert_eq!(
            store.ops(),
            vec![
                StoreOp::Query(IssueQuery::published().in_category("Mobile")),
                StoreOp::Query(IssueQuery::published().with_limit(FALLBACK_LIMIT)),
            ]
        );
    }

    #[tokio::test]
    async fn test_all_categories_never_fall_back() {
        let store = Arc::new(MemoryStore::new());
        let listing = Catalog::new(store.clone()).browse(None, Some(5)).await.unwrap();

        assert!(listing.records.is_empty());
        assert!(!listing.fell_back);
        assert_eq!(store.ops().len(), 1);
    }

    #[tokio::test]
    async fn test_limit_applies() {
        let store = Arc::new(MemoryStore::with_records((1..=4).map(|i| record(i, "Frontend", 0.5))));
        let listing = Catalog::new(store).browse(Some("Frontend"), Some(3)).await.unwrap();
        assert_eq!(listing.records.len(), 3);
    }
}
