//! Persistence for published issues.
//!
//! This module provides the `IssueStore` abstraction over the `issues` table
//! and three backends:
//! - SupabaseStore: PostgREST over HTTP (production)
//! - SqliteStore: a local SQLite file
//! - MemoryStore: in-process map that records every operation (tests)
//!
//! Records are keyed by (repo_name, id). Upserts are idempotent: writing the
//! same key twice leaves one row holding the latest payload.
//!
//! The hosted table is created by `supabase/migrations/0001_issues.sql`;
//! `SqliteStore` creates the same columns itself.

mod memory;
mod sqlite;
mod supabase;

use async_trait::async_trait;

use crate::domain::{IssueKey, IssueStatus, PublishedIssueRecord};

pub use memory::{MemoryStore, StoreOp};
pub use sqlite::SqliteStore;
pub use supabase::{SUPABASE_KEY_ENV, SUPABASE_URL_ENV, SupabaseConfig, SupabaseStore};

/// Name of the table holding published issues.
pub const ISSUES_TABLE: &str = "issues";

/// A read of the published catalog: one status, optionally one category,
/// best score first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueQuery {
    pub status: IssueStatus,
    /// Exact category name; `None` reads every category
    pub category: Option<String>,
    pub limit: Option<usize>,
}

impl IssueQuery {
    pub fn published() -> Self {
        Self {
            status: IssueStatus::Published,
            category: None,
            limit: None,
        }
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, record: &PublishedIssueRecord) -> bool {
        record.status == self.status && self.category.as_ref().is_none_or(|c| *c == record.category)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Backend(String),
}

#[async_trait]
pub trait IssueStore: Send + Sync {
    /// All records with the given status.
    async fn list_by_status(&self, status: IssueStatus) -> Result<Vec<PublishedIssueRecord>, StoreError>;

    /// Records matching `query`, highest `ai_score` first, at most `query.limit`.
    async fn query(&self, query: &IssueQuery) -> Result<Vec<PublishedIssueRecord>, StoreError>;

    /// Delete the record under `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &IssueKey) -> Result<(), StoreError>;

    /// Insert or replace the record under its key.
    async fn upsert(&self, record: &PublishedIssueRecord) -> Result<(), StoreError>;

    /// Backend name, for logs
    fn backend(&self) -> &str;
}
