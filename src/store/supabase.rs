//! Supabase (PostgREST) issue store.
//!
//! Expects the table from `supabase/migrations/0001_issues.sql`: upserts
//! resolve conflicts on the `(repo_name, id)` unique index.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;

use super::{ISSUES_TABLE, IssueQuery, IssueStore, StoreError};
use crate::domain::{IssueKey, IssueStatus, PublishedIssueRecord};

/// Environment variable holding the project URL
pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";

/// Environment variable holding the service key
pub const SUPABASE_KEY_ENV: &str = "SUPABASE_KEY";

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    pub table: String,
    pub timeout: Duration,
}

impl SupabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            table: ISSUES_TABLE.to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct SupabaseStore {
    client: Client,
    key: String,
    config: SupabaseConfig,
}

impl SupabaseStore {
    pub fn new(config: SupabaseConfig, key: impl Into<String>) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            key: key.into(),
            config,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.url.trim_end_matches('/'), self.config.table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("apikey", &self.key).bearer_auth(&self.key)
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
        Err(StoreError::Status {
            status: status.as_u16(),
            message,
        })
    }

    /// Decode a row list, skipping rows that do not match the record shape.
    fn parse_rows(body: &str) -> Result<Vec<PublishedIssueRecord>, StoreError> {
        let value: Value = serde_json::from_str(body)?;
        let Value::Array(rows) = value else {
            return Err(StoreError::Backend("expected a list of rows".to_string()));
        };

        Ok(rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<PublishedIssueRecord>(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Skipping unreadable row: {}", e);
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl IssueStore for SupabaseStore {
    async fn list_by_status(&self, status: IssueStatus) -> Result<Vec<PublishedIssueRecord>, StoreError> {
        let request = self.client.get(self.table_url()).query(&[
            ("select", "*".to_string()),
            ("status", format!("eq.{}", status.as_str())),
        ]);
        let response = Self::check(self.authorize(request).send().await?).await?;
        let body = response.text().await?;
        Self::parse_rows(&body)
    }

    async fn query(&self, query: &IssueQuery) -> Result<Vec<PublishedIssueRecord>, StoreError> {
        let mut params = vec![
            ("select", "*".to_string()),
            ("status", format!("eq.{}", query.status.as_str())),
            ("order", "ai_score.desc".to_string()),
        ];
        if let Some(category) = &query.category {
            params.push(("category", format!("eq.{}", category)));
        }
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }

        let request = self.client.get(self.table_url()).query(&params);
        let response = Self::check(self.authorize(request).send().await?).await?;
        let body = response.text().await?;
        Self::parse_rows(&body)
    }

    async fn delete(&self, key: &IssueKey) -> Result<(), StoreError> {
        let request = self.client.delete(self.table_url()).query(&[
            ("repo_name", format!("eq.{}", key.repo_name)),
            ("id", format!("eq.{}", key.id)),
        ]);
        Self::check(self.authorize(request).send().await?).await?;
        Ok(())
    }

    async fn upsert(&self, record: &PublishedIssueRecord) -> Result<(), StoreError> {
        let request = self
            .client
            .post(self.table_url())
            .query(&[("on_conflict", "repo_name,id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[record]);
        Self::check(self.authorize(request).send().await?).await?;
        Ok(())
    }

    fn backend(&self) -> &str {
        "supabase"
    }
}

impl std::fmt::Debug for SupabaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseStore")
            .field("url", &self.config.url)
            .field("table", &self.config.table)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url() {
        let store = SupabaseStore::new(SupabaseConfig::new("https://xyz.supabase.co/"), "key").unwrap();
        assert_eq!(store.table_url(), "https://xyz.supabase.co/rest/v1/issues");

        let store = SupabaseStore::new(SupabaseConfig::new("http://localhost").with_table("staging"), "key").unwrap();
        assert_eq!(store.table_url(), "http://localhost/rest/v1/staging");
    }

    #[test]
    fn test_parse_rows_skips_bad_rows() {
        let body = r#"[
            {"id": 1, "number": 4, "title": "t", "repo_name": "o/r", "difficulty": "Novice",
             "ai_score": 0.5, "ai_hint": "h", "category": "Frontend",
             "url": "https://github.com/o/r/issues/4", "status": "PUBLISHED",
             "created_at": "2025-01-01T00:00:00+00:00"},
            {"id": 2, "title": "missing fields"}
        ]"#;
        let rows = SupabaseStore::parse_rows(body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].number, Some(4));
    }

    #[test]
    fn test_parse_rows_without_number_column() {
        let body = r#"[{"id": 9, "title": "t", "repo_name": "o/r", "difficulty": "Contributor",
             "ai_score": 0.9, "ai_hint": "h", "category": "Systems",
             "url": "https://github.com/o/r/issues/12", "status": "PUBLISHED",
             "created_at": "2025-01-01T00:00:00Z"}]"#;
        let rows = SupabaseStore::parse_rows(body).unwrap();
        assert_eq!(rows[0].number, None);
    }

    #[test]
    fn test_parse_rows_rejects_object() {
        assert!(SupabaseStore::parse_rows(r#"{"message":"denied"}"#).is_err());
    }

    const MIGRATION: &str = include_str!("../../supabase/migrations/0001_issues.sql");

    /// Column names declared in the migration's CREATE TABLE.
    fn migration_columns() -> Vec<String> {
        let start = MIGRATION.find("CREATE TABLE").unwrap();
        let body = &MIGRATION[start..];
        let open = body.find('(').unwrap();
        let close = body.find(");").unwrap();
        let mut columns: Vec<String> = body[open + 1..close]
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_string)
            .collect();
        columns.sort();
        columns
    }

    #[test]
    fn test_migration_matches_record_fields() {
        let record = PublishedIssueRecord {
            id: 1,
            number: Some(1),
            title: "t".to_string(),
            repo_name: "o/r".to_string(),
            difficulty: crate::domain::Difficulty::Novice,
            ai_score: 0.5,
            ai_hint: "h".to_string(),
            category: "Frontend".to_string(),
            url: "https://github.com/o/r/issues/1".to_string(),
            status: IssueStatus::Published,
            created_at: "2025-01-01T00:00:00Z".parse().unwrap(),
        };
        let json = serde_json::to_value(&record).unwrap();
        let mut fields: Vec<String> = json.as_object().unwrap().keys().cloned().collect();
        fields.sort();

        assert_eq!(migration_columns(), fields);
    }

    #[test]
    fn test_migration_has_upsert_conflict_target() {
        assert!(MIGRATION.contains("UNIQUE INDEX IF NOT EXISTS issues_repo_name_id_key ON issues (repo_name, id)"));
        assert!(MIGRATION.contains("ADD COLUMN IF NOT EXISTS number bigint"));
        assert!(MIGRATION.contains("ON issues (status)"));
    }

    #[test]
    fn test_debug_hides_key() {
        let store = SupabaseStore::new(SupabaseConfig::new("https://x.supabase.co"), "service-secret").unwrap();
        assert!(!format!("{:?}", store).contains("service-secret"));
    }
}
