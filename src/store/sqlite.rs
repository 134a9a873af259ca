//! SQLite-backed issue store.
//!
//! Mirrors the hosted `issues` table in a local file so the pipeline can run
//! without a Supabase project. The connection is wrapped in a mutex; every
//! statement is short, so holding it across a call is fine.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};

use super::{IssueQuery, IssueStore, StoreError};
use crate::domain::{Difficulty, IssueKey, IssueStatus, PublishedIssueRecord};

pub struct SqliteStore {
    db: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Backend(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        let db = Connection::open(path)?;
        Self::init_schema(&db)?;
        log::debug!("Opened SQLite store at {}", path.display());
        Ok(Self { db: Mutex::new(db) })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let db = Connection::open_in_memory()?;
        Self::init_schema(&db)?;
        Ok(Self { db: Mutex::new(db) })
    }

    fn init_schema(db: &Connection) -> Result<(), StoreError> {
        db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS issues (
                id INTEGER NOT NULL,
                repo_name TEXT NOT NULL,
                number INTEGER,
                title TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                ai_score REAL NOT NULL,
                ai_hint TEXT NOT NULL,
                category TEXT NOT NULL,
                url TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (repo_name, id)
            );

            CREATE INDEX IF NOT EXISTS idx_issues_status ON issues(status);
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.db.lock().map_err(|e| StoreError::Backend(format!("SQLite lock poisoned: {}", e)))
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self.conn()?.query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }
}

fn to_sql_int(value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::Backend(format!("{} does not fit in an INTEGER column", value)))
}

/// Raw column values of one row, converted after the statement finishes.
struct RowData {
    id: i64,
    repo_name: String,
    number: Option<i64>,
    title: String,
    difficulty: String,
    ai_score: f64,
    ai_hint: String,
    category: String,
    url: String,
    created_at: String,
}

impl RowData {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            repo_name: row.get(1)?,
            number: row.get(2)?,
            title: row.get(3)?,
            difficulty: row.get(4)?,
            ai_score: row.get(5)?,
            ai_hint: row.get(6)?,
            category: row.get(7)?,
            url: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn into_record(self, status: IssueStatus) -> Result<PublishedIssueRecord, StoreError> {
        let difficulty: Difficulty = self.difficulty.parse().map_err(StoreError::Backend)?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| StoreError::Backend(format!("Bad created_at {:?}: {}", self.created_at, e)))?
            .with_timezone(&Utc);

        Ok(PublishedIssueRecord {
            id: self.id as u64,
            number: self.number.map(|n| n as u64),
            title: self.title,
            repo_name: self.repo_name,
            difficulty,
            ai_score: self.ai_score,
            ai_hint: self.ai_hint,
            category: self.category,
            url: self.url,
            status,
            created_at,
        })
    }
}

fn into_records(rows: Vec<RowData>, status: IssueStatus) -> Vec<PublishedIssueRecord> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match row.into_record(status) {
            Ok(record) => records.push(record),
            Err(e) => log::warn!("Skipping unreadable row: {}", e),
        }
    }
    records
}

#[async_trait]
impl IssueStore for SqliteStore {
    async fn list_by_status(&self, status: IssueStatus) -> Result<Vec<PublishedIssueRecord>, StoreError> {
        let rows = {
            let db = self.conn()?;
            let mut stmt = db.prepare(
                "SELECT id, repo_name, number, title, difficulty, ai_score, ai_hint, category, url, created_at
                 FROM issues WHERE status = ?1 ORDER BY repo_name, id",
            )?;
            stmt.query_map(params![status.as_str()], RowData::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(into_records(rows, status))
    }

    async fn query(&self, query: &IssueQuery) -> Result<Vec<PublishedIssueRecord>, StoreError> {
        // LIMIT -1 is unbounded in SQLite
        let limit = query.limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        let rows = {
            let db = self.conn()?;
            let mut stmt = db.prepare(
                "SELECT id, repo_name, number, title, difficulty, ai_score, ai_hint, category, url, created_at
                 FROM issues
                 WHERE status = ?1 AND (?2 IS NULL OR category = ?2)
                 ORDER BY ai_score DESC, repo_name, id
                 LIMIT ?3",
            )?;
            stmt.query_map(
                params![query.status.as_str(), query.category.as_deref(), limit],
                RowData::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(into_records(rows, query.status))
    }

    async fn delete(&self, key: &IssueKey) -> Result<(), StoreError> {
        let id = to_sql_int(key.id)?;
        self.conn()?.execute(
            "DELETE FROM issues WHERE repo_name = ?1 AND id = ?2",
            params![key.repo_name, id],
        )?;
        Ok(())
    }

    async fn upsert(&self, record: &PublishedIssueRecord) -> Result<(), StoreError> {
        let id = to_sql_int(record.id)?;
        let number = record.number.map(to_sql_int).transpose()?;

        self.conn()?.execute(
            r#"
            INSERT INTO issues
                (id, repo_name, number, title, difficulty, ai_score, ai_hint, category, url, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(repo_name, id) DO UPDATE SET
                number = excluded.number,
                title = excluded.title,
                difficulty = excluded.difficulty,
                ai_score = excluded.ai_score,
                ai_hint = excluded.ai_hint,
                category = excluded.category,
                url = excluded.url,
                status = excluded.status,
                created_at = excluded.created_at
            "#,
            params![
                id,
                record.repo_name,
                number,
                record.title,
                record.difficulty.as_str(),
                record.ai_score,
                record.ai_hint,
                record.category,
                record.url,
                record.status.as_str(),
                record.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn backend(&self) -> &str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(repo: &str, id: u64, hint: &str) -> PublishedIssueRecord {
        PublishedIssueRecord {
            id,
            number: Some(id % 1000),
            title: format!("Issue {}", id),
            repo_name: repo.to_string(),
            difficulty: Difficulty::Apprentice,
            ai_score: 0.55,
            ai_hint: hint.to_string(),
            category: "Python & AI".to_string(),
            url: format!("https://github.com/{}/issues/{}", repo, id % 1000),
            status: IssueStatus::Published,
            created_at: "2025-02-03T04:05:06Z".parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_list() {
        let store = SqliteStore::open_in_memory().unwrap();
        let original = record("octo/demo", 1001, "first");
        store.upsert(&original).await.unwrap();

        let listed = store.list_by_status(IssueStatus::Published).await.unwrap();
        assert_eq!(listed, vec![original]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_key() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.upsert(&record("octo/demo", 1001, "first")).await.unwrap();
        store.upsert(&record("octo/demo", 1001, "second")).await.unwrap();

        assert_eq!(store.count().unwrap(), 1);
        let listed = store.list_by_status(IssueStatus::Published).await.unwrap();
        assert_eq!(listed[0].ai_hint, "second");
    }

    #[tokio::test]
    async fn test_key_includes_repo() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.upsert(&record("octo/a", 1001, "a")).await.unwrap();
        store.upsert(&record("octo/b", 1001, "b")).await.unwrap();
        assert_eq!(store.count().unwrap(), 2);

        store.delete(&record("octo/a", 1001, "").key()).await.unwrap();
        let listed = store.list_by_status(IssueStatus::Published).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].repo_name, "octo/b");
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let store = SqliteStore::open_in_memory().unwrap();
        let key = IssueKey {
            repo_name: "octo/demo".to_string(),
            id: 42,
        };
        assert!(store.delete(&key).await.is_ok());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("gitnova.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.upsert(&record("octo/demo", 7, "kept")).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let listed = store.list_by_status(IssueStatus::Published).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].ai_hint, "kept");
    }

    #[tokio::test]
    async fn test_query_by_category_best_first() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut low = record("octo/a", 1, "low");
        low.ai_score = 0.35;
        let mut high = record("octo/b", 2, "high");
        high.ai_score = 0.8;
        let mut elsewhere = record("octo/c", 3, "elsewhere");
        elsewhere.category = "DevOps".to_string();
        for r in [&low, &high, &elsewhere] {
            store.upsert(r).await.unwrap();
        }

        let listed = store
            .query(&IssueQuery::published().in_category("Python & AI"))
            .await
            .unwrap();
        let hints: Vec<&str> = listed.iter().map(|r| r.ai_hint.as_str()).collect();
        assert_eq!(hints, vec!["high", "low"]);

        let limited = store.query(&IssueQuery::published().with_limit(2)).await.unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].ai_hint, "high");

        let none = store.query(&IssueQuery::published().in_category("Mobile")).await.unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_columns_match_record_fields() {
        let store = SqliteStore::open_in_memory().unwrap();
        let db = store.conn().unwrap();
        let mut stmt = db.prepare("SELECT name FROM pragma_table_info('issues')").unwrap();
        let mut columns: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        columns.sort();

        let json = serde_json::to_value(record("octo/demo", 1, "h")).unwrap();
        let mut fields: Vec<String> = json.as_object().unwrap().keys().cloned().collect();
        fields.sort();

        assert_eq!(columns, fields);
    }

    #[tokio::test]
    async fn test_rejects_oversized_id() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result = store.upsert(&record("octo/demo", u64::MAX, "x")).await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
    }
}
