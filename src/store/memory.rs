//! In-memory store that records every operation.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{IssueQuery, IssueStore, StoreError};
use crate::domain::{IssueKey, IssueStatus, PublishedIssueRecord};

/// One call made against a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Select(IssueStatus),
    Query(IssueQuery),
    Delete(IssueKey),
    Upsert(IssueKey),
}

impl StoreOp {
    pub fn is_write(&self) -> bool {
        !matches!(self, StoreOp::Select(_) | StoreOp::Query(_))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<IssueKey, PublishedIssueRecord>>,
    ops: Mutex<Vec<StoreOp>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed records without logging an operation.
    pub fn with_records(records: impl IntoIterator<Item = PublishedIssueRecord>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.records.lock() {
            map.extend(records.into_iter().map(|r| (r.key(), r)));
        }
        store
    }

    pub fn get(&self, key: &IssueKey) -> Option<PublishedIssueRecord> {
        self.records.lock().ok()?.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every operation so far, in order.
    pub fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().map(|o| o.clone()).unwrap_or_default()
    }

    /// Only the deletes and upserts.
    pub fn writes(&self) -> Vec<StoreOp> {
        self.ops().into_iter().filter(StoreOp::is_write).collect()
    }

    fn log(&self, op: StoreOp) -> Result<(), StoreError> {
        self.ops
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .push(op);
        Ok(())
    }
}

#[async_trait]
impl IssueStore for MemoryStore {
    async fn list_by_status(&self, status: IssueStatus) -> Result<Vec<PublishedIssueRecord>, StoreError> {
        self.log(StoreOp::Select(status))?;
        let records = self.records.lock().map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(records.values().filter(|r| r.status == status).cloned().collect())
    }

    async fn query(&self, query: &IssueQuery) -> Result<Vec<PublishedIssueRecord>, StoreError> {
        self.log(StoreOp::Query(query.clone()))?;
        let records = self.records.lock().map_err(|e| StoreError::Backend(e.to_string()))?;
        let mut matching: Vec<PublishedIssueRecord> = records.values().filter(|r| query.matches(r)).cloned().collect();
        matching.sort_by(|a, b| b.ai_score.total_cmp(&a.ai_score));
        if let Some(limit) = query.limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }

    async fn delete(&self, key: &IssueKey) -> Result<(), StoreError> {
        self.log(StoreOp::Delete(key.clone()))?;
        self.records
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .remove(key);
        Ok(())
    }

    async fn upsert(&self, record: &PublishedIssueRecord) -> Result<(), StoreError> {
        self.log(StoreOp::Upsert(record.key()))?;
        self.records
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .insert(record.key(), record.clone());
        Ok(())
    }

    fn backend(&self) -> &str {
        "memory"
    }
}
