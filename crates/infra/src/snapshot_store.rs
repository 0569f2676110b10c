//! Snapshot checkpoints.
//!
//! A checkpoint is the serialized snapshot of an aggregate at a known stream
//! version. Loading starts from the latest checkpoint and replays only the tail,
//! so a checkpoint must always equal a replay of the first `version` events.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use appfold_core::AggregateId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub aggregate_id: AggregateId,
    pub aggregate_type: String,
    pub version: u64,
    pub state: JsonValue,
    pub taken_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotStoreError {
    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("snapshot store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load_latest(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Option<SnapshotRecord>, SnapshotStoreError>;

    async fn save(&self, record: SnapshotRecord) -> Result<(), SnapshotStoreError>;

    /// Drop every checkpoint of `aggregate_id`; the next load replays from scratch.
    async fn discard(&self, aggregate_id: AggregateId) -> Result<(), SnapshotStoreError>;
}

#[async_trait]
impl<S> SnapshotStore for Arc<S>
where
    S: SnapshotStore + ?Sized,
{
    async fn load_latest(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Option<SnapshotRecord>, SnapshotStoreError> {
        (**self).load_latest(aggregate_id).await
    }

    async fn save(&self, record: SnapshotRecord) -> Result<(), SnapshotStoreError> {
        (**self).save(record).await
    }

    async fn discard(&self, aggregate_id: AggregateId) -> Result<(), SnapshotStoreError> {
        (**self).discard(aggregate_id).await
    }
}

/// Keeps only the newest checkpoint per aggregate.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    records: RwLock<HashMap<AggregateId, SnapshotRecord>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn load_latest(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Option<SnapshotRecord>, SnapshotStoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| SnapshotStoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(records.get(&aggregate_id).cloned())
    }

    async fn save(&self, record: SnapshotRecord) -> Result<(), SnapshotStoreError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| SnapshotStoreError::Unavailable("lock poisoned".to_string()))?;

        // An older checkpoint never replaces a newer one.
        let newer = records
            .get(&record.aggregate_id)
            .is_none_or(|existing| existing.version < record.version);
        if newer {
            records.insert(record.aggregate_id, record);
        }
        Ok(())
    }

    async fn discard(&self, aggregate_id: AggregateId) -> Result<(), SnapshotStoreError> {
        self.records
            .write()
            .map_err(|_| SnapshotStoreError::Unavailable("lock poisoned".to_string()))?
            .remove(&aggregate_id);
        Ok(())
    }
}

/// Snapshot store that never holds anything: every load replays from scratch.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSnapshots;

#[async_trait]
impl SnapshotStore for NoSnapshots {
    async fn load_latest(
        &self,
        _aggregate_id: AggregateId,
    ) -> Result<Option<SnapshotRecord>, SnapshotStoreError> {
        Ok(None)
    }

    async fn save(&self, _record: SnapshotRecord) -> Result<(), SnapshotStoreError> {
        Ok(())
    }

    async fn discard(&self, _aggregate_id: AggregateId) -> Result<(), SnapshotStoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: AggregateId, version: u64) -> SnapshotRecord {
        SnapshotRecord {
            aggregate_id: id,
            aggregate_type: "apps.app".into(),
            version,
            state: json!({ "version": version }),
            taken_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn keeps_newest_checkpoint() {
        let store = InMemorySnapshotStore::new();
        let id = AggregateId::new();

        store.save(record(id, 10)).await.unwrap();
        store.save(record(id, 5)).await.unwrap();

        assert_eq!(store.load_latest(id).await.unwrap().unwrap().version, 10);

        store.save(record(id, 20)).await.unwrap();
        assert_eq!(store.load_latest(id).await.unwrap().unwrap().version, 20);
    }

    #[tokio::test]
    async fn discard_allows_older_checkpoint_again() {
        let store = InMemorySnapshotStore::new();
        let id = AggregateId::new();
        store.save(record(id, 10)).await.unwrap();

        store.discard(id).await.unwrap();
        assert_eq!(store.load_latest(id).await.unwrap(), None);

        store.save(record(id, 3)).await.unwrap();
        assert_eq!(store.load_latest(id).await.unwrap().unwrap().version, 3);
    }

    #[tokio::test]
    async fn unknown_aggregate_has_no_checkpoint() {
        let store = InMemorySnapshotStore::new();
        assert_eq!(store.load_latest(AggregateId::new()).await.unwrap(), None);
        assert_eq!(NoSnapshots.load_latest(AggregateId::new()).await.unwrap(), None);
    }
}
