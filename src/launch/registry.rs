// src/launch/registry.rs
// Process-wide map from launch id to launch record

use super::LaunchRecord;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Shared launch registry.
///
/// Cloning is cheap and every clone sees the same records. Readers get
/// snapshots; only the launcher that created a record mutates it.
#[derive(Clone, Default)]
pub struct LaunchRegistry {
    records: Arc<RwLock<HashMap<String, LaunchRecord>>>,
    retention: Option<TimeDelta>,
}

impl LaunchRegistry {
    /// Registry that keeps every record for the life of the process
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that drops finished launches once `retention` has passed
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            records: Arc::default(),
            retention: Some(TimeDelta::from_std(retention).unwrap_or(TimeDelta::MAX)),
        }
    }

    pub async fn insert(&self, record: LaunchRecord) {
        let mut records = self.records.write().await;
        if let Some(retention) = self.retention {
            prune(&mut records, Utc::now(), retention);
        }
        records.insert(record.id.clone(), record);
    }

    /// Snapshot of a record
    pub async fn get(&self, id: &str) -> Option<LaunchRecord> {
        self.records.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Mutate a record in place; `None` if it does not exist
    pub(crate) async fn update<F, R>(&self, id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut LaunchRecord) -> R,
    {
        self.records.write().await.get_mut(id).map(f)
    }
}

fn prune(records: &mut HashMap<String, LaunchRecord>, now: DateTime<Utc>, retention: TimeDelta) {
    let before = records.len();
    records.retain(|_, record| match record.completed_at {
        Some(completed_at) => now.signed_duration_since(completed_at) < retention,
        None => true,
    });
    let pruned = before - records.len();
    if pruned > 0 {
        debug!(pruned, remaining = records.len(), "Pruned expired launches");
    }
}
