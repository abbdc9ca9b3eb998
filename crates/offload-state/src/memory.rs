//! In-memory store implementations.
//!
//! Used by tests and by hosts that keep their own metadata in process.
//! Thread-safe and async-compatible via tokio's RwLock; insertion order of
//! media records doubles as the stable creation order the batch selector
//! relies on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use offload_core::models::{JobState, MediaItem, OffloadStatus};
use offload_core::OffloadError;

use crate::store::{MediaStore, OffloadStateStore, StateResult};

/// In-memory media metadata store.
#[derive(Clone, Default)]
pub struct InMemoryMediaStore {
    items: Arc<RwLock<Vec<MediaItem>>>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held (test helper).
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn get(&self, id: Uuid) -> StateResult<Option<MediaItem>> {
        let items = self.items.read().await;
        Ok(items.iter().find(|i| i.id == id).cloned())
    }

    async fn insert(&self, item: MediaItem) -> StateResult<()> {
        let mut items = self.items.write().await;
        if items.iter().any(|i| i.id == item.id) {
            return Err(OffloadError::InvalidInput(format!(
                "Media record {} already exists",
                item.id
            )));
        }
        items.push(item);
        Ok(())
    }

    async fn list_not_offloaded(&self, limit: usize) -> StateResult<Vec<MediaItem>> {
        let items = self.items.read().await;
        Ok(items
            .iter()
            .filter(|i| i.offload_status != OffloadStatus::Offloaded)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_not_offloaded(&self) -> StateResult<u64> {
        let items = self.items.read().await;
        Ok(items
            .iter()
            .filter(|i| i.offload_status != OffloadStatus::Offloaded)
            .count() as u64)
    }

    async fn mark_offloaded(
        &self,
        id: Uuid,
        remote_key: &str,
        remote_url: &str,
        variant_urls: &[(String, String)],
    ) -> StateResult<()> {
        let mut items = self.items.write().await;
        let item = items.iter_mut().find(|i| i.id == id).ok_or_else(|| {
            OffloadError::NotFound(format!("Media record {} not found", id))
        })?;

        item.offload_status = OffloadStatus::Offloaded;
        item.remote_key = Some(remote_key.to_string());
        item.remote_url = Some(remote_url.to_string());
        for (name, url) in variant_urls {
            if let Some(variant) = item.variants.iter_mut().find(|v| &v.name == name) {
                variant.url = Some(url.clone());
            }
        }
        item.updated_at = Utc::now();
        Ok(())
    }

    async fn set_status(&self, id: Uuid, status: OffloadStatus) -> StateResult<()> {
        let mut items = self.items.write().await;
        let item = items.iter_mut().find(|i| i.id == id).ok_or_else(|| {
            OffloadError::NotFound(format!("Media record {} not found", id))
        })?;
        item.offload_status = status;
        item.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StateResult<()> {
        let mut items = self.items.write().await;
        items.retain(|i| i.id != id);
        Ok(())
    }
}

/// In-memory engine state store.
#[derive(Clone, Default)]
pub struct InMemoryStateStore {
    job: Arc<RwLock<Option<JobState>>>,
    pending: Arc<RwLock<HashMap<Uuid, DateTime<Utc>>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OffloadStateStore for InMemoryStateStore {
    async fn load_job(&self) -> StateResult<Option<JobState>> {
        Ok(self.job.read().await.clone())
    }

    async fn save_job(&self, state: &JobState) -> StateResult<()> {
        *self.job.write().await = Some(state.clone());
        Ok(())
    }

    async fn clear_job(&self) -> StateResult<()> {
        *self.job.write().await = None;
        Ok(())
    }

    async fn pending_upsert(&self, id: Uuid, deferred_at: DateTime<Utc>) -> StateResult<()> {
        self.pending.write().await.insert(id, deferred_at);
        Ok(())
    }

    async fn pending_get(&self, id: Uuid) -> StateResult<Option<DateTime<Utc>>> {
        Ok(self.pending.read().await.get(&id).copied())
    }

    async fn pending_remove(&self, id: Uuid) -> StateResult<bool> {
        Ok(self.pending.write().await.remove(&id).is_some())
    }
}
