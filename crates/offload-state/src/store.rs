//! Durable-state capability traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use offload_core::models::{JobState, MediaItem, OffloadStatus};
use offload_core::OffloadError;

/// Result type for state operations
pub type StateResult<T> = Result<T, OffloadError>;

/// The host application's media metadata store.
///
/// The engine reads records, flips offload status, and records remote
/// references through this trait; it never owns the schema behind it.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Fetch a media record by id.
    async fn get(&self, id: Uuid) -> StateResult<Option<MediaItem>>;

    /// Create a media record (host ingest path; also used by tests).
    async fn insert(&self, item: MediaItem) -> StateResult<()>;

    /// Items not yet offloaded, in stable creation order, up to `limit`.
    ///
    /// "Not yet offloaded" includes records whose last attempt failed; they
    /// stay eligible for future batches.
    async fn list_not_offloaded(&self, limit: usize) -> StateResult<Vec<MediaItem>>;

    /// Live count of items not yet offloaded.
    async fn count_not_offloaded(&self) -> StateResult<u64>;

    /// Persist a successful offload: remote key and URL, rewritten rendition
    /// URLs (by variant name), and the status flip to offloaded.
    async fn mark_offloaded(
        &self,
        id: Uuid,
        remote_key: &str,
        remote_url: &str,
        variant_urls: &[(String, String)],
    ) -> StateResult<()>;

    /// Set the offload status of a record.
    async fn set_status(&self, id: Uuid, status: OffloadStatus) -> StateResult<()>;

    /// Delete a media record entirely.
    async fn delete(&self, id: Uuid) -> StateResult<()>;
}

/// The engine's own durable records: the singleton job-progress row and the
/// pending set of deferred items.
#[async_trait]
pub trait OffloadStateStore: Send + Sync {
    /// Load the job-progress record, if a job has state.
    async fn load_job(&self) -> StateResult<Option<JobState>>;

    /// Persist the job-progress record (upsert).
    async fn save_job(&self, state: &JobState) -> StateResult<()>;

    /// Remove the job-progress record.
    async fn clear_job(&self) -> StateResult<()>;

    /// Insert or refresh a pending entry for a deferred item.
    async fn pending_upsert(&self, id: Uuid, deferred_at: DateTime<Utc>) -> StateResult<()>;

    /// Deferral timestamp for an item, if it is pending.
    async fn pending_get(&self, id: Uuid) -> StateResult<Option<DateTime<Utc>>>;

    /// Remove a pending entry; returns whether one existed.
    async fn pending_remove(&self, id: Uuid) -> StateResult<bool>;
}
