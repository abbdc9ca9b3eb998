//! Test doubles and seeding helpers shared by the engine integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use offload_core::models::{JobStatus, MediaItem, MediaType, MediaVariant};
use offload_core::{OffloadConfig, StorageBackend};
use offload_engine::Offloader;
use offload_state::{InMemoryMediaStore, InMemoryStateStore, MediaStore, OffloadStateStore};
use offload_storage::{keys, Storage, StorageError, StorageResult};

/// In-memory storage double. Records every uploaded object and can inject
/// per-filename failures or flip the durable job status mid-run to simulate
/// a concurrent cancel request.
#[derive(Default)]
pub struct MockStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    upload_order: Mutex<Vec<String>>,
    fail_filenames: HashSet<String>,
    originals_uploaded: AtomicUsize,
    cancel_on_upload: Option<(usize, Arc<dyn OffloadStateStore>)>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail uploads of the given original filenames.
    pub fn with_failures(mut self, filenames: &[&str]) -> Self {
        self.fail_filenames = filenames.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Write a cancellation into the job state while original upload number
    /// `n` (1-based) is in flight.
    pub fn with_cancel_on_upload(mut self, n: usize, state: Arc<dyn OffloadStateStore>) -> Self {
        self.cancel_on_upload = Some((n, state));
        self
    }

    /// Number of original files uploaded (renditions not counted).
    pub fn original_upload_count(&self) -> usize {
        self.originals_uploaded.load(Ordering::SeqCst)
    }

    /// Every stored key, in upload order (originals and renditions).
    pub async fn recorded_keys(&self) -> Vec<String> {
        self.upload_order.lock().await.clone()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.lock().await.contains_key(key)
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn upload(
        &self,
        filename: &str,
        _content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<(String, String)> {
        let n = self.originals_uploaded.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((at, state)) = &self.cancel_on_upload {
            if n == *at {
                if let Ok(Some(mut job)) = state.load_job().await {
                    job.status = JobStatus::Cancelled;
                    let _ = state.save_job(&job).await;
                }
            }
        }
        if self.fail_filenames.contains(filename) {
            return Err(StorageError::UploadFailed(format!(
                "injected failure for {}",
                filename
            )));
        }
        let key = keys::media_key(filename);
        self.objects.lock().await.insert(key.clone(), data);
        self.upload_order.lock().await.push(key.clone());
        let url = format!("http://remote.test/{}", key);
        Ok((key, url))
    }

    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        self.objects
            .lock()
            .await
            .insert(storage_key.to_string(), data);
        self.upload_order.lock().await.push(storage_key.to_string());
        Ok(format!("http://remote.test/{}", storage_key))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.objects.lock().await.remove(storage_key);
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().await.contains_key(storage_key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Storage double whose uploads block until a permit is released. Used to
/// hold a batch in flight while asserting on concurrent behavior.
pub struct BlockingStorage {
    pub permits: Arc<tokio::sync::Semaphore>,
    inner: MockStorage,
}

impl BlockingStorage {
    pub fn new() -> Self {
        Self {
            permits: Arc::new(tokio::sync::Semaphore::new(0)),
            inner: MockStorage::new(),
        }
    }
}

#[async_trait]
impl Storage for BlockingStorage {
    async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<(String, String)> {
        self.permits
            .acquire()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .forget();
        self.inner.upload(filename, content_type, data).await
    }

    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        self.inner
            .upload_with_key(storage_key, data, content_type)
            .await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.inner.delete(storage_key).await
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.inner.exists(storage_key).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Wire an engine over in-memory stores and the given storage double.
pub fn engine_with(
    storage: Arc<dyn Storage>,
) -> (Arc<InMemoryMediaStore>, Arc<InMemoryStateStore>, Offloader) {
    let media = Arc::new(InMemoryMediaStore::new());
    let state = Arc::new(InMemoryStateStore::new());
    let offloader = Offloader::new(
        media.clone(),
        state.clone(),
        storage,
        &OffloadConfig::default(),
    );
    (media, state, offloader)
}

fn extension(media_type: MediaType) -> (&'static str, &'static str) {
    match media_type {
        MediaType::Image => ("jpg", "image/jpeg"),
        MediaType::Video => ("mp4", "video/mp4"),
        MediaType::Audio => ("mp3", "audio/mpeg"),
        MediaType::Document => ("pdf", "application/pdf"),
    }
}

/// Create `count` media records backed by real files under `dir`.
pub async fn seed_items(
    media: &InMemoryMediaStore,
    dir: &Path,
    count: usize,
    media_type: MediaType,
) -> Vec<Uuid> {
    let (ext, content_type) = extension(media_type);
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let filename = format!("file-{:04}.{}", i, ext);
        let path = dir.join(&filename);
        tokio::fs::write(&path, format!("payload {}", i))
            .await
            .unwrap();
        let item = MediaItem::new(
            filename,
            path.to_string_lossy(),
            content_type,
            media_type,
        );
        ids.push(item.id);
        media.insert(item).await.unwrap();
    }
    ids
}

/// Create one media record with rendition files alongside the original.
pub async fn seed_item_with_variants(
    media: &InMemoryMediaStore,
    dir: &Path,
    filename: &str,
    variants: &[(&str, &str)],
) -> Uuid {
    let path = dir.join(filename);
    tokio::fs::write(&path, b"original payload").await.unwrap();

    let mut media_variants = Vec::with_capacity(variants.len());
    for (name, variant_filename) in variants {
        tokio::fs::write(dir.join(variant_filename), b"rendition payload")
            .await
            .unwrap();
        media_variants.push(MediaVariant::new(*name, *variant_filename));
    }

    let item = MediaItem::new(
        filename,
        path.to_string_lossy(),
        "image/jpeg",
        MediaType::Image,
    )
    .with_variants(media_variants);
    let id = item.id;
    media.insert(item).await.unwrap();
    id
}
