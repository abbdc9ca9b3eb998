//! Per-item offload.
//!
//! [`MediaUploader`] moves one item (original file plus derived renditions)
//! into remote storage and updates the host's record. Collaborator failures
//! never escape as errors from the transfer itself — they surface as
//! [`UploadOutcome::Failed`] so a batch can count them and move on.

use std::path::Path;
use std::sync::Arc;

use offload_core::models::{MediaItem, UploadOutcome};
use offload_core::OffloadError;
use offload_state::MediaStore;
use offload_storage::{keys, Storage};

use crate::admission::{Admission, AdmissionGate};

pub struct MediaUploader {
    media: Arc<dyn MediaStore>,
    gate: Arc<AdmissionGate>,
    storage: Arc<dyn Storage>,
}

impl MediaUploader {
    pub fn new(
        media: Arc<dyn MediaStore>,
        gate: Arc<AdmissionGate>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            media,
            gate,
            storage,
        }
    }

    /// Admission-checked offload of a single item.
    ///
    /// Idempotent: an already-offloaded item short-circuits to
    /// [`UploadOutcome::AlreadyOffloaded`]. The eligibility chain is
    /// consulted first; a deferral records the pending entry and leaves the
    /// item local.
    pub async fn upload(&self, item: &MediaItem) -> Result<UploadOutcome, OffloadError> {
        let Some(current) = self.media.get(item.id).await? else {
            tracing::warn!(item_id = %item.id, "Media record vanished before upload");
            return Ok(UploadOutcome::Failed);
        };
        if current.is_offloaded() {
            return Ok(UploadOutcome::AlreadyOffloaded);
        }
        match self.gate.evaluate(&current).await? {
            Admission::Defer => Ok(UploadOutcome::Deferred),
            Admission::Admit => self.transfer(&current).await,
        }
    }

    /// Offload bypassing the eligibility chain. Used by the
    /// gating-completed signal path and the grace-window rescue, where the
    /// deferral has already been resolved.
    pub async fn upload_admitted(&self, item: &MediaItem) -> Result<UploadOutcome, OffloadError> {
        let Some(current) = self.media.get(item.id).await? else {
            tracing::warn!(item_id = %item.id, "Media record vanished before upload");
            return Ok(UploadOutcome::Failed);
        };
        if current.is_offloaded() {
            return Ok(UploadOutcome::AlreadyOffloaded);
        }
        self.transfer(&current).await
    }

    async fn transfer(&self, item: &MediaItem) -> Result<UploadOutcome, OffloadError> {
        let data = match tokio::fs::read(&item.local_path).await {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(
                    item_id = %item.id,
                    path = %item.local_path,
                    error = %e,
                    "Failed to read local media file"
                );
                return Ok(UploadOutcome::Failed);
            }
        };

        let (remote_key, remote_url) = match self
            .storage
            .upload(&item.filename, &item.content_type, data)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(item_id = %item.id, error = %e, "Remote upload failed");
                return Ok(UploadOutcome::Failed);
            }
        };

        // derived renditions live next to the original on disk
        let local_dir = Path::new(&item.local_path)
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default();

        let mut variant_urls = Vec::with_capacity(item.variants.len());
        for variant in &item.variants {
            let variant_path = local_dir.join(&variant.filename);
            let variant_data = match tokio::fs::read(&variant_path).await {
                Ok(data) => data,
                Err(e) => {
                    tracing::error!(
                        item_id = %item.id,
                        variant = %variant.name,
                        path = %variant_path.display(),
                        error = %e,
                        "Failed to read rendition file"
                    );
                    return self.abort_transfer(item, &remote_key).await;
                }
            };
            let variant_key = keys::variant_key(&variant.filename);
            match self
                .storage
                .upload_with_key(&variant_key, variant_data, &item.content_type)
                .await
            {
                Ok(url) => variant_urls.push((variant.name.clone(), url)),
                Err(e) => {
                    tracing::error!(
                        item_id = %item.id,
                        variant = %variant.name,
                        error = %e,
                        "Rendition upload failed"
                    );
                    return self.abort_transfer(item, &remote_key).await;
                }
            }
        }

        self.media
            .mark_offloaded(item.id, &remote_key, &remote_url, &variant_urls)
            .await?;
        // a pending entry must never outlive a successful offload
        self.gate.clear_pending(item.id).await?;

        tracing::info!(
            item_id = %item.id,
            remote_key = %remote_key,
            variants = variant_urls.len(),
            "Media offloaded"
        );
        Ok(UploadOutcome::Uploaded)
    }

    /// Remove the already-uploaded original so a failed attempt leaves no
    /// orphan remote object. The local record stays eligible for a retry.
    async fn abort_transfer(
        &self,
        item: &MediaItem,
        remote_key: &str,
    ) -> Result<UploadOutcome, OffloadError> {
        if let Err(e) = self.storage.delete(remote_key).await {
            tracing::warn!(
                item_id = %item.id,
                remote_key = %remote_key,
                error = %e,
                "Failed to clean up partial upload"
            );
        }
        Ok(UploadOutcome::Failed)
    }
}
