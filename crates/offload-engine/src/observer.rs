//! Host lifecycle events.
//!
//! The host application drives per-item offloading through two separately
//! named events: "item ready for classification" (fired once the host has
//! finished preparing a newly ingested item) and "item finished deferred
//! process" (fired by the external gating process when it completes).
//! `item_ready` doubles as the rescue point for items whose gating process
//! never reported back.

use std::sync::Arc;
use uuid::Uuid;

use offload_core::models::{MediaItem, OffloadStatus, UploadOutcome};
use offload_core::OffloadError;
use offload_state::MediaStore;

use crate::admission::{AdmissionGate, PendingDisposition};
use crate::uploader::MediaUploader;

pub struct OffloadObserver {
    media: Arc<dyn MediaStore>,
    gate: Arc<AdmissionGate>,
    uploader: Arc<MediaUploader>,
}

impl OffloadObserver {
    pub fn new(
        media: Arc<dyn MediaStore>,
        gate: Arc<AdmissionGate>,
        uploader: Arc<MediaUploader>,
    ) -> Self {
        Self {
            media,
            gate,
            uploader,
        }
    }

    /// Host signal: an item is ready to be classified for offload.
    ///
    /// For an item already deferred, this is where the grace-window sweep
    /// runs: once the deferral is overdue the item is force-admitted exactly
    /// once and its pending entry cleared. Otherwise the admission gate
    /// decides between offloading now and deferring.
    pub async fn item_ready(&self, id: Uuid) -> Result<(), OffloadError> {
        let Some(item) = self.media.get(id).await? else {
            tracing::warn!(item_id = %id, "item_ready for unknown media record");
            return Ok(());
        };
        if item.is_offloaded() {
            return Ok(());
        }

        match self.gate.pending_disposition(item.id).await? {
            PendingDisposition::Waiting => {
                // the gating process still has time to report back
                Ok(())
            }
            PendingDisposition::Overdue => {
                self.gate.clear_pending(item.id).await?;
                tracing::warn!(
                    item_id = %item.id,
                    "No gating completion observed within grace window, offloading anyway"
                );
                self.uploader.upload_admitted(&item).await?;
                Ok(())
            }
            PendingDisposition::NotPending => match self.uploader.upload(&item).await? {
                UploadOutcome::Failed => self.discard_failed_ingest(&item).await,
                UploadOutcome::Deferred => {
                    tracing::info!(
                        item_id = %item.id,
                        "Offloading delayed, waiting for another process"
                    );
                    Ok(())
                }
                _ => Ok(()),
            },
        }
    }

    /// External signal: the gating process started working on this item.
    pub async fn deferred_process_started(&self, id: Uuid) -> Result<(), OffloadError> {
        tracing::debug!(item_id = %id, "Gating process started");
        self.gate.gating_started(id).await
    }

    /// External signal: the gating process finished; offload immediately,
    /// bypassing the grace-window sweep.
    pub async fn deferred_process_finished(&self, id: Uuid) -> Result<(), OffloadError> {
        self.gate.clear_pending(id).await?;
        let Some(item) = self.media.get(id).await? else {
            tracing::warn!(item_id = %id, "Gating completed for unknown media record");
            return Ok(());
        };
        tracing::info!(item_id = %id, "Gating process complete, offloading");
        self.uploader.upload_admitted(&item).await?;
        Ok(())
    }

    /// A freshly ingested record that fails to offload is deleted outright:
    /// the host never keeps a record for media that was never stored
    /// remotely. Applies only here, never to retries of existing media.
    async fn discard_failed_ingest(&self, item: &MediaItem) -> Result<(), OffloadError> {
        tracing::error!(
            item_id = %item.id,
            "Offload of freshly ingested media failed, deleting local record"
        );
        self.media
            .set_status(item.id, OffloadStatus::Failed)
            .await?;
        self.media.delete(item.id).await?;
        Ok(())
    }
}
