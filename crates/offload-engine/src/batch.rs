//! Batch processing.
//!
//! One batch is the atomic unit of caller-visible work: up to `size` items,
//! selected in stable creation order, uploaded sequentially. Progress is
//! persisted after every item, so a fault mid-batch leaves the completed
//! work visible and resumable. A cancellation written by a concurrent
//! caller is observed between items; the in-flight item always finishes.

use std::sync::Arc;

use offload_core::models::{BatchOutcome, JobState, JobStatus, UploadOutcome};
use offload_core::OffloadError;
use offload_state::{MediaStore, OffloadStateStore};

use crate::uploader::MediaUploader;

pub struct BatchProcessor {
    media: Arc<dyn MediaStore>,
    state: Arc<dyn OffloadStateStore>,
    uploader: Arc<MediaUploader>,
}

impl BatchProcessor {
    pub fn new(
        media: Arc<dyn MediaStore>,
        state: Arc<dyn OffloadStateStore>,
        uploader: Arc<MediaUploader>,
    ) -> Self {
        Self {
            media,
            state,
            uploader,
        }
    }

    /// Run one bounded batch, accumulating counts into the durable job
    /// state.
    ///
    /// `total` is recomputed from the live not-offloaded count at batch
    /// start, not at job start — the host may create media mid-job.
    pub async fn run_batch(&self, size: usize) -> Result<BatchOutcome, OffloadError> {
        let mut job = self
            .state
            .load_job()
            .await?
            .unwrap_or_else(|| JobState::fresh(0));
        if job.status == JobStatus::Cancelled {
            tracing::info!("Cancellation already requested, skipping batch");
            return Ok(BatchOutcome::default());
        }

        let live = self.media.count_not_offloaded().await?;
        job.status = JobStatus::Processing;
        job.total = job.processed + live;
        self.state.save_job(&job).await?;

        let items = self.media.list_not_offloaded(size).await?;
        tracing::info!(
            batch_size = items.len(),
            total = job.total,
            "Starting offload batch"
        );

        let mut outcome = BatchOutcome::default();
        for item in items {
            let result = self.uploader.upload(&item).await;
            outcome.processed += 1;
            job.processed += 1;
            match result {
                Ok(upload) if upload.is_success() => outcome.succeeded += 1,
                Ok(UploadOutcome::Deferred) => {
                    tracing::debug!(item_id = %item.id, "Item deferred during batch");
                }
                Ok(_) => {
                    outcome.failed += 1;
                    job.errors += 1;
                }
                Err(e) => {
                    tracing::error!(item_id = %item.id, error = %e, "Item offload errored");
                    outcome.failed += 1;
                    job.errors += 1;
                }
            }

            // persist after every item, carrying over a status change
            // (cancellation) written by a concurrent caller
            let mut current = self
                .state
                .load_job()
                .await?
                .unwrap_or_else(|| job.clone());
            current.processed = job.processed;
            current.total = job.total;
            current.errors = job.errors;
            self.state.save_job(&current).await?;

            if current.status == JobStatus::Cancelled {
                tracing::info!(
                    processed = job.processed,
                    "Cancellation observed mid-batch, stopping"
                );
                break;
            }
        }

        tracing::info!(
            processed = outcome.processed,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "Offload batch finished"
        );
        Ok(outcome)
    }
}
