//! Job coordination.
//!
//! [`JobCoordinator`] owns the bulk-offload job lifecycle:
//! idle → processing → (completed | cancelled) → idle. It is driven by an
//! external caller issuing discrete round-trips — each accepted `start`
//! runs exactly one batch and returns; the caller polls progress and
//! decides whether to request the next batch. The coordinator never
//! schedules itself.

use std::sync::Arc;
use tokio::sync::Mutex;

use offload_core::models::{JobState, JobStatus, ProgressReport, ProgressStatus, StartOutcome};
use offload_core::OffloadError;
use offload_state::{MediaStore, OffloadStateStore};

use crate::batch::BatchProcessor;

pub struct JobCoordinator {
    media: Arc<dyn MediaStore>,
    state: Arc<dyn OffloadStateStore>,
    batch: BatchProcessor,
    /// Serializes entry into processing: whoever holds this is the one
    /// running a batch. Concurrent starts bounce off with AlreadyRunning.
    run_lock: Mutex<()>,
}

impl JobCoordinator {
    pub fn new(
        media: Arc<dyn MediaStore>,
        state: Arc<dyn OffloadStateStore>,
        batch: BatchProcessor,
    ) -> Self {
        Self {
            media,
            state,
            batch,
            run_lock: Mutex::new(()),
        }
    }

    /// Start a job segment and run one batch of up to `batch_size` items.
    ///
    /// While a batch is in flight, further starts are accepted-but-ignored
    /// (`AlreadyRunning`) and leave the job state untouched, so concurrent
    /// triggers cannot double-count progress. With nothing eligible the job
    /// never enters processing.
    pub async fn start(&self, batch_size: usize) -> Result<StartOutcome, OffloadError> {
        if batch_size == 0 {
            return Err(OffloadError::InvalidInput(
                "batch size must be at least 1".to_string(),
            ));
        }

        let Ok(_guard) = self.run_lock.try_lock() else {
            tracing::info!("Bulk offload already running, ignoring start request");
            return Ok(StartOutcome::AlreadyRunning);
        };

        let total = self.media.count_not_offloaded().await?;
        if total == 0 {
            tracing::info!("No media to offload");
            self.state.clear_job().await?;
            return Ok(StartOutcome::NoItems);
        }

        self.state.save_job(&JobState::fresh(total)).await?;
        tracing::info!(total, batch_size, "Bulk offload job started");

        let outcome = self.batch.run_batch(batch_size).await?;
        tracing::info!(
            processed = outcome.processed,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "Job segment finished"
        );
        Ok(StartOutcome::Accepted)
    }

    /// Progress snapshot.
    ///
    /// Terminal states are acknowledged here: a cancelled or completed job
    /// is reported once, its state cleared, and the coordinator returns to
    /// idle for the next poll. Absent job state reads as idle — or as
    /// no-items when nothing is eligible — and is never an error.
    pub async fn poll(&self) -> Result<ProgressReport, OffloadError> {
        match self.state.load_job().await? {
            None => {
                if self.media.count_not_offloaded().await? == 0 {
                    Ok(ProgressReport::no_items())
                } else {
                    Ok(ProgressReport::idle())
                }
            }
            Some(job) => match job.status {
                JobStatus::Cancelled => {
                    self.state.clear_job().await?;
                    tracing::info!(processed = job.processed, "Cancellation acknowledged");
                    Ok(ProgressReport::from_job(ProgressStatus::Cancelled, &job))
                }
                JobStatus::Processing if job.is_complete() || job.total == 0 => {
                    // retained for exactly this read
                    self.state.clear_job().await?;
                    tracing::info!(
                        processed = job.processed,
                        errors = job.errors,
                        "Bulk offload complete"
                    );
                    Ok(ProgressReport::from_job(ProgressStatus::Completed, &job))
                }
                JobStatus::Processing => {
                    Ok(ProgressReport::from_job(ProgressStatus::Processing, &job))
                }
                JobStatus::Idle => {
                    self.state.clear_job().await?;
                    Ok(ProgressReport::idle())
                }
            },
        }
    }

    /// Request cancellation of the running job.
    ///
    /// Always acknowledged from the caller's view: cancelling an idle
    /// coordinator is a no-op, not an error. The in-flight item finishes;
    /// the batch stops issuing new uploads once it observes the flag.
    pub async fn cancel(&self) -> Result<(), OffloadError> {
        match self.state.load_job().await? {
            Some(mut job) if job.status == JobStatus::Processing => {
                job.status = JobStatus::Cancelled;
                self.state.save_job(&job).await?;
                tracing::info!(
                    processed = job.processed,
                    "Bulk offload cancellation requested"
                );
            }
            _ => {
                tracing::debug!("Cancel requested with no active job");
            }
        }
        Ok(())
    }

    /// Live count of items still eligible for offload.
    pub async fn count_remaining(&self) -> Result<u64, OffloadError> {
        self.media.count_not_offloaded().await
    }
}
