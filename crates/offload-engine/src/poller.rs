//! Client-side polling loop.
//!
//! The coordinator is push-driven: something has to keep asking for the
//! next batch. [`OffloadPoller`] is that driver — a plain loop with fixed
//! intervals and a cancellation token checked before every scheduled
//! continuation. It talks to the coordinator through the
//! [`CoordinatorClient`] seam so the same loop works in-process or across a
//! transport; transport errors surface as a human-readable failure and
//! reset only the poller, never the coordinator's durable state.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use offload_core::models::{ProgressReport, ProgressStatus, StartOutcome};
use offload_core::OffloadConfig;

use crate::coordinator::JobCoordinator;

/// Transport-agnostic view of the coordinator's operations.
#[async_trait]
pub trait CoordinatorClient: Send + Sync {
    async fn start(&self, batch_size: usize) -> Result<StartOutcome>;
    async fn poll(&self) -> Result<ProgressReport>;
    async fn cancel(&self) -> Result<()>;
    async fn count_remaining(&self) -> Result<u64>;
}

#[async_trait]
impl CoordinatorClient for JobCoordinator {
    async fn start(&self, batch_size: usize) -> Result<StartOutcome> {
        Ok(JobCoordinator::start(self, batch_size).await?)
    }

    async fn poll(&self) -> Result<ProgressReport> {
        Ok(JobCoordinator::poll(self).await?)
    }

    async fn cancel(&self) -> Result<()> {
        Ok(JobCoordinator::cancel(self).await?)
    }

    async fn count_remaining(&self) -> Result<u64> {
        Ok(JobCoordinator::count_remaining(self).await?)
    }
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Batch size requested from the coordinator per segment.
    pub batch_size: usize,
    /// Interval between progress polls while a segment is running.
    pub poll_interval: Duration,
    /// Delay between a completed segment and the next start request.
    pub batch_delay: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            batch_size: 200,
            poll_interval: Duration::from_secs(5),
            batch_delay: Duration::from_secs(3),
        }
    }
}

impl From<&OffloadConfig> for PollerConfig {
    fn from(config: &OffloadConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            poll_interval: config.poll_interval,
            batch_delay: config.batch_delay,
        }
    }
}

/// Terminal result of a poller run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerOutcome {
    /// All eligible items were processed; `errors` items failed to offload.
    Completed { errors: u64 },
    /// There was nothing to offload.
    NoItems,
    /// The run was cancelled (token or coordinator-side).
    Cancelled,
    /// A transport error talking to the coordinator. The message is
    /// user-presentable; the coordinator's durable state is untouched.
    Failed(String),
}

pub struct OffloadPoller {
    client: Arc<dyn CoordinatorClient>,
    config: PollerConfig,
    cancel: CancellationToken,
}

impl OffloadPoller {
    pub fn new(client: Arc<dyn CoordinatorClient>, config: PollerConfig) -> Self {
        Self {
            client,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that aborts the run; safe to clone into another task.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drive the job until completion, no-items, cancellation, or a
    /// transport failure. One loop iteration per batch segment.
    pub async fn run(&self) -> PollerOutcome {
        loop {
            if self.cancel.is_cancelled() {
                return self.finish_cancelled().await;
            }

            match self.client.start(self.config.batch_size).await {
                Ok(StartOutcome::NoItems) => {
                    tracing::info!("No files to offload");
                    return PollerOutcome::NoItems;
                }
                Ok(StartOutcome::AlreadyRunning) => {
                    tracing::info!("Bulk offload already running, attaching to its progress");
                }
                Ok(StartOutcome::Accepted) => {}
                Err(e) => return self.transport_failure("starting the bulk offload process", e),
            }

            let segment = match self.poll_segment().await {
                Ok(report) => report,
                Err(outcome) => return outcome,
            };

            // segment complete; ask whether another batch is worth starting
            match self.client.count_remaining().await {
                Ok(0) => {
                    tracing::info!(errors = segment.errors, "Offload complete");
                    return PollerOutcome::Completed {
                        errors: segment.errors,
                    };
                }
                Ok(remaining) => {
                    tracing::info!(remaining, "Batch complete, starting next batch");
                    if self.wait(self.config.batch_delay).await.is_err() {
                        return self.finish_cancelled().await;
                    }
                }
                Err(e) => {
                    // mirror the UI behavior: if the remaining count cannot be
                    // read, finish with what this run achieved
                    tracing::warn!(error = %e, "Failed to check for more files, finishing");
                    return PollerOutcome::Completed {
                        errors: segment.errors,
                    };
                }
            }
        }
    }

    /// Poll until the current segment has processed its batch, or a
    /// terminal status arrives. Returns the last report on segment
    /// completion, or the terminal outcome as `Err`.
    async fn poll_segment(&self) -> Result<ProgressReport, PollerOutcome> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(self.finish_cancelled().await);
            }

            let report = match self.client.poll().await {
                Ok(report) => report,
                Err(e) => return Err(self.transport_failure("checking the progress", e)),
            };

            match report.status {
                ProgressStatus::Cancelled => {
                    tracing::info!("Offload process cancelled");
                    return Err(PollerOutcome::Cancelled);
                }
                ProgressStatus::Completed => {
                    return Err(PollerOutcome::Completed {
                        errors: report.errors,
                    });
                }
                ProgressStatus::NoItems => return Err(PollerOutcome::NoItems),
                ProgressStatus::Idle => return Ok(report),
                ProgressStatus::Processing => {
                    let goal = report.total.min(self.config.batch_size as u64);
                    if goal > 0 && report.processed >= goal {
                        return Ok(report);
                    }
                    if self.wait(self.config.poll_interval).await.is_err() {
                        return Err(self.finish_cancelled().await);
                    }
                }
            }
        }
    }

    /// Cancellable sleep. `Err` means the token fired.
    async fn wait(&self, duration: Duration) -> Result<(), ()> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(()),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }

    async fn finish_cancelled(&self) -> PollerOutcome {
        // the backend acknowledgment may fail; the caller-side run is
        // cancelled regardless
        if let Err(e) = self.client.cancel().await {
            tracing::warn!(error = %e, "Failed to cancel bulk offload on the coordinator");
        }
        tracing::info!("Bulk offload process cancelled");
        PollerOutcome::Cancelled
    }

    fn transport_failure(&self, action: &str, error: anyhow::Error) -> PollerOutcome {
        let message = format!("An error occurred while {}", action);
        tracing::error!(error = %error, "{}", message);
        PollerOutcome::Failed(message)
    }
}
