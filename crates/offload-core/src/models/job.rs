use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Lifecycle status of the singleton bulk-offload job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Idle,
    Processing,
    Cancelled,
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobStatus::Idle => write!(f, "idle"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(JobStatus::Idle),
            "processing" => Ok(JobStatus::Processing),
            "cancelled" => Ok(JobStatus::Cancelled),
            _ => Err(anyhow::anyhow!("Invalid job status: {}", s)),
        }
    }
}

/// Durable progress record for the bulk-offload job.
///
/// Persisted by the state store after every processed item so that a fault
/// mid-batch leaves the completed work visible. `total` is recomputed from
/// the live not-offloaded count at the start of each batch, so it can change
/// between polls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobState {
    pub status: JobStatus,
    pub processed: u64,
    pub total: u64,
    pub errors: u64,
}

impl JobState {
    /// A freshly started job: processing, nothing done yet.
    pub fn fresh(total: u64) -> Self {
        Self {
            status: JobStatus::Processing,
            processed: 0,
            total,
            errors: 0,
        }
    }

    /// All counted work done. Meaningless for an empty job.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.processed >= self.total
    }
}

/// Outcome of a start-job request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    Accepted,
    AlreadyRunning,
    NoItems,
}

/// Outcome of one per-item upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Uploaded to remote storage and the local record updated.
    Uploaded,
    /// The item was already offloaded; nothing to do.
    AlreadyOffloaded,
    /// The admission gate deferred the item; it stays local for now.
    Deferred,
    /// The upload failed; the item remains eligible for a later attempt.
    Failed,
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded | UploadOutcome::AlreadyOffloaded)
    }
}

/// Counters accumulated over one batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// Client-facing status reported by a progress poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Processing,
    Completed,
    Cancelled,
    NoItems,
    Idle,
}

/// Snapshot returned by a progress poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub status: ProgressStatus,
    pub processed: u64,
    pub total: u64,
    pub errors: u64,
}

impl ProgressReport {
    pub fn idle() -> Self {
        Self {
            status: ProgressStatus::Idle,
            processed: 0,
            total: 0,
            errors: 0,
        }
    }

    pub fn no_items() -> Self {
        Self {
            status: ProgressStatus::NoItems,
            processed: 0,
            total: 0,
            errors: 0,
        }
    }

    pub fn from_job(status: ProgressStatus, job: &JobState) -> Self {
        Self {
            status,
            processed: job.processed,
            total: job.total,
            errors: job.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_round_trip() {
        assert_eq!("idle".parse::<JobStatus>().unwrap(), JobStatus::Idle);
        assert_eq!(
            "processing".parse::<JobStatus>().unwrap(),
            JobStatus::Processing
        );
        assert_eq!(
            "cancelled".parse::<JobStatus>().unwrap(),
            JobStatus::Cancelled
        );
        assert_eq!(JobStatus::Processing.to_string(), "processing");
        assert!("paused".parse::<JobStatus>().is_err());
    }

    #[test]
    fn fresh_job_state() {
        let job = JobState::fresh(450);
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.processed, 0);
        assert_eq!(job.total, 450);
        assert_eq!(job.errors, 0);
        assert!(!job.is_complete());
    }

    #[test]
    fn completion_requires_nonzero_total() {
        let mut job = JobState::fresh(0);
        assert!(!job.is_complete());
        job = JobState::fresh(3);
        job.processed = 3;
        assert!(job.is_complete());
    }

    #[test]
    fn upload_outcome_success() {
        assert!(UploadOutcome::Uploaded.is_success());
        assert!(UploadOutcome::AlreadyOffloaded.is_success());
        assert!(!UploadOutcome::Deferred.is_success());
        assert!(!UploadOutcome::Failed.is_success());
    }

    #[test]
    fn progress_report_from_job() {
        let mut job = JobState::fresh(10);
        job.processed = 4;
        job.errors = 1;
        let report = ProgressReport::from_job(ProgressStatus::Processing, &job);
        assert_eq!(report.status, ProgressStatus::Processing);
        assert_eq!(report.processed, 4);
        assert_eq!(report.total, 10);
        assert_eq!(report.errors, 1);
    }
}
