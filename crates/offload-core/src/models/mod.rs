pub mod job;
pub mod media;

pub use job::{
    BatchOutcome, JobState, JobStatus, ProgressReport, ProgressStatus, StartOutcome, UploadOutcome,
};
pub use media::{MediaItem, MediaType, MediaVariant, OffloadStatus};
