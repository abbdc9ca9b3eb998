//! Offload Engine Library
//!
//! The coordination engine that moves media files from a host application
//! into remote object storage: a resumable, cancellable, batch-oriented
//! background job plus the per-item admission logic deciding when an item
//! may be offloaded.
//!
//! The engine is explicitly constructed with its collaborators (media
//! metadata store, durable state store, storage backend) — see
//! [`Offloader`] for the standard wiring. Jobs are driven by an external
//! caller: [`JobCoordinator::start`] runs one bounded batch per call, and
//! [`OffloadPoller`] implements the client loop that keeps requesting
//! batches until no eligible work remains.

pub mod admission;
pub mod batch;
pub mod coordinator;
pub mod observer;
pub mod offloader;
pub mod poller;
pub mod telemetry;
pub mod uploader;
pub mod watermark;

// Re-export commonly used types
pub use admission::{Admission, AdmissionGate, EligibilityPredicate, PendingDisposition};
pub use batch::BatchProcessor;
pub use coordinator::JobCoordinator;
pub use observer::OffloadObserver;
pub use offloader::Offloader;
pub use poller::{CoordinatorClient, OffloadPoller, PollerConfig, PollerOutcome};
pub use uploader::MediaUploader;
pub use watermark::{WatermarkConfig, WatermarkGate};
