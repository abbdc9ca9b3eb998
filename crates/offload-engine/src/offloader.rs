//! Standard wiring of the engine's components.

use std::sync::Arc;

use offload_core::OffloadConfig;
use offload_state::{MediaStore, OffloadStateStore};
use offload_storage::Storage;

use crate::admission::AdmissionGate;
use crate::batch::BatchProcessor;
use crate::coordinator::JobCoordinator;
use crate::observer::OffloadObserver;
use crate::uploader::MediaUploader;
use crate::watermark::{WatermarkConfig, WatermarkGate};

/// Builds the admission gate, uploader, batch processor, coordinator, and
/// lifecycle observer over a shared set of collaborators. Everything is
/// injected — there is no ambient global instance.
pub struct Offloader {
    gate: Arc<AdmissionGate>,
    uploader: Arc<MediaUploader>,
    observer: Arc<OffloadObserver>,
    coordinator: Arc<JobCoordinator>,
}

impl Offloader {
    pub fn new(
        media: Arc<dyn MediaStore>,
        state: Arc<dyn OffloadStateStore>,
        storage: Arc<dyn Storage>,
        config: &OffloadConfig,
    ) -> Self {
        let gate = Arc::new(AdmissionGate::new(state.clone(), config.grace_window));
        let uploader = Arc::new(MediaUploader::new(media.clone(), gate.clone(), storage));
        let batch = BatchProcessor::new(media.clone(), state.clone(), uploader.clone());
        let coordinator = Arc::new(JobCoordinator::new(media.clone(), state, batch));
        let observer = Arc::new(OffloadObserver::new(media, gate.clone(), uploader.clone()));

        Self {
            gate,
            uploader,
            observer,
            coordinator,
        }
    }

    /// Register the watermark integration when the capability is present.
    /// The predicate still checks the configuration per item, so a capability
    /// that is present but not set to auto-apply never defers anything.
    pub async fn register_watermark_gate(&self, config: WatermarkConfig) {
        if config.enabled {
            self.gate
                .register(Arc::new(WatermarkGate::new(config)), 10)
                .await;
        }
    }

    pub fn gate(&self) -> &Arc<AdmissionGate> {
        &self.gate
    }

    pub fn uploader(&self) -> &Arc<MediaUploader> {
        &self.uploader
    }

    pub fn observer(&self) -> &Arc<OffloadObserver> {
        &self.observer
    }

    pub fn coordinator(&self) -> &Arc<JobCoordinator> {
        &self.coordinator
    }
}
