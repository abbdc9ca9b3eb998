//! Watermark gating integration.
//!
//! Image files must not be offloaded before the external watermarking
//! process has stamped them, so this predicate defers images while the
//! capability is active. The watermarking process itself reports back
//! through the gating-started / gating-completed signals (see
//! [`crate::observer::OffloadObserver`]); items it silently skips are
//! rescued by the grace-window sweep.

use anyhow::Result;
use async_trait::async_trait;

use offload_core::models::MediaItem;

use crate::admission::EligibilityPredicate;

/// Configuration of the external watermarking capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct WatermarkConfig {
    /// The watermarking capability is present.
    pub enabled: bool,
    /// Watermarks are applied automatically on ingest.
    pub auto_apply: bool,
}

impl WatermarkConfig {
    /// Whether gating applies: the capability must be present and set to run
    /// automatically.
    pub fn active(&self) -> bool {
        self.enabled && self.auto_apply
    }
}

/// Defers image offloads until watermarking has run.
pub struct WatermarkGate {
    config: WatermarkConfig,
}

impl WatermarkGate {
    pub fn new(config: WatermarkConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EligibilityPredicate for WatermarkGate {
    fn name(&self) -> &str {
        "watermark"
    }

    async fn should_offload(&self, current: bool, item: &MediaItem) -> Result<bool> {
        if item.is_image() && self.config.active() {
            return Ok(false);
        }
        Ok(current)
    }
}
