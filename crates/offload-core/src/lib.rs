//! Offload Core Library
//!
//! This crate provides the domain models, error types, and configuration
//! shared across all offload components: the media records the engine
//! classifies and offloads, the durable job-progress record, and the
//! outcome types exchanged between the coordinator and its callers.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::OffloadConfig;
pub use error::OffloadError;
pub use storage_types::StorageBackend;
