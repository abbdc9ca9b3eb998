//! Offload Storage Library
//!
//! Object-storage abstraction for the offload engine: the `Storage`
//! capability trait plus S3 and local-filesystem backends.
//!
//! # Storage key format
//!
//! All backends share one key layout: `media/{filename}`, with derived
//! renditions uploaded under keys the caller builds from the same prefix.
//! Keys must not contain `..` or a leading `/`. Key generation is
//! centralized in the `keys` module so backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use offload_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
