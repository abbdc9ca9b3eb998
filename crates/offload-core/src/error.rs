//! Error types module
//!
//! All engine errors are unified under the `OffloadError` enum: storage,
//! durable-state, and media-store failures plus the usual input/internal
//! variants.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx`
//! feature. With `default-features = false` the enum carries a plain string
//! variant instead.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

#[derive(Debug, thiserror::Error)]
pub enum OffloadError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("State store error: {0}")]
    State(String),

    #[error("Media store error: {0}")]
    MediaStore(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for OffloadError {
    fn from(err: SqlxError) -> Self {
        OffloadError::Database(err)
    }
}

impl From<anyhow::Error> for OffloadError {
    fn from(err: anyhow::Error) -> Self {
        OffloadError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for OffloadError {
    fn from(err: io::Error) -> Self {
        OffloadError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for OffloadError {
    fn from(err: serde_json::Error) -> Self {
        OffloadError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for OffloadError {
    fn from(err: uuid::Error) -> Self {
        OffloadError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

impl OffloadError {
    /// Whether a retry of the failed operation may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            OffloadError::Database(_)
                | OffloadError::Storage(_)
                | OffloadError::State(_)
                | OffloadError::Internal(_)
                | OffloadError::InternalWithSource { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_is_recoverable() {
        let err = OffloadError::Storage("bucket unreachable".to_string());
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("bucket unreachable"));
    }

    #[test]
    fn invalid_input_is_not_recoverable() {
        let err = OffloadError::InvalidInput("batch size must be positive".to_string());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn anyhow_conversion_preserves_message() {
        let err: OffloadError = anyhow::anyhow!("upstream broke").into();
        match err {
            OffloadError::InternalWithSource { message, .. } => {
                assert_eq!(message, "upstream broke")
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn io_error_maps_to_internal() {
        let err: OffloadError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, OffloadError::Internal(_)));
    }
}
