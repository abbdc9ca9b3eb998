//! Configuration module
//!
//! Engine configuration is read from the environment with sane defaults.
//! Storage credentials themselves (AWS keys etc.) are picked up by the
//! storage backend from its own environment, not duplicated here.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const DEFAULT_BATCH_SIZE: usize = 200;
const DEFAULT_GRACE_WINDOW_SECS: u64 = 5;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_BATCH_DELAY_SECS: u64 = 3;

/// Engine configuration.
#[derive(Clone, Debug)]
pub struct OffloadConfig {
    /// Upper bound on items processed per batch run.
    pub batch_size: usize,
    /// How long a deferred item may wait for its gating process before the
    /// fallback sweep force-admits it.
    pub grace_window: Duration,
    /// Client poll interval while a job is processing.
    pub poll_interval: Duration,
    /// Client delay between a completed batch and the next start request.
    pub batch_delay: Duration,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, Spaces, ...).
    pub s3_endpoint: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Durable state configuration
    pub database_url: Option<String>,
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            grace_window: Duration::from_secs(DEFAULT_GRACE_WINDOW_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            batch_delay: Duration::from_secs(DEFAULT_BATCH_DELAY_SECS),
            storage_backend: None,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            local_storage_path: None,
            local_storage_base_url: None,
            database_url: None,
        }
    }
}

impl OffloadConfig {
    /// Load configuration from the environment (.env honored when present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let config = Self {
            batch_size: env_parse("OFFLOAD_BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
            grace_window: Duration::from_secs(env_parse(
                "OFFLOAD_GRACE_WINDOW_SECS",
                DEFAULT_GRACE_WINDOW_SECS,
            )?),
            poll_interval: Duration::from_secs(env_parse(
                "OFFLOAD_POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL_SECS,
            )?),
            batch_delay: Duration::from_secs(env_parse(
                "OFFLOAD_BATCH_DELAY_SECS",
                DEFAULT_BATCH_DELAY_SECS,
            )?),
            storage_backend: env_opt("STORAGE_BACKEND")
                .map(|s| StorageBackend::from_str(&s))
                .transpose()?,
            s3_bucket: env_opt("S3_BUCKET"),
            s3_region: env_opt("S3_REGION").or_else(|| env_opt("AWS_REGION")),
            s3_endpoint: env_opt("S3_ENDPOINT"),
            local_storage_path: env_opt("LOCAL_STORAGE_PATH"),
            local_storage_base_url: env_opt("LOCAL_STORAGE_BASE_URL"),
            database_url: env_opt("DATABASE_URL"),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.batch_size == 0 {
            anyhow::bail!("OFFLOAD_BATCH_SIZE must be at least 1");
        }
        Ok(())
    }
}

/// Read an env var as `T`, falling back to `default` when unset or empty.
fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T, anyhow::Error>
where
    T::Err: std::fmt::Display,
{
    match env_opt(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        None => Ok(default),
    }
}

/// Read an env var, treating unset and empty as absent.
fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = OffloadConfig::default();
        assert_eq!(config.batch_size, 200);
        assert_eq!(config.grace_window, Duration::from_secs(5));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.batch_delay, Duration::from_secs(3));
    }

    #[test]
    fn env_parse_uses_default_when_unset() {
        let parsed: usize = env_parse("OFFLOAD_TEST_UNSET_KEY", 42).unwrap();
        assert_eq!(parsed, 42);
    }

    #[test]
    fn env_parse_reads_value() {
        env::set_var("OFFLOAD_TEST_BATCH_KEY", "17");
        let parsed: usize = env_parse("OFFLOAD_TEST_BATCH_KEY", 42).unwrap();
        assert_eq!(parsed, 17);
        env::remove_var("OFFLOAD_TEST_BATCH_KEY");
    }

    #[test]
    fn env_parse_rejects_garbage() {
        env::set_var("OFFLOAD_TEST_BAD_KEY", "not-a-number");
        let parsed: Result<usize, _> = env_parse("OFFLOAD_TEST_BAD_KEY", 42);
        assert!(parsed.is_err());
        env::remove_var("OFFLOAD_TEST_BAD_KEY");
    }

    #[test]
    fn zero_batch_size_rejected() {
        let config = OffloadConfig {
            batch_size: 0,
            ..OffloadConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
