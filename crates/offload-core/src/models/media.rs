use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

/// Media type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "media_type", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaType {
    pub fn is_image(&self) -> bool {
        matches!(self, MediaType::Image)
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MediaType::Image => write!(f, "image"),
            MediaType::Video => write!(f, "video"),
            MediaType::Audio => write!(f, "audio"),
            MediaType::Document => write!(f, "document"),
        }
    }
}

/// Where a media item's bytes currently live, from the host's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "offload_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OffloadStatus {
    NotOffloaded,
    Offloaded,
    Failed,
}

impl Display for OffloadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            OffloadStatus::NotOffloaded => write!(f, "not_offloaded"),
            OffloadStatus::Offloaded => write!(f, "offloaded"),
            OffloadStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for OffloadStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_offloaded" => Ok(OffloadStatus::NotOffloaded),
            "offloaded" => Ok(OffloadStatus::Offloaded),
            "failed" => Ok(OffloadStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid offload status: {}", s)),
        }
    }
}

/// A derived rendition of a media item (thumbnail, resized copy).
///
/// The `url` starts out pointing at the host's local copy (or unset) and is
/// rewritten to the remote URL when the item is offloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaVariant {
    pub name: String,
    pub filename: String,
    pub url: Option<String>,
}

impl MediaVariant {
    pub fn new(name: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            url: None,
        }
    }
}

/// A media record owned by the host application.
///
/// Created by the host; the engine only flips `offload_status` and fills in
/// the remote reference fields once the item has been uploaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: Uuid,
    pub filename: String,
    pub local_path: String,
    pub content_type: String,
    pub media_type: MediaType,
    pub offload_status: OffloadStatus,
    pub remote_key: Option<String>,
    pub remote_url: Option<String>,
    pub variants: Vec<MediaVariant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MediaItem {
    pub fn new(
        filename: impl Into<String>,
        local_path: impl Into<String>,
        content_type: impl Into<String>,
        media_type: MediaType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            local_path: local_path.into(),
            content_type: content_type.into(),
            media_type,
            offload_status: OffloadStatus::NotOffloaded,
            remote_key: None,
            remote_url: None,
            variants: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_variants(mut self, variants: Vec<MediaVariant>) -> Self {
        self.variants = variants;
        self
    }

    pub fn is_offloaded(&self) -> bool {
        self.offload_status == OffloadStatus::Offloaded
    }

    pub fn is_image(&self) -> bool {
        self.media_type.is_image()
    }
}
