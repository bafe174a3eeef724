//! Media hosting for avatars, cover images, thumbnails and video files.

pub mod cloudinary;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use cloudinary::CloudinaryHost;
pub use memory::MemoryMediaHost;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Resource type segment used by the hosting API.
    pub fn resource_type(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// A file received from a client, held in memory until uploaded.
#[derive(Debug, Clone)]
pub struct MediaFile {
    /// Form field the file arrived in, used in validation messages.
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    /// Rejects empty files and declared content types of the wrong family.
    /// Files without a declared type, or sent as octet-stream, are accepted.
    pub fn validate(&self, kind: MediaKind) -> Result<(), MediaError> {
        if self.bytes.is_empty() {
            return Err(MediaError::EmptyFile(self.field.clone()));
        }
        if let Some(content_type) = self.content_type.as_deref() {
            let family = format!("{}/", kind.resource_type());
            if !content_type.starts_with(&family) && content_type != "application/octet-stream" {
                return Err(MediaError::UnsupportedType {
                    field: self.field.clone(),
                    content_type: content_type.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct UploadedMedia {
    pub url: String,
    pub public_id: String,
    /// Seconds; only reported for videos.
    pub duration: Option<f64>,
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0} file is empty")]
    EmptyFile(String),

    #[error("Unsupported content type '{content_type}' for {field}")]
    UnsupportedType { field: String, content_type: String },

    #[error("Media host not configured: {0}")]
    NotConfigured(&'static str),

    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error("Media host rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected media host response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, file: MediaFile, kind: MediaKind) -> Result<UploadedMedia, MediaError>;

    async fn destroy(&self, public_id: &str, kind: MediaKind) -> Result<(), MediaError>;
}

/// Remove a replaced or orphaned asset. Failures are logged, never surfaced:
/// the database change that made the asset obsolete has already happened.
pub async fn destroy_quietly(host: &dyn MediaHost, public_id: &str, kind: MediaKind) {
    if public_id.is_empty() {
        return;
    }
    if let Err(e) = host.destroy(public_id, kind).await {
        tracing::warn!("Failed to delete {} asset {}: {}", kind.resource_type(), public_id, e);
    }
}
