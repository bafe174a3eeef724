use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MediaError, MediaFile, MediaHost, MediaKind, UploadedMedia};

/// Keeps uploads in process and hands out `memory://` URLs.
pub struct MemoryMediaHost {
    folder: String,
    uploaded: RwLock<Vec<String>>,
    destroyed: RwLock<Vec<String>>,
}

impl MemoryMediaHost {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            uploaded: RwLock::new(Vec::new()),
            destroyed: RwLock::new(Vec::new()),
        }
    }

    pub async fn uploaded(&self) -> Vec<String> {
        self.uploaded.read().await.clone()
    }

    pub async fn destroyed(&self) -> Vec<String> {
        self.destroyed.read().await.clone()
    }
}

#[async_trait]
impl MediaHost for MemoryMediaHost {
    async fn upload(&self, file: MediaFile, kind: MediaKind) -> Result<UploadedMedia, MediaError> {
        file.validate(kind)?;
        let public_id = format!("{}/{}", self.folder, Uuid::new_v4().simple());
        let extension = file
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| format!(".{}", ext))
            .unwrap_or_default();

        self.uploaded.write().await.push(public_id.clone());
        Ok(UploadedMedia {
            url: format!("memory://{}/{}{}", kind.resource_type(), public_id, extension),
            public_id,
            duration: (kind == MediaKind::Video).then_some(0.0),
        })
    }

    async fn destroy(&self, public_id: &str, _kind: MediaKind) -> Result<(), MediaError> {
        self.destroyed.write().await.push(public_id.to_string());
        Ok(())
    }
}
