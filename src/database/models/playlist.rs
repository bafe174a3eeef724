use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Playlist {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    /// Most recently added first, no duplicates.
    pub video_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPlaylist {
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub first_video: Option<Uuid>,
}

impl NewPlaylist {
    pub fn into_playlist(self, id: Uuid, now: DateTime<Utc>) -> Playlist {
        Playlist {
            id,
            owner_id: self.owner_id,
            name: self.name,
            description: self.description,
            video_ids: self.first_video.into_iter().collect(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Playlist {
    /// Puts the video at the front. Returns false when it was already listed.
    pub fn push_front(&mut self, video_id: Uuid) -> bool {
        if self.video_ids.contains(&video_id) {
            return false;
        }
        self.video_ids.insert(0, video_id);
        true
    }

    pub fn remove_video(&mut self, video_id: Uuid) -> bool {
        let before = self.video_ids.len();
        self.video_ids.retain(|id| *id != video_id);
        self.video_ids.len() != before
    }
}
