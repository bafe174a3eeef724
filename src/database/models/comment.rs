use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub video_id: Uuid,
    pub owner_id: Uuid,
    /// Set when this comment is a reply; the parent is on the same video.
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub video_id: Uuid,
    pub owner_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
}

impl NewComment {
    pub fn into_comment(self, id: Uuid, now: DateTime<Utc>) -> Comment {
        Comment {
            id,
            video_id: self.video_id,
            owner_id: self.owner_id,
            parent_comment_id: self.parent_comment_id,
            content: self.content,
            created_at: now,
            updated_at: now,
        }
    }
}
