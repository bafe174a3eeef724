use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Stored account. Doubles as the channel that other users subscribe to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    #[serde(skip_serializing)]
    pub avatar_public_id: String,
    pub cover_image_url: Option<String>,
    #[serde(skip_serializing)]
    pub cover_image_public_id: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: String,
    pub avatar_public_id: String,
    pub cover_image_url: Option<String>,
    pub cover_image_public_id: Option<String>,
    pub password_hash: String,
}

impl NewUser {
    pub fn into_user(self, id: Uuid, now: DateTime<Utc>) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            full_name: self.full_name,
            avatar_url: self.avatar_url,
            avatar_public_id: self.avatar_public_id,
            cover_image_url: self.cover_image_url,
            cover_image_public_id: self.cover_image_public_id,
            password_hash: self.password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Usernames are stored trimmed and lowercased so lookups are case-insensitive.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
