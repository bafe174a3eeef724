use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Video {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub video_url: String,
    #[serde(skip_serializing)]
    pub video_public_id: String,
    pub thumbnail_url: String,
    #[serde(skip_serializing)]
    pub thumbnail_public_id: String,
    pub title: String,
    pub description: String,
    /// Seconds, as reported by the media host.
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewVideo {
    pub owner_id: Uuid,
    pub video_url: String,
    pub video_public_id: String,
    pub thumbnail_url: String,
    pub thumbnail_public_id: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
}

impl NewVideo {
    pub fn into_video(self, id: Uuid, now: DateTime<Utc>) -> Video {
        Video {
            id,
            owner_id: self.owner_id,
            video_url: self.video_url,
            video_public_id: self.video_public_id,
            thumbnail_url: self.thumbnail_url,
            thumbnail_public_id: self.thumbnail_public_id,
            title: self.title,
            description: self.description,
            duration: self.duration,
            views: 0,
            is_published: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSortField {
    #[default]
    CreatedAt,
    Views,
    Duration,
    Title,
}

impl VideoSortField {
    /// Accepts both the camelCase names clients send and the column names.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            "views" => Some(Self::Views),
            "duration" => Some(Self::Duration),
            "title" => Some(Self::Title),
            _ => None,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Views => "views",
            Self::Duration => "duration",
            Self::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "asc" | "1" => Some(Self::Asc),
            "desc" | "-1" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Equality and text filters for video listings.
#[derive(Debug, Clone, Default)]
pub struct VideoFilter {
    pub owner_id: Option<Uuid>,
    /// Case-insensitive substring match on title or description.
    pub search: Option<String>,
    pub published_only: bool,
    pub sort_by: VideoSortField,
    pub sort_direction: SortDirection,
}

impl VideoFilter {
    pub fn matches(&self, video: &Video) -> bool {
        if self.published_only && !video.is_published {
            return false;
        }
        if let Some(owner) = self.owner_id {
            if video.owner_id != owner {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !video.title.to_lowercase().contains(&needle)
                && !video.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}
