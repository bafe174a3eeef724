//! Wire shapes for API responses and the lookups that fill them in.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::authz::PageRequest;
use crate::database::models::{Comment, Playlist, User, Video};
use crate::database::{Store, StoreResult};

/// Public view of a user attached to the things they own.
#[derive(Debug, Clone, Serialize)]
pub struct OwnerSummary {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
}

impl From<&User> for OwnerSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoView {
    #[serde(flatten)]
    pub video: Video,
    pub owner: Option<OwnerSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub owner: Option<OwnerSummary>,
    pub likes: u64,
    pub is_liked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistView {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub owner: Option<OwnerSummary>,
    pub total_videos: usize,
    pub total_views: i64,
    pub videos: Vec<VideoView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistSummary {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub total_videos: usize,
}

impl From<Playlist> for PlaylistSummary {
    fn from(playlist: Playlist) -> Self {
        Self {
            total_videos: playlist.video_ids.len(),
            playlist,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelProfile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub avatar_url: String,
    pub cover_image_url: Option<String>,
    pub subscribers_count: u64,
    pub subscribed_to_count: u64,
    pub is_subscribed: bool,
    pub created_at: DateTime<Utc>,
}

/// One page of a listing plus the numbers a client needs to page further.
#[derive(Debug, Clone, Serialize)]
pub struct Paged<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T: Serialize> Paged<T> {
    pub fn new(items: Vec<T>, total: u64, page: &PageRequest) -> Self {
        Self {
            items,
            total,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages,
            has_next_page: page.has_next_page(),
            has_prev_page: page.has_prev_page(),
        }
    }
}

/// Fetch owner summaries for a set of user ids in one lookup.
pub async fn owner_map(store: &dyn Store, ids: impl IntoIterator<Item = Uuid>) -> StoreResult<HashMap<Uuid, OwnerSummary>> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort();
    ids.dedup();
    let users = store.find_users(&ids).await?;
    Ok(users.iter().map(|u| (u.id, OwnerSummary::from(u))).collect())
}

/// Attach owners to videos, preserving order.
pub async fn video_views(store: &dyn Store, videos: Vec<Video>) -> StoreResult<Vec<VideoView>> {
    let owners = owner_map(store, videos.iter().map(|v| v.owner_id)).await?;
    Ok(videos
        .into_iter()
        .map(|video| VideoView {
            owner: owners.get(&video.owner_id).cloned(),
            video,
            likes: None,
            is_liked: None,
        })
        .collect())
}
