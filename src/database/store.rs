use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::error::StoreError;
use super::models::{
    Comment, EdgeKey, NewComment, NewPlaylist, NewUser, NewVideo, Playlist, Relation, TargetKind,
    ToggleEdge, User, Video, VideoFilter,
};

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence boundary for every entity the service owns.
///
/// Implementations must enforce these uniqueness rules and report violations
/// as `StoreError::Conflict`: user username, user email, playlist
/// (owner, name) and toggle edge (principal, target kind, target, relation).
///
/// Deleting a video removes its comments, playlist entries, watch history and
/// like edges (on the video and on its comments). Deleting a comment removes
/// its replies and the like edges on them.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    // Users
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;
    async fn update_user(&self, user: &User) -> StoreResult<()>;

    // Videos
    async fn insert_video(&self, video: NewVideo) -> StoreResult<Video>;
    async fn find_video(&self, id: Uuid) -> StoreResult<Option<Video>>;
    /// Returns the found videos in the order of `ids`, skipping missing ones.
    async fn find_videos(&self, ids: &[Uuid]) -> StoreResult<Vec<Video>>;
    async fn update_video(&self, video: &Video) -> StoreResult<()>;
    async fn increment_views(&self, id: Uuid) -> StoreResult<()>;
    async fn delete_video(&self, id: Uuid) -> StoreResult<bool>;
    async fn list_videos(&self, filter: &VideoFilter, skip: u64, limit: u64) -> StoreResult<Vec<Video>>;
    async fn count_videos(&self, filter: &VideoFilter) -> StoreResult<u64>;

    // Comments
    async fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment>;
    async fn find_comment(&self, id: Uuid) -> StoreResult<Option<Comment>>;
    async fn update_comment(&self, comment: &Comment) -> StoreResult<()>;
    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool>;
    /// Newest first.
    async fn list_comments(&self, video_id: Uuid, skip: u64, limit: u64) -> StoreResult<Vec<Comment>>;
    async fn count_comments(&self, video_id: Uuid) -> StoreResult<u64>;

    // Playlists
    async fn insert_playlist(&self, playlist: NewPlaylist) -> StoreResult<Playlist>;
    async fn find_playlist(&self, id: Uuid) -> StoreResult<Option<Playlist>>;
    /// Writes name and description only; the video list has its own operations.
    async fn update_playlist(&self, playlist: &Playlist) -> StoreResult<()>;
    async fn delete_playlist(&self, id: Uuid) -> StoreResult<bool>;
    /// Returns false when the video was already in the playlist.
    async fn add_playlist_video(&self, playlist_id: Uuid, video_id: Uuid) -> StoreResult<bool>;
    async fn remove_playlist_video(&self, playlist_id: Uuid, video_id: Uuid) -> StoreResult<bool>;
    async fn list_playlists_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Playlist>>;

    // Toggle edges
    async fn find_edge(&self, key: &EdgeKey) -> StoreResult<Option<ToggleEdge>>;
    async fn insert_edge(&self, key: &EdgeKey) -> StoreResult<ToggleEdge>;
    /// Deletes by the edge's own id. Returns false when it was already gone.
    async fn delete_edge(&self, id: Uuid) -> StoreResult<bool>;
    async fn count_edges_to(&self, target_kind: TargetKind, target_id: Uuid, relation: Relation) -> StoreResult<u64>;
    /// Counts per target in one read. Targets without edges are absent.
    async fn count_edges_to_many(
        &self,
        target_kind: TargetKind,
        target_ids: &[Uuid],
        relation: Relation,
    ) -> StoreResult<HashMap<Uuid, u64>>;
    /// The subset of `target_ids` the principal has an edge on.
    async fn find_edge_targets(
        &self,
        principal_id: Uuid,
        target_kind: TargetKind,
        target_ids: &[Uuid],
        relation: Relation,
    ) -> StoreResult<HashSet<Uuid>>;
    async fn count_edges_from(&self, principal_id: Uuid, target_kind: TargetKind, relation: Relation) -> StoreResult<u64>;
    /// Newest first.
    async fn list_edges_from(&self, principal_id: Uuid, target_kind: TargetKind, relation: Relation) -> StoreResult<Vec<ToggleEdge>>;

    // Watch history
    async fn record_watch(&self, user_id: Uuid, video_id: Uuid) -> StoreResult<()>;
    /// Most recently watched first.
    async fn watch_history(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>>;
}
