use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

use crate::database::models::{
    Comment, EdgeKey, NewComment, NewPlaylist, NewUser, NewVideo, Playlist, Relation, TargetKind,
    ToggleEdge, User, Video, VideoFilter,
};
use crate::database::{MemoryStore, Store, StoreError, StoreResult};

/// Memory store that counts every call, for asserting that a request was
/// rejected before reaching storage.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    calls: AtomicUsize,
    /// When set, edge lookups report nothing, as if a concurrent request
    /// inserted the edge between lookup and insert.
    stale_edge_reads: AtomicBool,
    /// When set, `update_video` fails as if the database went away.
    fail_video_updates: AtomicBool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    pub fn set_stale_edge_reads(&self, stale: bool) {
        self.stale_edge_reads.store(stale, Ordering::SeqCst);
    }

    pub fn set_fail_video_updates(&self, fail: bool) {
        self.fail_video_updates.store(fail, Ordering::SeqCst);
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for CountingStore {
    async fn ping(&self) -> StoreResult<()> {
        self.hit();
        self.inner.ping().await
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        self.hit();
        self.inner.insert_user(user).await
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.hit();
        self.inner.find_user(id).await
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.hit();
        self.inner.find_user_by_username(username).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.hit();
        self.inner.find_user_by_email(email).await
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        self.hit();
        self.inner.find_users(ids).await
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        self.hit();
        self.inner.update_user(user).await
    }

    async fn insert_video(&self, video: NewVideo) -> StoreResult<Video> {
        self.hit();
        self.inner.insert_video(video).await
    }

    async fn find_video(&self, id: Uuid) -> StoreResult<Option<Video>> {
        self.hit();
        self.inner.find_video(id).await
    }

    async fn find_videos(&self, ids: &[Uuid]) -> StoreResult<Vec<Video>> {
        self.hit();
        self.inner.find_videos(ids).await
    }

    async fn update_video(&self, video: &Video) -> StoreResult<()> {
        self.hit();
        if self.fail_video_updates.load(Ordering::SeqCst) {
            return Err(StoreError::ConnectionError("connection reset".into()));
        }
        self.inner.update_video(video).await
    }

    async fn increment_views(&self, id: Uuid) -> StoreResult<()> {
        self.hit();
        self.inner.increment_views(id).await
    }

    async fn delete_video(&self, id: Uuid) -> StoreResult<bool> {
        self.hit();
        self.inner.delete_video(id).await
    }

    async fn list_videos(&self, filter: &VideoFilter, skip: u64, limit: u64) -> StoreResult<Vec<Video>> {
        self.hit();
        self.inner.list_videos(filter, skip, limit).await
    }

    async fn count_videos(&self, filter: &VideoFilter) -> StoreResult<u64> {
        self.hit();
        self.inner.count_videos(filter).await
    }

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        self.hit();
        self.inner.insert_comment(comment).await
    }

    async fn find_comment(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        self.hit();
        self.inner.find_comment(id).await
    }

    async fn update_comment(&self, comment: &Comment) -> StoreResult<()> {
        self.hit();
        self.inner.update_comment(comment).await
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        self.hit();
        self.inner.delete_comment(id).await
    }

    async fn list_comments(&self, video_id: Uuid, skip: u64, limit: u64) -> StoreResult<Vec<Comment>> {
        self.hit();
        self.inner.list_comments(video_id, skip, limit).await
    }

    async fn count_comments(&self, video_id: Uuid) -> StoreResult<u64> {
        self.hit();
        self.inner.count_comments(video_id).await
    }

    async fn insert_playlist(&self, playlist: NewPlaylist) -> StoreResult<Playlist> {
        self.hit();
        self.inner.insert_playlist(playlist).await
    }

    async fn find_playlist(&self, id: Uuid) -> StoreResult<Option<Playlist>> {
        self.hit();
        self.inner.find_playlist(id).await
    }

    async fn update_playlist(&self, playlist: &Playlist) -> StoreResult<()> {
        self.hit();
        self.inner.update_playlist(playlist).await
    }

    async fn delete_playlist(&self, id: Uuid) -> StoreResult<bool> {
        self.hit();
        self.inner.delete_playlist(id).await
    }

    async fn add_playlist_video(&self, playlist_id: Uuid, video_id: Uuid) -> StoreResult<bool> {
        self.hit();
        self.inner.add_playlist_video(playlist_id, video_id).await
    }

    async fn remove_playlist_video(&self, playlist_id: Uuid, video_id: Uuid) -> StoreResult<bool> {
        self.hit();
        self.inner.remove_playlist_video(playlist_id, video_id).await
    }

    async fn list_playlists_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Playlist>> {
        self.hit();
        self.inner.list_playlists_by_owner(owner_id).await
    }

    async fn find_edge(&self, key: &EdgeKey) -> StoreResult<Option<ToggleEdge>> {
        self.hit();
        if self.stale_edge_reads.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_edge(key).await
    }

    async fn insert_edge(&self, key: &EdgeKey) -> StoreResult<ToggleEdge> {
        self.hit();
        self.inner.insert_edge(key).await
    }

    async fn delete_edge(&self, id: Uuid) -> StoreResult<bool> {
        self.hit();
        self.inner.delete_edge(id).await
    }

    async fn count_edges_to(&self, target_kind: TargetKind, target_id: Uuid, relation: Relation) -> StoreResult<u64> {
        self.hit();
        self.inner.count_edges_to(target_kind, target_id, relation).await
    }

    async fn count_edges_to_many(
        &self,
        target_kind: TargetKind,
        target_ids: &[Uuid],
        relation: Relation,
    ) -> StoreResult<HashMap<Uuid, u64>> {
        self.hit();
        self.inner.count_edges_to_many(target_kind, target_ids, relation).await
    }

    async fn find_edge_targets(
        &self,
        principal_id: Uuid,
        target_kind: TargetKind,
        target_ids: &[Uuid],
        relation: Relation,
    ) -> StoreResult<HashSet<Uuid>> {
        self.hit();
        self.inner.find_edge_targets(principal_id, target_kind, target_ids, relation).await
    }

    async fn count_edges_from(&self, principal_id: Uuid, target_kind: TargetKind, relation: Relation) -> StoreResult<u64> {
        self.hit();
        self.inner.count_edges_from(principal_id, target_kind, relation).await
    }

    async fn list_edges_from(&self, principal_id: Uuid, target_kind: TargetKind, relation: Relation) -> StoreResult<Vec<ToggleEdge>> {
        self.hit();
        self.inner.list_edges_from(principal_id, target_kind, relation).await
    }

    async fn record_watch(&self, user_id: Uuid, video_id: Uuid) -> StoreResult<()> {
        self.hit();
        self.inner.record_watch(user_id, video_id).await
    }

    async fn watch_history(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        self.hit();
        self.inner.watch_history(user_id).await
    }
}

pub fn new_user(name: &str) -> NewUser {
    NewUser {
        username: name.to_string(),
        email: format!("{}@example.com", name),
        full_name: name.to_string(),
        avatar_url: format!("memory://avatars/{}.png", name),
        avatar_public_id: format!("avatars/{}", name),
        cover_image_url: None,
        cover_image_public_id: None,
        password_hash: "not-a-real-hash".to_string(),
    }
}

pub fn new_video(owner_id: Uuid, title: &str) -> NewVideo {
    NewVideo {
        owner_id,
        video_url: format!("memory://videos/{}.mp4", title),
        video_public_id: format!("videos/{}", title),
        thumbnail_url: format!("memory://thumbs/{}.png", title),
        thumbnail_public_id: format!("thumbs/{}", title),
        title: title.to_string(),
        description: format!("About {}", title),
        duration: 42.0,
    }
}

pub async fn seed_user(store: &dyn Store, name: &str) -> User {
    store.insert_user(new_user(name)).await.expect("seed user")
}

pub async fn seed_video(store: &dyn Store, owner_id: Uuid, title: &str) -> Video {
    store.insert_video(new_video(owner_id, title)).await.expect("seed video")
}

pub async fn seed_comment(store: &dyn Store, video_id: Uuid, owner_id: Uuid, content: &str) -> Comment {
    store
        .insert_comment(NewComment {
            video_id,
            owner_id,
            parent_comment_id: None,
            content: content.to_string(),
        })
        .await
        .expect("seed comment")
}
