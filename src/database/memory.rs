use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::StoreError;
use super::models::{
    Comment, EdgeKey, NewComment, NewPlaylist, NewUser, NewVideo, Playlist, Relation, SortDirection,
    TargetKind, ToggleEdge, User, Video, VideoFilter, VideoSortField,
};
use super::store::{Store, StoreResult};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    videos: HashMap<Uuid, Video>,
    comments: HashMap<Uuid, Comment>,
    playlists: HashMap<Uuid, Playlist>,
    edges: HashMap<Uuid, ToggleEdge>,
    edge_index: HashMap<EdgeKey, Uuid>,
    history: HashMap<Uuid, Vec<Uuid>>,
    /// Insertion sequence per row id, used to order rows created in the same instant.
    seq: HashMap<Uuid, u64>,
    next_seq: u64,
}

impl Tables {
    fn stamp(&mut self, id: Uuid) {
        self.next_seq += 1;
        self.seq.insert(id, self.next_seq);
    }

    fn forget(&mut self, id: &Uuid) {
        self.seq.remove(id);
    }

    fn seq_of(&self, id: &Uuid) -> u64 {
        self.seq.get(id).copied().unwrap_or_default()
    }

    fn username_taken(&self, username: &str, except: Option<Uuid>) -> bool {
        self.users.values().any(|u| u.username == username && Some(u.id) != except)
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users.values().any(|u| u.email == email && Some(u.id) != except)
    }

    fn playlist_name_taken(&self, owner_id: Uuid, name: &str, except: Option<Uuid>) -> bool {
        self.playlists
            .values()
            .any(|p| p.owner_id == owner_id && p.name == name && Some(p.id) != except)
    }

    fn remove_edges_to(&mut self, target_kind: TargetKind, target_id: Uuid) {
        let doomed: Vec<Uuid> = self
            .edges
            .values()
            .filter(|e| e.target_kind == target_kind && e.target_id == target_id)
            .map(|e| e.id)
            .collect();
        for id in doomed {
            if let Some(edge) = self.edges.remove(&id) {
                self.edge_index.remove(&edge.key());
                self.forget(&id);
            }
        }
    }

    /// Removes a comment, its replies and the likes on all of them.
    fn remove_comment_tree(&mut self, id: Uuid) -> bool {
        if self.comments.remove(&id).is_none() {
            return false;
        }
        self.forget(&id);
        self.remove_edges_to(TargetKind::Comment, id);
        let replies: Vec<Uuid> = self
            .comments
            .values()
            .filter(|c| c.parent_comment_id == Some(id))
            .map(|c| c.id)
            .collect();
        for reply in replies {
            self.remove_comment_tree(reply);
        }
        true
    }
}

/// In-process store used for development and tests.
///
/// Every operation takes the single table lock, so read-then-write sequences
/// inside one method are atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare_videos(a: &Video, b: &Video, sort_by: VideoSortField) -> Ordering {
    match sort_by {
        VideoSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        VideoSortField::Views => a.views.cmp(&b.views),
        VideoSortField::Duration => a.duration.partial_cmp(&b.duration).unwrap_or(Ordering::Equal),
        VideoSortField::Title => a.title.cmp(&b.title),
    }
}

fn page<T>(items: Vec<T>, skip: u64, limit: u64) -> Vec<T> {
    items
        .into_iter()
        .skip(usize::try_from(skip).unwrap_or(usize::MAX))
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .collect()
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.username_taken(&user.username, None) {
            return Err(StoreError::Conflict("users_username_key".into()));
        }
        if tables.email_taken(&user.email, None) {
            return Err(StoreError::Conflict("users_email_key".into()));
        }
        let user = user.into_user(Uuid::new_v4(), Utc::now());
        tables.stamp(user.id);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.users.get(id).cloned()).collect())
    }

    async fn update_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user.id) {
            return Err(StoreError::NotFound("user"));
        }
        if tables.username_taken(&user.username, Some(user.id)) {
            return Err(StoreError::Conflict("users_username_key".into()));
        }
        if tables.email_taken(&user.email, Some(user.id)) {
            return Err(StoreError::Conflict("users_email_key".into()));
        }
        let mut updated = user.clone();
        updated.updated_at = Utc::now();
        tables.users.insert(user.id, updated);
        Ok(())
    }

    async fn insert_video(&self, video: NewVideo) -> StoreResult<Video> {
        let mut tables = self.tables.write().await;
        let video = video.into_video(Uuid::new_v4(), Utc::now());
        tables.stamp(video.id);
        tables.videos.insert(video.id, video.clone());
        Ok(video)
    }

    async fn find_video(&self, id: Uuid) -> StoreResult<Option<Video>> {
        Ok(self.tables.read().await.videos.get(&id).cloned())
    }

    async fn find_videos(&self, ids: &[Uuid]) -> StoreResult<Vec<Video>> {
        let tables = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| tables.videos.get(id).cloned()).collect())
    }

    async fn update_video(&self, video: &Video) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.videos.get_mut(&video.id) else {
            return Err(StoreError::NotFound("video"));
        };
        // Views are only moved by increment_views.
        let views = stored.views;
        *stored = video.clone();
        stored.views = views;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn increment_views(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(video) = tables.videos.get_mut(&id) {
            video.views += 1;
        }
        Ok(())
    }

    async fn delete_video(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.videos.remove(&id).is_none() {
            return Ok(false);
        }
        tables.forget(&id);
        let comments: Vec<Uuid> = tables
            .comments
            .values()
            .filter(|c| c.video_id == id)
            .map(|c| c.id)
            .collect();
        for comment in comments {
            tables.remove_comment_tree(comment);
        }
        tables.remove_edges_to(TargetKind::Video, id);
        for playlist in tables.playlists.values_mut() {
            playlist.remove_video(id);
        }
        for history in tables.history.values_mut() {
            history.retain(|v| *v != id);
        }
        Ok(true)
    }

    async fn list_videos(&self, filter: &VideoFilter, skip: u64, limit: u64) -> StoreResult<Vec<Video>> {
        let tables = self.tables.read().await;
        let mut videos: Vec<Video> = tables.videos.values().filter(|v| filter.matches(v)).cloned().collect();
        videos.sort_by(|a, b| {
            let ordering = compare_videos(a, b, filter.sort_by)
                .then_with(|| tables.seq_of(&a.id).cmp(&tables.seq_of(&b.id)));
            match filter.sort_direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        Ok(page(videos, skip, limit))
    }

    async fn count_videos(&self, filter: &VideoFilter) -> StoreResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables.videos.values().filter(|v| filter.matches(v)).count() as u64)
    }

    async fn insert_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.videos.contains_key(&comment.video_id) {
            return Err(StoreError::NotFound("video"));
        }
        let comment = comment.into_comment(Uuid::new_v4(), Utc::now());
        tables.stamp(comment.id);
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn update_comment(&self, comment: &Comment) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.comments.get_mut(&comment.id) else {
            return Err(StoreError::NotFound("comment"));
        };
        stored.content = comment.content.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.write().await.remove_comment_tree(id))
    }

    async fn list_comments(&self, video_id: Uuid, skip: u64, limit: u64) -> StoreResult<Vec<Comment>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.video_id == video_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| std::cmp::Reverse(tables.seq_of(&c.id)));
        Ok(page(comments, skip, limit))
    }

    async fn count_comments(&self, video_id: Uuid) -> StoreResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables.comments.values().filter(|c| c.video_id == video_id).count() as u64)
    }

    async fn insert_playlist(&self, playlist: NewPlaylist) -> StoreResult<Playlist> {
        let mut tables = self.tables.write().await;
        if tables.playlist_name_taken(playlist.owner_id, &playlist.name, None) {
            return Err(StoreError::Conflict("playlists_owner_id_name_key".into()));
        }
        let playlist = playlist.into_playlist(Uuid::new_v4(), Utc::now());
        tables.stamp(playlist.id);
        tables.playlists.insert(playlist.id, playlist.clone());
        Ok(playlist)
    }

    async fn find_playlist(&self, id: Uuid) -> StoreResult<Option<Playlist>> {
        Ok(self.tables.read().await.playlists.get(&id).cloned())
    }

    async fn update_playlist(&self, playlist: &Playlist) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.playlist_name_taken(playlist.owner_id, &playlist.name, Some(playlist.id)) {
            return Err(StoreError::Conflict("playlists_owner_id_name_key".into()));
        }
        let Some(stored) = tables.playlists.get_mut(&playlist.id) else {
            return Err(StoreError::NotFound("playlist"));
        };
        stored.name = playlist.name.clone();
        stored.description = playlist.description.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_playlist(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.playlists.remove(&id).is_none() {
            return Ok(false);
        }
        tables.forget(&id);
        Ok(true)
    }

    async fn add_playlist_video(&self, playlist_id: Uuid, video_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.videos.contains_key(&video_id) {
            return Err(StoreError::NotFound("video"));
        }
        let Some(playlist) = tables.playlists.get_mut(&playlist_id) else {
            return Err(StoreError::NotFound("playlist"));
        };
        let added = playlist.push_front(video_id);
        if added {
            playlist.updated_at = Utc::now();
        }
        Ok(added)
    }

    async fn remove_playlist_video(&self, playlist_id: Uuid, video_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let Some(playlist) = tables.playlists.get_mut(&playlist_id) else {
            return Err(StoreError::NotFound("playlist"));
        };
        let removed = playlist.remove_video(video_id);
        if removed {
            playlist.updated_at = Utc::now();
        }
        Ok(removed)
    }

    async fn list_playlists_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Playlist>> {
        let tables = self.tables.read().await;
        let mut playlists: Vec<Playlist> = tables
            .playlists
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        playlists.sort_by_key(|p| std::cmp::Reverse(tables.seq_of(&p.id)));
        Ok(playlists)
    }

    async fn find_edge(&self, key: &EdgeKey) -> StoreResult<Option<ToggleEdge>> {
        let tables = self.tables.read().await;
        Ok(tables.edge_index.get(key).and_then(|id| tables.edges.get(id)).cloned())
    }

    async fn insert_edge(&self, key: &EdgeKey) -> StoreResult<ToggleEdge> {
        let mut tables = self.tables.write().await;
        if tables.edge_index.contains_key(key) {
            return Err(StoreError::Conflict("toggle_edges_unique_tuple".into()));
        }
        let edge = ToggleEdge {
            id: Uuid::new_v4(),
            principal_id: key.principal_id,
            target_kind: key.target_kind,
            target_id: key.target_id,
            relation: key.relation,
            created_at: Utc::now(),
        };
        tables.stamp(edge.id);
        tables.edge_index.insert(*key, edge.id);
        tables.edges.insert(edge.id, edge.clone());
        Ok(edge)
    }

    async fn delete_edge(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.edges.remove(&id) {
            Some(edge) => {
                tables.edge_index.remove(&edge.key());
                tables.forget(&id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_edges_to(&self, target_kind: TargetKind, target_id: Uuid, relation: Relation) -> StoreResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .edges
            .values()
            .filter(|e| e.target_kind == target_kind && e.target_id == target_id && e.relation == relation)
            .count() as u64)
    }

    async fn count_edges_to_many(
        &self,
        target_kind: TargetKind,
        target_ids: &[Uuid],
        relation: Relation,
    ) -> StoreResult<HashMap<Uuid, u64>> {
        let tables = self.tables.read().await;
        let wanted: HashSet<&Uuid> = target_ids.iter().collect();
        let mut counts = HashMap::new();
        for edge in tables.edges.values() {
            if edge.target_kind == target_kind && edge.relation == relation && wanted.contains(&edge.target_id) {
                *counts.entry(edge.target_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn find_edge_targets(
        &self,
        principal_id: Uuid,
        target_kind: TargetKind,
        target_ids: &[Uuid],
        relation: Relation,
    ) -> StoreResult<HashSet<Uuid>> {
        let tables = self.tables.read().await;
        Ok(target_ids
            .iter()
            .filter(|id| tables.edge_index.contains_key(&EdgeKey {
                principal_id,
                target_kind,
                target_id: **id,
                relation,
            }))
            .copied()
            .collect())
    }

    async fn count_edges_from(&self, principal_id: Uuid, target_kind: TargetKind, relation: Relation) -> StoreResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .edges
            .values()
            .filter(|e| e.principal_id == principal_id && e.target_kind == target_kind && e.relation == relation)
            .count() as u64)
    }

    async fn list_edges_from(&self, principal_id: Uuid, target_kind: TargetKind, relation: Relation) -> StoreResult<Vec<ToggleEdge>> {
        let tables = self.tables.read().await;
        let mut edges: Vec<ToggleEdge> = tables
            .edges
            .values()
            .filter(|e| e.principal_id == principal_id && e.target_kind == target_kind && e.relation == relation)
            .cloned()
            .collect();
        edges.sort_by_key(|e| std::cmp::Reverse(tables.seq_of(&e.id)));
        Ok(edges)
    }

    async fn record_watch(&self, user_id: Uuid, video_id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let history = tables.history.entry(user_id).or_default();
        history.retain(|v| *v != video_id);
        history.insert(0, video_id);
        Ok(())
    }

    async fn watch_history(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let tables = self.tables.read().await;
        Ok(tables.history.get(&user_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            full_name: name.to_string(),
            avatar_url: "memory://avatar.png".into(),
            avatar_public_id: "avatar".into(),
            cover_image_url: None,
            cover_image_public_id: None,
            password_hash: "hash".into(),
        }
    }

    fn new_video(owner_id: Uuid, title: &str) -> NewVideo {
        NewVideo {
            owner_id,
            video_url: "memory://v.mp4".into(),
            video_public_id: "v".into(),
            thumbnail_url: "memory://t.png".into(),
            thumbnail_public_id: "t".into(),
            title: title.into(),
            description: "desc".into(),
            duration: 3.0,
        }
    }

    #[tokio::test]
    async fn rejects_duplicate_username_and_email() {
        let store = MemoryStore::new();
        store.insert_user(new_user("alice")).await.unwrap();

        let err = store.insert_user(new_user("alice")).await.unwrap_err();
        assert!(err.is_conflict());

        let mut other = new_user("bob");
        other.email = "alice@example.com".into();
        assert!(store.insert_user(other).await.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn edge_tuple_is_unique() {
        let store = MemoryStore::new();
        let key = EdgeKey::new(Uuid::new_v4(), TargetKind::Video, Uuid::new_v4());

        let edge = store.insert_edge(&key).await.unwrap();
        assert!(store.insert_edge(&key).await.unwrap_err().is_conflict());
        assert_eq!(store.find_edge(&key).await.unwrap().map(|e| e.id), Some(edge.id));

        assert!(store.delete_edge(edge.id).await.unwrap());
        assert!(!store.delete_edge(edge.id).await.unwrap());
        assert!(store.find_edge(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_video_cascades() {
        let store = MemoryStore::new();
        let owner = store.insert_user(new_user("owner")).await.unwrap();
        let video = store.insert_video(new_video(owner.id, "clip")).await.unwrap();
        let comment = store
            .insert_comment(NewComment {
                video_id: video.id,
                owner_id: owner.id,
                parent_comment_id: None,
                content: "first".into(),
            })
            .await
            .unwrap();
        let reply = store
            .insert_comment(NewComment {
                video_id: video.id,
                owner_id: owner.id,
                parent_comment_id: Some(comment.id),
                content: "reply".into(),
            })
            .await
            .unwrap();
        store.insert_edge(&EdgeKey::new(owner.id, TargetKind::Video, video.id)).await.unwrap();
        store.insert_edge(&EdgeKey::new(owner.id, TargetKind::Comment, reply.id)).await.unwrap();
        let playlist = store
            .insert_playlist(NewPlaylist {
                owner_id: owner.id,
                name: "mix".into(),
                description: String::new(),
                first_video: Some(video.id),
            })
            .await
            .unwrap();
        store.record_watch(owner.id, video.id).await.unwrap();

        assert!(store.delete_video(video.id).await.unwrap());

        assert!(store.find_comment(comment.id).await.unwrap().is_none());
        assert!(store.find_comment(reply.id).await.unwrap().is_none());
        assert_eq!(store.count_edges_from(owner.id, TargetKind::Video, Relation::Like).await.unwrap(), 0);
        assert_eq!(store.count_edges_from(owner.id, TargetKind::Comment, Relation::Like).await.unwrap(), 0);
        assert!(store.find_playlist(playlist.id).await.unwrap().unwrap().video_ids.is_empty());
        assert!(store.watch_history(owner.id).await.unwrap().is_empty());

        // Only the surviving user and playlist keep an ordering entry.
        let tables = store.tables.read().await;
        let mut remaining: Vec<Uuid> = tables.seq.keys().copied().collect();
        remaining.sort();
        let mut expected = vec![owner.id, playlist.id];
        expected.sort();
        assert_eq!(remaining, expected);
    }

    #[tokio::test]
    async fn deletes_release_ordering_entries() {
        let store = MemoryStore::new();
        let owner = store.insert_user(new_user("owner")).await.unwrap();
        let video = store.insert_video(new_video(owner.id, "clip")).await.unwrap();
        let edge = store.insert_edge(&EdgeKey::new(owner.id, TargetKind::Video, video.id)).await.unwrap();
        let playlist = store
            .insert_playlist(NewPlaylist {
                owner_id: owner.id,
                name: "mix".into(),
                description: String::new(),
                first_video: None,
            })
            .await
            .unwrap();
        assert_eq!(store.tables.read().await.seq.len(), 4);

        assert!(store.delete_edge(edge.id).await.unwrap());
        assert!(store.delete_playlist(playlist.id).await.unwrap());
        assert!(!store.delete_playlist(playlist.id).await.unwrap());
        assert_eq!(store.tables.read().await.seq.len(), 2);
    }

    #[tokio::test]
    async fn lists_videos_with_filter_sort_and_page() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        for title in ["b", "a", "c"] {
            store.insert_video(new_video(owner, title)).await.unwrap();
        }
        let filter = VideoFilter {
            sort_by: VideoSortField::Title,
            sort_direction: SortDirection::Asc,
            ..Default::default()
        };

        let titles: Vec<String> = store
            .list_videos(&filter, 1, 5)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.title)
            .collect();
        assert_eq!(titles, vec!["b", "c"]);
        assert_eq!(store.count_videos(&filter).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn watch_history_moves_rewatched_video_to_front() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
        store.record_watch(user, first).await.unwrap();
        store.record_watch(user, second).await.unwrap();
        store.record_watch(user, first).await.unwrap();
        assert_eq!(store.watch_history(user).await.unwrap(), vec![first, second]);
    }
}
