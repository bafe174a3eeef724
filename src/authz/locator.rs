use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

use super::error::{AuthzError, AuthzResult};
use crate::database::models::{Comment, Playlist, User, Video};
use crate::database::{Store, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Video,
    Comment,
    Playlist,
    /// A user seen as the target of a subscription.
    Channel,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Video => "video",
            ResourceKind::Comment => "comment",
            ResourceKind::Playlist => "playlist",
            ResourceKind::Channel => "channel",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Video => "Video",
            ResourceKind::Comment => "Comment",
            ResourceKind::Playlist => "Playlist",
            ResourceKind::Channel => "Channel",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate a client-supplied identifier without touching storage.
///
/// Any UUID encoding the `uuid` crate accepts (hyphenated, simple, braced,
/// either case) yields the same value, so comparisons downstream are on the
/// canonical form.
pub fn parse_id(kind: ResourceKind, raw: &str) -> AuthzResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| {
        tracing::debug!("Rejected malformed {} id '{}'", kind, raw);
        AuthzError::MalformedId { kind, raw: raw.to_string() }
    })
}

/// A stored entity that can be fetched by id.
#[async_trait]
pub trait Locate: Sized + Send {
    const KIND: ResourceKind;

    async fn fetch(store: &dyn Store, id: Uuid) -> StoreResult<Option<Self>>;
}

#[async_trait]
impl Locate for Video {
    const KIND: ResourceKind = ResourceKind::Video;

    async fn fetch(store: &dyn Store, id: Uuid) -> StoreResult<Option<Self>> {
        store.find_video(id).await
    }
}

#[async_trait]
impl Locate for Comment {
    const KIND: ResourceKind = ResourceKind::Comment;

    async fn fetch(store: &dyn Store, id: Uuid) -> StoreResult<Option<Self>> {
        store.find_comment(id).await
    }
}

#[async_trait]
impl Locate for Playlist {
    const KIND: ResourceKind = ResourceKind::Playlist;

    async fn fetch(store: &dyn Store, id: Uuid) -> StoreResult<Option<Self>> {
        store.find_playlist(id).await
    }
}

#[async_trait]
impl Locate for User {
    const KIND: ResourceKind = ResourceKind::Channel;

    async fn fetch(store: &dyn Store, id: Uuid) -> StoreResult<Option<Self>> {
        store.find_user(id).await
    }
}

/// Parse `raw` and fetch the resource, failing `MalformedId` or `NotFound`.
pub async fn locate<T: Locate>(store: &dyn Store, raw: &str) -> AuthzResult<T> {
    let id = parse_id(T::KIND, raw)?;
    locate_by_id(store, id).await
}

pub async fn locate_by_id<T: Locate>(store: &dyn Store, id: Uuid) -> AuthzResult<T> {
    T::fetch(store, id)
        .await?
        .ok_or(AuthzError::NotFound { kind: T::KIND })
}
