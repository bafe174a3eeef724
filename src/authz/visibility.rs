use uuid::Uuid;

use super::error::{AuthzError, AuthzResult};
use super::locator::{locate_by_id, parse_id, ResourceKind};
use super::principal::Principal;
use crate::database::models::{Comment, Video};
use crate::database::Store;

/// Drafts exist only for their owner.
pub fn is_visible(video: &Video, viewer: Option<&Principal>) -> bool {
    video.is_published || viewer.is_some_and(|p| p.id == video.owner_id)
}

/// Locate a video the viewer may see. A draft is reported `NotFound` to
/// everyone but its owner, so strangers cannot tell it exists.
pub async fn locate_visible_video(store: &dyn Store, viewer: Option<&Principal>, raw_id: &str) -> AuthzResult<Video> {
    let id = parse_id(ResourceKind::Video, raw_id)?;
    locate_visible_video_by_id(store, viewer, id).await
}

pub async fn locate_visible_video_by_id(store: &dyn Store, viewer: Option<&Principal>, id: Uuid) -> AuthzResult<Video> {
    let video = locate_by_id::<Video>(store, id).await?;
    if !is_visible(&video, viewer) {
        tracing::debug!("Draft video {} hidden from {:?}", video.id, viewer.map(|p| p.id));
        return Err(AuthzError::NotFound { kind: ResourceKind::Video });
    }
    Ok(video)
}

/// Locate a comment whose video the viewer may see.
pub async fn locate_visible_comment(store: &dyn Store, viewer: Option<&Principal>, raw_id: &str) -> AuthzResult<Comment> {
    let id = parse_id(ResourceKind::Comment, raw_id)?;
    locate_visible_comment_by_id(store, viewer, id).await
}

pub async fn locate_visible_comment_by_id(store: &dyn Store, viewer: Option<&Principal>, id: Uuid) -> AuthzResult<Comment> {
    let comment = locate_by_id::<Comment>(store, id).await?;
    match store.find_video(comment.video_id).await? {
        Some(video) if is_visible(&video, viewer) => Ok(comment),
        _ => {
            tracing::debug!("Comment {} hidden with its video {}", comment.id, comment.video_id);
            Err(AuthzError::NotFound { kind: ResourceKind::Comment })
        }
    }
}
