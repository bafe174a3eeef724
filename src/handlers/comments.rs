use axum::extract::{Path, Query, State};
use axum::Extension;
use serde::Deserialize;
use tracing::instrument;

use crate::api::format::{owner_map, CommentView, Paged};
use crate::authz::{
    active_among, cap_raw_limit, count_active_many, locate, locate_owned, locate_visible_video, PageRequest,
    Principal,
};
use crate::database::models::{Comment, NewComment, TargetKind};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AppJson};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CommentListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "parentComment")]
    pub parent_comment: Option<String>,
}

fn required_content(content: &str) -> Result<String, ApiError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ApiError::field_error("content", "content is required"));
    }
    Ok(content.to_string())
}

/// GET /api/v1/videos/:video_id/comments - Paginated comments, newest first
#[instrument(skip(state, principal))]
pub async fn list(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(query): Query<CommentListQuery>,
    principal: Option<Extension<Principal>>,
) -> ApiResult<Paged<CommentView>> {
    let store = state.store.as_ref();
    let viewer = principal.map(|Extension(p)| p);
    let video = locate_visible_video(store, viewer.as_ref(), &video_id).await?;
    let pagination = &state.config.pagination;

    let total = store.count_comments(video.id).await?;
    let limit = cap_raw_limit(query.limit.as_deref(), pagination.max_limit as u64);
    let page = PageRequest::compute(query.page.as_deref(), limit.as_deref(), total, pagination.default_limit as u64);

    let comments = store.list_comments(video.id, page.skip, page.limit).await?;
    let owners = owner_map(store, comments.iter().map(|c| c.owner_id)).await?;
    // One batched read each for like counts and the viewer's own likes.
    let ids: Vec<_> = comments.iter().map(|c| c.id).collect();
    let likes = count_active_many(store, TargetKind::Comment, &ids).await?;
    let liked = match &viewer {
        Some(viewer) => active_among(store, viewer.id, TargetKind::Comment, &ids).await?,
        None => Default::default(),
    };

    let items: Vec<CommentView> = comments
        .into_iter()
        .map(|comment| CommentView {
            owner: owners.get(&comment.owner_id).cloned(),
            likes: likes.get(&comment.id).copied().unwrap_or_default(),
            is_liked: liked.contains(&comment.id),
            comment,
        })
        .collect();

    Ok(ApiResponse::success(Paged::new(items, total, &page)).message("Comments fetched successfully"))
}

/// POST /api/v1/videos/:video_id/comments - Comment on a video, optionally as a reply
#[instrument(skip(state, principal, payload), fields(user_id = %principal.id))]
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(video_id): Path<String>,
    AppJson(payload): AppJson<CommentRequest>,
) -> ApiResult<CommentView> {
    let store = state.store.as_ref();
    let video = locate_visible_video(store, Some(&principal), &video_id).await?;
    let content = required_content(&payload.content)?;

    let parent_comment_id = match payload.parent_comment.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => {
            let parent = locate::<Comment>(store, raw).await?;
            if parent.video_id != video.id {
                return Err(ApiError::field_error("parent_comment", "Parent comment belongs to a different video"));
            }
            Some(parent.id)
        }
        None => None,
    };

    let comment = store
        .insert_comment(NewComment {
            video_id: video.id,
            owner_id: principal.id,
            parent_comment_id,
            content,
        })
        .await?;

    let owner = owner_map(store, [principal.id]).await?.remove(&principal.id);
    Ok(ApiResponse::created(CommentView { comment, owner, likes: 0, is_liked: false })
        .message("Comment added successfully"))
}

/// PATCH /api/v1/comments/:comment_id - Edit the text of one's own comment
#[instrument(skip(state, principal, payload), fields(user_id = %principal.id))]
pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(comment_id): Path<String>,
    AppJson(payload): AppJson<CommentRequest>,
) -> ApiResult<Comment> {
    let store = state.store.as_ref();
    let mut comment = locate_owned::<Comment>(store, &principal, &comment_id).await?;

    comment.content = required_content(&payload.content)?;
    comment.updated_at = chrono::Utc::now();
    store.update_comment(&comment).await?;

    Ok(ApiResponse::success(comment).message("Comment updated successfully"))
}

/// DELETE /api/v1/comments/:comment_id - Delete one's own comment and its replies
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(comment_id): Path<String>,
) -> ApiResult<serde_json::Value> {
    let store = state.store.as_ref();
    let comment = locate_owned::<Comment>(store, &principal, &comment_id).await?;

    if !store.delete_comment(comment.id).await? {
        return Err(ApiError::not_found("Comment not found"));
    }
    Ok(ApiResponse::success(serde_json::json!({ "id": comment.id })).message("Comment deleted successfully"))
}
