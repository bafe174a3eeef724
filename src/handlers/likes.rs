use axum::extract::{Path, State};
use axum::Extension;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::api::format::{video_views, VideoView};
use crate::authz::{
    count_active, is_visible, locate_visible_comment, locate_visible_video, parse_id, toggle, Principal, ToggleState,
};
use crate::database::models::{Relation, TargetKind};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LikeToggled {
    pub target_id: Uuid,
    pub state: ToggleState,
    pub is_liked: bool,
    pub likes: u64,
}

#[derive(Debug, Serialize)]
pub struct LikeCount {
    pub target_id: Uuid,
    pub likes: u64,
}

async fn toggle_like(state: &AppState, principal: &Principal, kind: TargetKind, raw_id: &str) -> ApiResult<LikeToggled> {
    let store = state.store.as_ref();
    let outcome = toggle(store, principal, kind, raw_id).await?;
    // Already validated by toggle().
    let target_id = parse_id(kind.into(), raw_id)?;
    let likes = count_active(store, kind, target_id).await?;

    let message = match outcome {
        ToggleState::Active => format!("Liked {}", kind),
        ToggleState::Inactive => format!("Removed like from {}", kind),
    };
    Ok(ApiResponse::success(LikeToggled {
        target_id,
        state: outcome,
        is_liked: outcome.is_active(),
        likes,
    })
    .message(message))
}

/// POST /api/v1/likes/videos/:video_id/toggle - Like or unlike a video
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn toggle_video(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(video_id): Path<String>,
) -> ApiResult<LikeToggled> {
    toggle_like(&state, &principal, TargetKind::Video, &video_id).await
}

/// POST /api/v1/likes/comments/:comment_id/toggle - Like or unlike a comment
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn toggle_comment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(comment_id): Path<String>,
) -> ApiResult<LikeToggled> {
    toggle_like(&state, &principal, TargetKind::Comment, &comment_id).await
}

/// GET /api/v1/likes/videos/:video_id/count
#[instrument(skip(state, principal))]
pub async fn video_count(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    principal: Option<Extension<Principal>>,
) -> ApiResult<LikeCount> {
    let store = state.store.as_ref();
    let viewer = principal.map(|Extension(p)| p);
    let video = locate_visible_video(store, viewer.as_ref(), &video_id).await?;
    let likes = count_active(store, TargetKind::Video, video.id).await?;
    Ok(ApiResponse::success(LikeCount { target_id: video.id, likes }))
}

/// GET /api/v1/likes/comments/:comment_id/count
#[instrument(skip(state, principal))]
pub async fn comment_count(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    principal: Option<Extension<Principal>>,
) -> ApiResult<LikeCount> {
    let store = state.store.as_ref();
    let viewer = principal.map(|Extension(p)| p);
    let comment = locate_visible_comment(store, viewer.as_ref(), &comment_id).await?;
    let likes = count_active(store, TargetKind::Comment, comment.id).await?;
    Ok(ApiResponse::success(LikeCount { target_id: comment.id, likes }))
}

/// GET /api/v1/likes/videos - Videos the principal has liked, newest like first
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn liked_videos(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Vec<VideoView>> {
    let store = state.store.as_ref();
    let edges = store
        .list_edges_from(principal.id, TargetKind::Video, Relation::Like)
        .await?;
    let ids: Vec<Uuid> = edges.iter().map(|e| e.target_id).collect();
    let videos = store
        .find_videos(&ids)
        .await?
        .into_iter()
        .filter(|v| is_visible(v, Some(&principal)))
        .collect();

    Ok(ApiResponse::success(video_views(store, videos).await?).message("Liked videos fetched successfully"))
}
