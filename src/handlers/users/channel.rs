use axum::extract::{Path, State};
use axum::Extension;
use tracing::instrument;

use crate::api::format::{video_views, ChannelProfile, VideoView};
use crate::authz::{count_active, is_active, is_visible, Principal};
use crate::database::models::{Relation, TargetKind};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/v1/users/c/:username - Channel profile with subscription counts
#[instrument(skip(state, principal))]
pub async fn channel_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    principal: Option<Extension<Principal>>,
) -> ApiResult<ChannelProfile> {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err(ApiError::field_error("username", "username is required"));
    }

    let store = state.store.as_ref();
    let channel = store
        .find_user_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::not_found("Channel not found"))?;

    let subscribers_count = count_active(store, TargetKind::Channel, channel.id).await?;
    let subscribed_to_count = store
        .count_edges_from(channel.id, TargetKind::Channel, Relation::Subscribe)
        .await?;
    let is_subscribed = match principal {
        Some(Extension(viewer)) => is_active(store, viewer.id, TargetKind::Channel, channel.id).await?,
        None => false,
    };

    Ok(ApiResponse::success(ChannelProfile {
        id: channel.id,
        username: channel.username,
        full_name: channel.full_name,
        avatar_url: channel.avatar_url,
        cover_image_url: channel.cover_image_url,
        subscribers_count,
        subscribed_to_count,
        is_subscribed,
        created_at: channel.created_at,
    })
    .message("User channel fetched successfully"))
}

/// GET /api/v1/users/history - Videos the principal watched, most recent first
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn watch_history(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Vec<VideoView>> {
    let store = state.store.as_ref();
    let ids = store.watch_history(principal.id).await?;
    let videos = store
        .find_videos(&ids)
        .await?
        .into_iter()
        .filter(|v| is_visible(v, Some(&principal)))
        .collect();

    Ok(ApiResponse::success(video_views(store, videos).await?).message("Watch history fetched successfully"))
}
