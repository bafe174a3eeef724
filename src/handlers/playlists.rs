use axum::extract::{Path, State};
use axum::Extension;
use serde::Deserialize;
use tracing::instrument;

use crate::api::format::{owner_map, video_views, PlaylistSummary, PlaylistView};
use crate::authz::{
    is_visible, locate, locate_owned, locate_visible_video, locate_visible_video_by_id, parse_id, Principal, ResourceKind,
};
use crate::database::models::{NewPlaylist, Playlist, User, Video};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AppJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(alias = "videoId")]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Playlist with owner and the videos the viewer may see, in playlist order.
async fn playlist_view(state: &AppState, playlist: Playlist, viewer: Option<&Principal>) -> Result<PlaylistView, ApiError> {
    let store = state.store.as_ref();
    let videos: Vec<Video> = store
        .find_videos(&playlist.video_ids)
        .await?
        .into_iter()
        .filter(|v| is_visible(v, viewer))
        .collect();
    let total_views = videos.iter().map(|v| v.views).sum();
    let videos = video_views(store, videos).await?;
    let owner = owner_map(store, [playlist.owner_id]).await?.remove(&playlist.owner_id);

    Ok(PlaylistView {
        total_videos: videos.len(),
        total_views,
        owner,
        videos,
        playlist,
    })
}

/// POST /api/v1/playlists - Create a playlist, optionally seeded with one video
#[instrument(skip(state, principal, payload), fields(user_id = %principal.id))]
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    AppJson(payload): AppJson<CreatePlaylistRequest>,
) -> ApiResult<PlaylistView> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::field_error("name", "name is required"));
    }

    let store = state.store.as_ref();
    let first_video = match payload.video_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(locate_visible_video(store, Some(&principal), raw).await?.id),
        None => None,
    };

    let playlist = store
        .insert_playlist(NewPlaylist {
            owner_id: principal.id,
            name,
            description: payload.description.map(|d| d.trim().to_string()).unwrap_or_default(),
            first_video,
        })
        .await?;

    let view = playlist_view(&state, playlist, Some(&principal)).await?;
    Ok(ApiResponse::created(view).message("Playlist created successfully"))
}

/// GET /api/v1/playlists/:playlist_id - Playlist with its videos
#[instrument(skip(state, principal))]
pub async fn get(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
    principal: Option<Extension<Principal>>,
) -> ApiResult<PlaylistView> {
    let playlist = locate::<Playlist>(state.store.as_ref(), &playlist_id).await?;
    let viewer = principal.map(|Extension(p)| p);
    let view = playlist_view(&state, playlist, viewer.as_ref()).await?;
    Ok(ApiResponse::success(view).message("Playlist fetched successfully"))
}

/// GET /api/v1/channels/:channel_id/playlists - A channel's playlists
#[instrument(skip(state))]
pub async fn list_for_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> ApiResult<Vec<PlaylistSummary>> {
    let store = state.store.as_ref();
    let channel = locate::<User>(store, &channel_id).await?;
    let playlists: Vec<PlaylistSummary> = store
        .list_playlists_by_owner(channel.id)
        .await?
        .into_iter()
        .map(PlaylistSummary::from)
        .collect();
    Ok(ApiResponse::success(playlists).message("User playlists fetched successfully"))
}

/// PATCH /api/v1/playlists/:playlist_id - Rename or re-describe one's own playlist
#[instrument(skip(state, principal, payload), fields(user_id = %principal.id))]
pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(playlist_id): Path<String>,
    AppJson(payload): AppJson<UpdatePlaylistRequest>,
) -> ApiResult<Playlist> {
    let store = state.store.as_ref();
    let mut playlist = locate_owned::<Playlist>(store, &principal, &playlist_id).await?;

    let name = payload.name.map(|s| s.trim().to_string());
    if name.as_deref() == Some("") {
        return Err(ApiError::field_error("name", "name cannot be blank"));
    }
    let description = payload.description.map(|s| s.trim().to_string());
    if name.is_none() && description.is_none() {
        return Err(ApiError::validation_error("Provide name or description to update", None));
    }

    if let Some(name) = name {
        playlist.name = name;
    }
    if let Some(description) = description {
        playlist.description = description;
    }
    playlist.updated_at = chrono::Utc::now();
    store.update_playlist(&playlist).await?;

    Ok(ApiResponse::success(playlist).message("Playlist updated successfully"))
}

/// DELETE /api/v1/playlists/:playlist_id
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(playlist_id): Path<String>,
) -> ApiResult<serde_json::Value> {
    let store = state.store.as_ref();
    let playlist = locate_owned::<Playlist>(store, &principal, &playlist_id).await?;

    if !store.delete_playlist(playlist.id).await? {
        return Err(ApiError::not_found("Playlist not found"));
    }
    Ok(ApiResponse::success(serde_json::json!({ "id": playlist.id })).message("Playlist deleted successfully"))
}

/// PATCH /api/v1/playlists/:playlist_id/videos/:video_id - Put a video at the front
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn add_video(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> ApiResult<PlaylistView> {
    let store = state.store.as_ref();
    // Both ids are checked before the playlist is read.
    let video_uuid = parse_id(ResourceKind::Video, &video_id)?;
    let mut playlist = locate_owned::<Playlist>(store, &principal, &playlist_id).await?;
    let video = locate_visible_video_by_id(store, Some(&principal), video_uuid).await?;

    if !store.add_playlist_video(playlist.id, video.id).await? {
        return Err(ApiError::conflict("Video is already in this playlist"));
    }
    playlist.push_front(video.id);

    let view = playlist_view(&state, playlist, Some(&principal)).await?;
    Ok(ApiResponse::success(view).message("Video added to playlist"))
}

/// DELETE /api/v1/playlists/:playlist_id/videos/:video_id
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn remove_video(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> ApiResult<PlaylistView> {
    let store = state.store.as_ref();
    let video_id = parse_id(ResourceKind::Video, &video_id)?;
    let mut playlist = locate_owned::<Playlist>(store, &principal, &playlist_id).await?;

    if !store.remove_playlist_video(playlist.id, video_id).await? {
        return Err(ApiError::not_found("Video is not in this playlist"));
    }
    playlist.remove_video(video_id);

    let view = playlist_view(&state, playlist, Some(&principal)).await?;
    Ok(ApiResponse::success(view).message("Video removed from playlist"))
}
