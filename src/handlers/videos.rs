use axum::extract::{Multipart, Path, Query, State};
use axum::Extension;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::api::format::{owner_map, video_views, Paged, VideoView};
use crate::authz::{
    cap_raw_limit, count_active, is_active, locate_owned, locate_visible_video, parse_id, PageRequest, Principal,
    ResourceKind,
};
use crate::database::models::{NewVideo, SortDirection, TargetKind, Video, VideoFilter, VideoSortField};
use crate::error::ApiError;
use crate::handlers::multipart::MultipartForm;
use crate::media::{destroy_quietly, MediaKind};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct VideoListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub query: Option<String>,
    #[serde(alias = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(alias = "sortType")]
    pub sort_type: Option<String>,
    #[serde(alias = "userId")]
    pub user_id: Option<String>,
}

impl VideoListQuery {
    /// Listing filter for published videos. Unknown sort keys are rejected
    /// here so they never reach the query builder.
    pub fn to_filter(&self) -> Result<VideoFilter, ApiError> {
        let mut filter = VideoFilter { published_only: true, ..Default::default() };

        if let Some(search) = self.query.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            filter.search = Some(search.to_string());
        }
        if let Some(raw) = self.sort_by.as_deref().filter(|s| !s.is_empty()) {
            filter.sort_by = VideoSortField::parse(raw)
                .ok_or_else(|| ApiError::field_error("sort_by", format!("Cannot sort by '{}'", raw)))?;
        }
        if let Some(raw) = self.sort_type.as_deref().filter(|s| !s.is_empty()) {
            filter.sort_direction = SortDirection::parse(raw)
                .ok_or_else(|| ApiError::field_error("sort_type", "sort_type must be asc or desc"))?;
        }
        if let Some(raw) = self.user_id.as_deref().filter(|s| !s.is_empty()) {
            filter.owner_id = Some(parse_id(ResourceKind::Channel, raw)?);
        }
        Ok(filter)
    }
}

#[derive(Debug, Serialize)]
pub struct PublishState {
    pub id: Uuid,
    pub is_published: bool,
}

/// GET /api/v1/videos - Paginated listing of published videos
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>, Query(query): Query<VideoListQuery>) -> ApiResult<Paged<VideoView>> {
    let filter = query.to_filter()?;
    let store = state.store.as_ref();
    let pagination = &state.config.pagination;

    let total = store.count_videos(&filter).await?;
    let limit = cap_raw_limit(query.limit.as_deref(), pagination.max_limit as u64);
    let page = PageRequest::compute(query.page.as_deref(), limit.as_deref(), total, pagination.default_limit as u64);

    let videos = store.list_videos(&filter, page.skip, page.limit).await?;
    let items = video_views(store, videos).await?;

    Ok(ApiResponse::success(Paged::new(items, total, &page)).message("All videos fetched successfully"))
}

/// GET /api/v1/videos/:video_id - One video; counts a view and records watch history
#[instrument(skip(state, principal))]
pub async fn get(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    principal: Option<Extension<Principal>>,
) -> ApiResult<VideoView> {
    let store = state.store.as_ref();
    let viewer = principal.map(|Extension(p)| p);
    let mut video = locate_visible_video(store, viewer.as_ref(), &video_id).await?;

    store.increment_views(video.id).await?;
    video.views += 1;
    if let Some(viewer) = &viewer {
        store.record_watch(viewer.id, video.id).await?;
    }

    let likes = count_active(store, TargetKind::Video, video.id).await?;
    let is_liked = match &viewer {
        Some(viewer) => is_active(store, viewer.id, TargetKind::Video, video.id).await?,
        None => false,
    };
    let owner = owner_map(store, [video.owner_id]).await?.remove(&video.owner_id);

    Ok(ApiResponse::success(VideoView {
        video,
        owner,
        likes: Some(likes),
        is_liked: Some(is_liked),
    })
    .message("Video fetched successfully"))
}

/// POST /api/v1/videos - Upload a video file and thumbnail
#[instrument(skip(state, principal, multipart), fields(user_id = %principal.id))]
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    multipart: Multipart,
) -> ApiResult<Video> {
    let mut form = MultipartForm::read(multipart).await?;
    let title = form.required_text(&["title"])?;
    let description = form.required_text(&["description"])?;
    let video_file = form.required_file(&["videoFile", "video_file", "video"])?;
    let thumbnail = form.required_file(&["thumbnail"])?;
    video_file.validate(MediaKind::Video)?;
    thumbnail.validate(MediaKind::Image)?;

    let media = state.media.as_ref();
    let uploaded_video = media.upload(video_file, MediaKind::Video).await?;
    let uploaded_thumbnail = match media.upload(thumbnail, MediaKind::Image).await {
        Ok(uploaded) => uploaded,
        Err(e) => {
            destroy_quietly(media, &uploaded_video.public_id, MediaKind::Video).await;
            return Err(e.into());
        }
    };

    let new_video = NewVideo {
        owner_id: principal.id,
        video_url: uploaded_video.url,
        video_public_id: uploaded_video.public_id.clone(),
        thumbnail_url: uploaded_thumbnail.url,
        thumbnail_public_id: uploaded_thumbnail.public_id.clone(),
        title,
        description,
        duration: uploaded_video.duration.unwrap_or(0.0),
    };

    let video = match state.store.insert_video(new_video).await {
        Ok(video) => video,
        Err(e) => {
            destroy_quietly(media, &uploaded_video.public_id, MediaKind::Video).await;
            destroy_quietly(media, &uploaded_thumbnail.public_id, MediaKind::Image).await;
            return Err(e.into());
        }
    };

    tracing::info!("User {} published video {}", principal.id, video.id);
    Ok(ApiResponse::created(video).message("Video published successfully"))
}

/// PATCH /api/v1/videos/:video_id - Update title, description and/or thumbnail
#[instrument(skip(state, principal, multipart), fields(user_id = %principal.id))]
pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(video_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Video> {
    let store = state.store.as_ref();
    let mut video = locate_owned::<Video>(store, &principal, &video_id).await?;

    let mut form = MultipartForm::read(multipart).await?;
    let title = form.text(&["title"]);
    let description = form.text(&["description"]);
    let thumbnail = form.take_file(&["thumbnail"]);
    if title.is_none() && description.is_none() && thumbnail.is_none() {
        return Err(ApiError::validation_error("Provide title, description or thumbnail to update", None));
    }

    let mut replaced_thumbnail = None;
    if let Some(file) = thumbnail {
        file.validate(MediaKind::Image)?;
        let uploaded = state.media.upload(file, MediaKind::Image).await?;
        replaced_thumbnail = Some(std::mem::replace(&mut video.thumbnail_public_id, uploaded.public_id));
        video.thumbnail_url = uploaded.url;
    }
    if let Some(title) = title {
        video.title = title;
    }
    if let Some(description) = description {
        video.description = description;
    }
    video.updated_at = chrono::Utc::now();
    if let Err(e) = store.update_video(&video).await {
        if replaced_thumbnail.is_some() {
            destroy_quietly(state.media.as_ref(), &video.thumbnail_public_id, MediaKind::Image).await;
        }
        return Err(e.into());
    }

    if let Some(old) = replaced_thumbnail {
        destroy_quietly(state.media.as_ref(), &old, MediaKind::Image).await;
    }
    Ok(ApiResponse::success(video).message("Video updated successfully"))
}

/// DELETE /api/v1/videos/:video_id - Remove a video and everything hanging off it
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(video_id): Path<String>,
) -> ApiResult<serde_json::Value> {
    let store = state.store.as_ref();
    let video = locate_owned::<Video>(store, &principal, &video_id).await?;

    if !store.delete_video(video.id).await? {
        return Err(ApiError::not_found("Video not found"));
    }

    destroy_quietly(state.media.as_ref(), &video.video_public_id, MediaKind::Video).await;
    destroy_quietly(state.media.as_ref(), &video.thumbnail_public_id, MediaKind::Image).await;

    tracing::info!("User {} deleted video {}", principal.id, video.id);
    Ok(ApiResponse::success(serde_json::json!({ "id": video.id })).message("Video deleted successfully"))
}

/// PATCH /api/v1/videos/:video_id/publish - Flip the published flag
#[instrument(skip(state, principal), fields(user_id = %principal.id))]
pub async fn toggle_publish(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(video_id): Path<String>,
) -> ApiResult<PublishState> {
    let store = state.store.as_ref();
    let mut video = locate_owned::<Video>(store, &principal, &video_id).await?;

    video.is_published = !video.is_published;
    video.updated_at = chrono::Utc::now();
    store.update_video(&video).await?;

    Ok(ApiResponse::success(PublishState { id: video.id, is_published: video.is_published })
        .message("Publish status toggled successfully"))
}
