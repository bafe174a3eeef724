use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - Service description
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "VidShare API",
            "version": version,
            "environment": state.config.environment,
            "endpoints": {
                "users": "/api/v1/users/*",
                "videos": "/api/v1/videos[/:video_id]",
                "comments": "/api/v1/videos/:video_id/comments, /api/v1/comments/:comment_id",
                "likes": "/api/v1/likes/*",
                "subscriptions": "/api/v1/subscriptions/*",
                "playlists": "/api/v1/playlists[/:playlist_id], /api/v1/channels/:channel_id/playlists",
            }
        }
    }))
}

/// GET /health - Liveness plus a storage round trip
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "storage": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "SERVICE_UNAVAILABLE",
                    "message": "Storage unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
