use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{comments, health, likes, playlists, subscriptions, users, videos};
use crate::middleware::{attach_principal, require_auth};
use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v1";

/// The full application router with global middleware applied.
pub fn app(state: AppState) -> Router {
    let api = Router::new().merge(public_routes(&state)).merge(protected_routes(&state));

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .nest(API_PREFIX, api)
        .layer(DefaultBodyLimit::max(state.config.security.max_request_size_bytes))
        .layer(cors_layer(&state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Reachable without a token. A valid token still attaches the principal so
/// responses can be personalised.
fn public_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        // Account lifecycle
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/refresh-token", post(users::refresh_token))
        .route("/users/c/:username", get(users::channel_profile))
        // Videos and comments
        .route("/videos", get(videos::list))
        .route("/videos/:video_id", get(videos::get))
        .route("/videos/:video_id/comments", get(comments::list))
        // Counters
        .route("/likes/videos/:video_id/count", get(likes::video_count))
        .route("/likes/comments/:comment_id/count", get(likes::comment_count))
        .route("/subscriptions/channels/:channel_id/count", get(subscriptions::subscriber_count))
        // Playlists
        .route("/channels/:channel_id/playlists", get(playlists::list_for_channel))
        .route("/playlists/:playlist_id", get(playlists::get))
        .route_layer(from_fn_with_state(state.clone(), attach_principal))
}

/// Require a verified principal before any handler (and so any lookup) runs.
fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // Account
        .route("/users/logout", post(users::logout))
        .route("/users/change-password", post(users::change_password))
        .route("/users/current-user", get(users::current_user))
        .route("/users/update-account", patch(users::update_account))
        .route("/users/avatar", patch(users::update_avatar))
        .route("/users/cover-image", patch(users::update_cover_image))
        .route("/users/history", get(users::watch_history))
        // Videos
        .route("/videos", post(videos::create))
        .route("/videos/:video_id", patch(videos::update).delete(videos::delete))
        .route("/videos/:video_id/publish", patch(videos::toggle_publish))
        // Comments
        .route("/videos/:video_id/comments", post(comments::create))
        .route("/comments/:comment_id", patch(comments::update).delete(comments::delete))
        // Likes
        .route("/likes/videos", get(likes::liked_videos))
        .route("/likes/videos/:video_id/toggle", post(likes::toggle_video))
        .route("/likes/comments/:comment_id/toggle", post(likes::toggle_comment))
        // Subscriptions
        .route("/subscriptions/me", get(subscriptions::my_subscriptions))
        .route("/subscriptions/channels/:channel_id/toggle", post(subscriptions::toggle_subscription))
        // Playlists
        .route("/playlists", post(playlists::create))
        .route("/playlists/:playlist_id", patch(playlists::update).delete(playlists::delete))
        .route(
            "/playlists/:playlist_id/videos/:video_id",
            patch(playlists::add_video).delete(playlists::remove_video),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth))
}

/// Cookies carry the session, so origins are listed explicitly.
fn cors_layer(state: &AppState) -> CorsLayer {
    let origins: Vec<HeaderValue> = state
        .config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
