use axum::extract::{Multipart, State};
use axum::Extension;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::TokenPair;
use crate::authz::Principal;
use crate::database::models::{NewUser, User};
use crate::error::ApiError;
use crate::handlers::multipart::MultipartForm;
use crate::media::{destroy_quietly, MediaKind};
use crate::middleware::{ApiResponse, ApiResult, AppJson, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::state::AppState;

use super::{validate_email, upload_image};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(alias = "refreshToken")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Principal,
    pub access_token: String,
    pub refresh_token: String,
}

pub(crate) fn check_password_strength(field: &str, password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::field_error(
            field,
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    Ok(())
}

/// POST /api/v1/users/register - Create an account with an avatar and optional cover image
#[instrument(skip(state, multipart))]
pub async fn register(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Principal> {
    let mut form = MultipartForm::read(multipart).await?;

    let username = form.required_text(&["username"])?.to_lowercase();
    let email = form.required_text(&["email"])?.to_lowercase();
    let full_name = form.required_text(&["fullName", "full_name"])?;
    let password = form.required_secret(&["password"])?;
    validate_email(&email)?;
    check_password_strength("password", &password)?;
    if username.chars().any(char::is_whitespace) {
        return Err(ApiError::field_error("username", "Username cannot contain whitespace"));
    }

    let avatar = form.required_file(&["avatar"])?;
    let cover_image = form.take_file(&["coverImage", "cover_image"]);

    let store = state.store.as_ref();
    if store.find_user_by_username(&username).await?.is_some() {
        return Err(ApiError::conflict("Username is already taken"));
    }
    if store.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::conflict("Email is already registered"));
    }

    let password_hash = hash_password_blocking(password).await?;

    let avatar = upload_image(&state, avatar).await?;
    let cover_image = match cover_image {
        Some(file) => match upload_image(&state, file).await {
            Ok(uploaded) => Some(uploaded),
            Err(e) => {
                destroy_quietly(state.media.as_ref(), &avatar.public_id, MediaKind::Image).await;
                return Err(e);
            }
        },
        None => None,
    };

    let new_user = NewUser {
        username,
        email,
        full_name,
        avatar_url: avatar.url,
        avatar_public_id: avatar.public_id.clone(),
        cover_image_url: cover_image.as_ref().map(|c| c.url.clone()),
        cover_image_public_id: cover_image.as_ref().map(|c| c.public_id.clone()),
        password_hash,
    };

    let user = match store.insert_user(new_user).await {
        Ok(user) => user,
        Err(e) => {
            // Registration race on username/email: drop the orphaned uploads.
            destroy_quietly(state.media.as_ref(), &avatar.public_id, MediaKind::Image).await;
            if let Some(cover) = &cover_image {
                destroy_quietly(state.media.as_ref(), &cover.public_id, MediaKind::Image).await;
            }
            return Err(e.into());
        }
    };

    tracing::info!("Registered user {} ({})", user.username, user.id);
    Ok(ApiResponse::created(Principal::from(user)).message("User registered successfully"))
}

/// POST /api/v1/users/login - Exchange credentials for an access/refresh token pair
#[instrument(skip(state, jar, payload), fields(username = ?payload.username, email = ?payload.email))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<SessionResponse>), ApiError> {
    let username = payload.username.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let email = payload.email.as_deref().map(str::trim).filter(|s| !s.is_empty());
    if username.is_none() && email.is_none() {
        return Err(ApiError::field_error("username", "username or email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::field_error("password", "password is required"));
    }

    let store = state.store.as_ref();
    let user = match (username, email) {
        (Some(username), _) => store.find_user_by_username(&username.to_lowercase()).await?,
        (None, Some(email)) => store.find_user_by_email(&email.to_lowercase()).await?,
        (None, None) => None,
    }
    .ok_or_else(|| ApiError::invalid_credentials("Invalid user credentials"))?;

    let valid = verify_password_blocking(payload.password, user.password_hash.clone()).await?;
    if !valid {
        tracing::debug!("Password mismatch for user {}", user.id);
        return Err(ApiError::invalid_credentials("Invalid user credentials"));
    }

    let (user, pair) = start_session(&state, user).await?;
    let jar = set_session_cookies(&state, jar, &pair);

    Ok((
        jar,
        ApiResponse::success(SessionResponse {
            user: Principal::from(user),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        })
        .message("User logged in successfully"),
    ))
}

/// POST /api/v1/users/logout - Forget the stored refresh token and clear cookies
#[instrument(skip(state, jar, principal), fields(user_id = %principal.id))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(principal): Extension<Principal>,
) -> Result<(CookieJar, ApiResponse<serde_json::Value>), ApiError> {
    if let Some(mut user) = state.store.find_user(principal.id).await? {
        user.refresh_token = None;
        user.updated_at = chrono::Utc::now();
        state.store.update_user(&user).await?;
    }

    let jar = jar
        .remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_TOKEN_COOKIE).path("/"));

    Ok((jar, ApiResponse::success(serde_json::json!({})).message("User logged out")))
}

/// POST /api/v1/users/refresh-token - Rotate both tokens using the stored refresh token
#[instrument(skip(state, jar, payload))]
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Option<AppJson<RefreshRequest>>,
) -> Result<(CookieJar, ApiResponse<SessionResponse>), ApiError> {
    let from_body = payload.and_then(|AppJson(body)| body.refresh_token);
    let incoming = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or(from_body)
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| ApiError::unauthenticated("Refresh token is required"))?;

    let claims = state.tokens.verify_refresh(&incoming)?;
    let user = state
        .store
        .find_user(claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthenticated("Invalid refresh token"))?;

    if user.refresh_token.as_deref() != Some(incoming.as_str()) {
        tracing::warn!("Refresh token reuse or mismatch for user {}", user.id);
        return Err(ApiError::unauthenticated("Refresh token is expired or used"));
    }

    let (user, pair) = start_session(&state, user).await?;
    let jar = set_session_cookies(&state, jar, &pair);

    Ok((
        jar,
        ApiResponse::success(SessionResponse {
            user: Principal::from(user),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        })
        .message("Access token refreshed"),
    ))
}

/// Issue a fresh pair and persist the refresh half so older ones stop working.
async fn start_session(state: &AppState, mut user: User) -> Result<(User, TokenPair), ApiError> {
    let pair = state.tokens.issue_pair(&user)?;
    user.refresh_token = Some(pair.refresh_token.clone());
    user.updated_at = chrono::Utc::now();
    state.store.update_user(&user).await?;
    Ok((user, pair))
}

fn set_session_cookies(state: &AppState, jar: CookieJar, pair: &TokenPair) -> CookieJar {
    let secure = state.config.auth.cookie_secure;
    let cookie = |name: &'static str, value: String| {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .secure(secure)
            .same_site(SameSite::Lax)
            .build()
    };
    jar.add(cookie(ACCESS_TOKEN_COOKIE, pair.access_token.clone()))
        .add(cookie(REFRESH_TOKEN_COOKIE, pair.refresh_token.clone()))
}
