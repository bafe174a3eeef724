use axum::extract::{Multipart, State};
use axum::Extension;
use serde::Deserialize;
use tracing::instrument;

use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::authz::{AuthzError, Principal};
use crate::database::models::User;
use crate::error::ApiError;
use crate::handlers::multipart::MultipartForm;
use crate::media::{destroy_quietly, MediaKind};
use crate::middleware::{ApiResponse, ApiResult, AppJson};
use crate::state::AppState;

use super::session::check_password_strength;
use super::{upload_image, validate_email};

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(alias = "oldPassword")]
    pub old_password: String,
    #[serde(alias = "newPassword")]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    #[serde(alias = "fullName")]
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// The principal's stored row. Gone only if the account was deleted mid-request.
async fn load_account(state: &AppState, principal: &Principal) -> Result<User, ApiError> {
    state
        .store
        .find_user(principal.id)
        .await?
        .ok_or_else(|| AuthzError::PrincipalNotFound.into())
}

/// GET /api/v1/users/current-user - The authenticated principal
#[instrument(skip(principal), fields(user_id = %principal.id))]
pub async fn current_user(Extension(principal): Extension<Principal>) -> ApiResult<Principal> {
    Ok(ApiResponse::success(principal).message("Current user fetched successfully"))
}

/// POST /api/v1/users/change-password - Replace the password after checking the old one
#[instrument(skip(state, principal, payload), fields(user_id = %principal.id))]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> ApiResult<serde_json::Value> {
    if payload.old_password.is_empty() {
        return Err(ApiError::field_error("old_password", "old_password is required"));
    }
    check_password_strength("new_password", &payload.new_password)?;

    let mut user = load_account(&state, &principal).await?;
    let matches = verify_password_blocking(payload.old_password, user.password_hash.clone()).await?;
    if !matches {
        return Err(ApiError::field_error("old_password", "Invalid old password"));
    }

    user.password_hash = hash_password_blocking(payload.new_password).await?;
    state.store.update_user(&user).await?;

    Ok(ApiResponse::success(serde_json::json!({})).message("Password changed successfully"))
}

/// PATCH /api/v1/users/update-account - Change full name and/or email
#[instrument(skip(state, principal, payload), fields(user_id = %principal.id))]
pub async fn update_account(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    AppJson(payload): AppJson<UpdateAccountRequest>,
) -> ApiResult<Principal> {
    let full_name = payload.full_name.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let email = payload.email.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());
    if full_name.is_none() && email.is_none() {
        return Err(ApiError::validation_error("Provide full_name or email to update", None));
    }

    let mut user = load_account(&state, &principal).await?;
    if let Some(email) = email {
        validate_email(&email)?;
        if email != user.email {
            if let Some(other) = state.store.find_user_by_email(&email).await? {
                if other.id != user.id {
                    return Err(ApiError::conflict("Email is already registered"));
                }
            }
            user.email = email;
        }
    }
    if let Some(full_name) = full_name {
        user.full_name = full_name;
    }
    user.updated_at = chrono::Utc::now();
    state.store.update_user(&user).await?;

    Ok(ApiResponse::success(Principal::from(user)).message("Account details updated successfully"))
}

/// PATCH /api/v1/users/avatar - Replace the avatar image
#[instrument(skip(state, principal, multipart), fields(user_id = %principal.id))]
pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    multipart: Multipart,
) -> ApiResult<Principal> {
    let mut form = MultipartForm::read(multipart).await?;
    let file = form.required_file(&["avatar"])?;

    let mut user = load_account(&state, &principal).await?;
    let uploaded = upload_image(&state, file).await?;
    let old_public_id = std::mem::replace(&mut user.avatar_public_id, uploaded.public_id);
    user.avatar_url = uploaded.url;
    user.updated_at = chrono::Utc::now();
    state.store.update_user(&user).await?;

    destroy_quietly(state.media.as_ref(), &old_public_id, MediaKind::Image).await;
    Ok(ApiResponse::success(Principal::from(user)).message("Avatar updated successfully"))
}

/// PATCH /api/v1/users/cover-image - Replace or set the cover image
#[instrument(skip(state, principal, multipart), fields(user_id = %principal.id))]
pub async fn update_cover_image(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    multipart: Multipart,
) -> ApiResult<Principal> {
    let mut form = MultipartForm::read(multipart).await?;
    let file = form.required_file(&["coverImage", "cover_image"])?;

    let mut user = load_account(&state, &principal).await?;
    let uploaded = upload_image(&state, file).await?;
    let old_public_id = user.cover_image_public_id.replace(uploaded.public_id);
    user.cover_image_url = Some(uploaded.url);
    user.updated_at = chrono::Utc::now();
    state.store.update_user(&user).await?;

    if let Some(old) = old_public_id {
        destroy_quietly(state.media.as_ref(), &old, MediaKind::Image).await;
    }
    Ok(ApiResponse::success(Principal::from(user)).message("Cover image updated successfully"))
}
