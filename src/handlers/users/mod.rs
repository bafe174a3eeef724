pub mod account;
pub mod channel;
pub mod session;

pub use account::{change_password, current_user, update_account, update_avatar, update_cover_image};
pub use channel::{channel_profile, watch_history};
pub use session::{login, logout, refresh_token, register};

use crate::error::ApiError;
use crate::media::{MediaFile, MediaKind, UploadedMedia};
use crate::state::AppState;

pub(crate) fn validate_email(email: &str) -> Result<(), ApiError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'),
        None => false,
    };
    if !valid {
        return Err(ApiError::field_error("email", "Email address is not valid"));
    }
    Ok(())
}

/// Validate and push an image to the media host.
pub(crate) async fn upload_image(state: &AppState, file: MediaFile) -> Result<UploadedMedia, ApiError> {
    file.validate(MediaKind::Image)?;
    Ok(state.media.upload(file, MediaKind::Image).await?)
}
