use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::authz::{resolve_principal, Principal};
use crate::error::ApiError;
use crate::state::AppState;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Rejects the request with 401 unless it carries a valid access token.
/// On success the `Principal` is available to handlers as an extension.
pub async fn require_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&headers);
    let principal = resolve_principal(&state.tokens, state.store.as_ref(), token.as_deref())
        .await
        .map_err(|e| {
            tracing::debug!("Authentication failed for {}: {}", request.uri().path(), e);
            ApiError::from(e)
        })?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Attaches a `Principal` when a valid token is present and lets the request
/// through either way. Used on public routes that personalise their output.
pub async fn attach_principal(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(&headers) {
        match resolve_principal(&state.tokens, state.store.as_ref(), Some(&token)).await {
            Ok(principal) => {
                request.extensions_mut().insert::<Principal>(principal);
            }
            Err(e) => tracing::debug!("Ignoring unusable token on public route: {}", e),
        }
    }
    next.run(request).await
}

/// Token from the `accessToken` cookie, else from `Authorization: Bearer`.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        if !cookie.value().trim().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}
