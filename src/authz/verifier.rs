use super::error::{AuthzError, AuthzResult};
use super::principal::Principal;
use crate::auth::TokenService;
use crate::database::Store;

/// Resolve a bearer token to the stored principal.
///
/// Only reads storage. Rejecting the request is left to the caller.
pub async fn resolve_principal(
    tokens: &TokenService,
    store: &dyn Store,
    token: Option<&str>,
) -> AuthzResult<Principal> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthzError::unauthenticated("Missing access token"))?;

    let claims = tokens.verify_access(token).map_err(|e| {
        tracing::debug!("Access token rejected: {}", e);
        AuthzError::unauthenticated("Invalid or expired access token")
    })?;

    let user = store
        .find_user(claims.sub)
        .await?
        .ok_or(AuthzError::PrincipalNotFound)?;

    Ok(Principal::from(user))
}
