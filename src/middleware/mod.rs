pub mod auth;
pub mod json;
pub mod response;

pub use auth::{attach_principal, extract_token, require_auth, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
pub use json::AppJson;
pub use response::{ApiResponse, ApiResult};
