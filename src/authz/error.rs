use thiserror::Error;

use super::locator::ResourceKind;
use crate::database::StoreError;

/// Outcomes of the authorization workflow other than success.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Token absent, malformed, expired or signed with another secret.
    #[error("{0}")]
    Unauthenticated(String),

    /// The token is valid but its subject no longer exists.
    #[error("Principal no longer exists")]
    PrincipalNotFound,

    #[error("Malformed {kind} id: '{raw}'")]
    MalformedId { kind: ResourceKind, raw: String },

    #[error("{} not found", .kind.label())]
    NotFound { kind: ResourceKind },

    #[error("You do not own this {kind}")]
    Forbidden { kind: ResourceKind },

    #[error("{0}")]
    ValidationFailed(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub type AuthzResult<T> = Result<T, AuthzError>;

impl AuthzError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        AuthzError::Unauthenticated(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AuthzError::ValidationFailed(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_resource() {
        let err = AuthzError::NotFound { kind: ResourceKind::Playlist };
        assert_eq!(err.to_string(), "Playlist not found");

        let err = AuthzError::MalformedId { kind: ResourceKind::Video, raw: "abc".into() };
        assert_eq!(err.to_string(), "Malformed video id: 'abc'");

        let err = AuthzError::Forbidden { kind: ResourceKind::Comment };
        assert_eq!(err.to_string(), "You do not own this comment");
    }
}
