pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::database::models::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: Uuid,
    pub username: String,
    /// Unique per token so a rotated refresh token never equals the previous one.
    pub jti: Uuid,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token secret not configured")]
    MissingSecret,

    #[error("Access and refresh tokens must use different secrets")]
    SharedSecret,

    #[error("JWT generation error: {0}")]
    Generation(String),

    #[error("Invalid token: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_secs: i64,
}

impl SigningKeys {
    fn new(secret: &str, expiry_secs: i64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry_secs,
        })
    }

    fn sign(&self, user: &User) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            jti: Uuid::new_v4(),
            exp: (now + Duration::seconds(self.expiry_secs)).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}

/// Issues and verifies HS256 access and refresh tokens.
///
/// The two token types are signed with different secrets, so a refresh token
/// never passes as an access token and vice versa.
pub struct TokenService {
    access: SigningKeys,
    refresh: SigningKeys,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Result<Self, TokenError> {
        let access = SigningKeys::new(&config.access_token_secret, config.access_token_expiry_secs)?;
        let refresh = SigningKeys::new(&config.refresh_token_secret, config.refresh_token_expiry_secs)?;
        if config.access_token_secret == config.refresh_token_secret {
            return Err(TokenError::SharedSecret);
        }
        Ok(Self { access, refresh })
    }

    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.access.sign(user)?,
            refresh_token: self.refresh.sign(user)?,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.access.verify(token)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.refresh.verify(token)
    }

    pub fn access_expiry_secs(&self) -> i64 {
        self.access.expiry_secs
    }

    pub fn refresh_expiry_secs(&self) -> i64 {
        self.refresh.expiry_secs
    }
}
