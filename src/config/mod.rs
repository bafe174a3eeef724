use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub media: MediaConfig,
    pub pagination: PaginationConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MediaBackend {
    Cloudinary,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub access_token_secret: String,
    pub access_token_expiry_secs: i64,
    #[serde(skip_serializing)]
    pub refresh_token_secret: String,
    pub refresh_token_expiry_secs: i64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub backend: MediaBackend,
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    #[serde(skip_serializing)]
    pub api_secret: Option<String>,
    pub folder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: u32,
    /// Raw page sizes above this are capped before pagination is computed.
    pub max_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    pub max_request_size_bytes: usize,
}

impl AppConfig {
    /// Profile defaults plus env overrides. Not validated: callers apply any
    /// command-line overrides first, then call `validate`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()?;

        Ok(config)
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Server overrides
        if let Some(port) = env::var("VIDSHARE_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid { name: "VIDSHARE_PORT", value: port })?;
        }
        if let Ok(v) = env::var("VIDSHARE_HOST") {
            self.server.host = v;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
            self.database.backend = StorageBackend::Postgres;
        }
        if let Ok(v) = env::var("STORAGE_BACKEND") {
            self.database.backend = match v.as_str() {
                "postgres" => StorageBackend::Postgres,
                "memory" => StorageBackend::Memory,
                _ => return Err(ConfigError::Invalid { name: "STORAGE_BACKEND", value: v }),
            };
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Auth overrides
        if let Ok(v) = env::var("ACCESS_TOKEN_SECRET") {
            self.auth.access_token_secret = v;
        }
        if let Ok(v) = env::var("ACCESS_TOKEN_EXPIRY_SECS") {
            self.auth.access_token_expiry_secs = v.parse().unwrap_or(self.auth.access_token_expiry_secs);
        }
        if let Ok(v) = env::var("REFRESH_TOKEN_SECRET") {
            self.auth.refresh_token_secret = v;
        }
        if let Ok(v) = env::var("REFRESH_TOKEN_EXPIRY_SECS") {
            self.auth.refresh_token_expiry_secs = v.parse().unwrap_or(self.auth.refresh_token_expiry_secs);
        }
        if let Ok(v) = env::var("COOKIE_SECURE") {
            self.auth.cookie_secure = v.parse().unwrap_or(self.auth.cookie_secure);
        }

        // Media overrides
        if let Ok(v) = env::var("MEDIA_BACKEND") {
            self.media.backend = match v.as_str() {
                "cloudinary" => MediaBackend::Cloudinary,
                "memory" => MediaBackend::Memory,
                _ => return Err(ConfigError::Invalid { name: "MEDIA_BACKEND", value: v }),
            };
        }
        if let Ok(v) = env::var("CLOUDINARY_CLOUD_NAME") {
            self.media.cloud_name = Some(v);
        }
        if let Ok(v) = env::var("CLOUDINARY_API_KEY") {
            self.media.api_key = Some(v);
        }
        if let Ok(v) = env::var("CLOUDINARY_API_SECRET") {
            self.media.api_secret = Some(v);
        }
        if let Ok(v) = env::var("MEDIA_FOLDER") {
            self.media.folder = v;
        }

        // Pagination overrides
        if let Ok(v) = env::var("PAGINATION_DEFAULT_LIMIT") {
            self.pagination.default_limit = v.parse().unwrap_or(self.pagination.default_limit);
        }
        if let Ok(v) = env::var("PAGINATION_MAX_LIMIT") {
            self.pagination.max_limit = v.parse().unwrap_or(self.pagination.max_limit);
        }

        // Security overrides
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        if let Ok(v) = env::var("MAX_REQUEST_SIZE_BYTES") {
            self.security.max_request_size_bytes = v.parse().unwrap_or(self.security.max_request_size_bytes);
        }

        Ok(self)
    }

    /// Rejects combinations that cannot serve requests.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.access_token_secret.is_empty() {
            return Err(ConfigError::Missing("ACCESS_TOKEN_SECRET"));
        }
        if self.auth.refresh_token_secret.is_empty() {
            return Err(ConfigError::Missing("REFRESH_TOKEN_SECRET"));
        }
        if self.database.backend == StorageBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if self.media.backend == MediaBackend::Cloudinary {
            if self.media.cloud_name.is_none() {
                return Err(ConfigError::Missing("CLOUDINARY_CLOUD_NAME"));
            }
            if self.media.api_key.is_none() {
                return Err(ConfigError::Missing("CLOUDINARY_API_KEY"));
            }
            if self.media.api_secret.is_none() {
                return Err(ConfigError::Missing("CLOUDINARY_API_SECRET"));
            }
        }
        if self.auth.access_token_secret == self.auth.refresh_token_secret {
            return Err(ConfigError::Invalid {
                name: "REFRESH_TOKEN_SECRET",
                value: "must differ from ACCESS_TOKEN_SECRET".to_string(),
            });
        }
        if self.pagination.default_limit == 0 {
            return Err(ConfigError::Invalid {
                name: "PAGINATION_DEFAULT_LIMIT",
                value: self.pagination.default_limit.to_string(),
            });
        }
        if self.pagination.max_limit < self.pagination.default_limit {
            return Err(ConfigError::Invalid {
                name: "PAGINATION_MAX_LIMIT",
                value: format!(
                    "{} (below PAGINATION_DEFAULT_LIMIT {})",
                    self.pagination.max_limit, self.pagination.default_limit
                ),
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                backend: StorageBackend::Memory,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            auth: AuthConfig {
                access_token_secret: "dev-access-secret".to_string(),
                access_token_expiry_secs: 24 * 60 * 60,
                refresh_token_secret: "dev-refresh-secret".to_string(),
                refresh_token_expiry_secs: 10 * 24 * 60 * 60,
                cookie_secure: false,
            },
            media: MediaConfig {
                backend: MediaBackend::Memory,
                cloud_name: None,
                api_key: None,
                api_secret: None,
                folder: "vidshare_dev".to_string(),
            },
            pagination: PaginationConfig {
                default_limit: 10,
                max_limit: 100,
            },
            security: SecurityConfig {
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                max_request_size_bytes: 200 * 1024 * 1024, // 200MB, video uploads
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            auth: AuthConfig {
                access_token_secret: String::new(),
                access_token_expiry_secs: 60 * 60,
                refresh_token_secret: String::new(),
                refresh_token_expiry_secs: 7 * 24 * 60 * 60,
                cookie_secure: true,
            },
            media: MediaConfig {
                backend: MediaBackend::Cloudinary,
                cloud_name: None,
                api_key: None,
                api_secret: None,
                folder: "vidshare_staging".to_string(),
            },
            pagination: PaginationConfig {
                default_limit: 10,
                max_limit: 50,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.example.com".to_string()],
                max_request_size_bytes: 200 * 1024 * 1024,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                backend: StorageBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            auth: AuthConfig {
                access_token_secret: String::new(),
                access_token_expiry_secs: 15 * 60,
                refresh_token_secret: String::new(),
                refresh_token_expiry_secs: 7 * 24 * 60 * 60,
                cookie_secure: true,
            },
            media: MediaConfig {
                backend: MediaBackend::Cloudinary,
                cloud_name: None,
                api_key: None,
                api_secret: None,
                folder: "vidshare".to_string(),
            },
            pagination: PaginationConfig {
                default_limit: 10,
                max_limit: 50,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://app.example.com".to_string()],
                max_request_size_bytes: 500 * 1024 * 1024,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database.backend, StorageBackend::Memory);
        assert_eq!(config.media.backend, MediaBackend::Memory);
        assert_eq!(config.pagination.default_limit, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_production_config_requires_secrets() {
        let config = AppConfig::production();
        assert!(config.auth.cookie_secure);
        assert!(matches!(config.validate(), Err(ConfigError::Missing("ACCESS_TOKEN_SECRET"))));
    }

    #[test]
    fn test_postgres_backend_requires_url() {
        let mut config = AppConfig::development();
        config.database.backend = StorageBackend::Postgres;
        assert!(matches!(config.validate(), Err(ConfigError::Missing("DATABASE_URL"))));

        config.database.url = Some("postgres://localhost/vidshare".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cloudinary_backend_requires_credentials() {
        let mut config = AppConfig::development();
        config.media.backend = MediaBackend::Cloudinary;
        config.media.cloud_name = Some("demo".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Missing("CLOUDINARY_API_KEY"))));
    }

    #[test]
    fn test_pagination_limits_are_checked_by_name() {
        let mut config = AppConfig::development();
        config.pagination.default_limit = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { name: "PAGINATION_DEFAULT_LIMIT", .. })
        ));

        config.pagination.default_limit = 50;
        config.pagination.max_limit = 20;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { name: "PAGINATION_MAX_LIMIT", .. })
        ));

        config.pagination.max_limit = 50;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_token_secrets_must_differ() {
        let mut config = AppConfig::development();
        config.auth.refresh_token_secret = config.auth.access_token_secret.clone();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { name: "REFRESH_TOKEN_SECRET", .. })
        ));
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let value = serde_json::to_value(AppConfig::development()).unwrap();
        assert!(value["auth"].get("access_token_secret").is_none());
        assert!(value["auth"].get("refresh_token_secret").is_none());
    }
}
