/// Configuration management for Social Service
///
/// Loads configuration from environment variables.
use anyhow::{bail, Context, Result};
use db_pool::env_utils::{env_non_empty, parse_env_with_default};
use db_pool::DbConfig;
use s3_utils::S3Config;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration, present for the postgres backend
    pub database: Option<DbConfig>,
    /// Redis configuration
    pub redis: RedisConfig,
    /// Bearer token verification
    pub auth: AuthConfig,
    /// Identity directory (profile lookup on first sync)
    pub directory: DirectoryConfig,
    /// Object storage for post images
    pub storage: Option<S3Config>,
}

/// Application settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// HTTP port
    pub http_port: u16,
    /// Where entities live
    pub storage_backend: StorageBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// Process-local store, for demos and tests
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("unknown STORAGE_BACKEND: {}", other),
        }
    }
}

/// Redis configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL; view invalidation is disabled without it
    pub url: Option<String>,
}

/// JWT verification settings
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// RS256 public key (PEM)
    pub public_key_pem: Option<String>,
    /// HS256 shared secret
    pub secret: Option<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("public_key_pem", &self.public_key_pem.as_ref().map(|_| "[SET]"))
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

/// Identity directory settings
#[derive(Clone, Default)]
pub struct DirectoryConfig {
    pub base_url: Option<String>,
    pub secret_key: Option<String>,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("base_url", &self.base_url)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let storage_backend = env_non_empty("STORAGE_BACKEND")
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or(StorageBackend::Postgres);

        let app = AppConfig {
            env: env_non_empty("APP_ENV").unwrap_or_else(|| "development".to_string()),
            host: env_non_empty("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            http_port: parse_env_with_default("PORT", 8006),
            storage_backend,
        };

        let database = match storage_backend {
            StorageBackend::Postgres => Some(
                DbConfig::from_env("social-service")
                    .map_err(anyhow::Error::msg)
                    .context("Failed to load database configuration")?,
            ),
            StorageBackend::Memory => None,
        };

        let redis = RedisConfig {
            url: env_non_empty("REDIS_URL"),
        };

        let auth = AuthConfig {
            public_key_pem: env_non_empty("JWT_PUBLIC_KEY_PEM"),
            secret: env_non_empty("JWT_SECRET"),
            issuer: env_non_empty("JWT_ISSUER"),
            audience: env_non_empty("JWT_AUDIENCE"),
        };
        if auth.public_key_pem.is_none() && auth.secret.is_none() {
            bail!("either JWT_PUBLIC_KEY_PEM or JWT_SECRET must be set");
        }

        let directory = DirectoryConfig {
            base_url: env_non_empty("IDENTITY_DIRECTORY_URL"),
            secret_key: env_non_empty("IDENTITY_DIRECTORY_SECRET_KEY"),
            timeout_secs: parse_env_with_default("IDENTITY_DIRECTORY_TIMEOUT_SECS", 5),
        };

        let storage = match env_non_empty("S3_BUCKET") {
            Some(_) => Some(S3Config::from_env().context("Failed to load S3 configuration")?),
            None => None,
        };

        Ok(Config {
            app,
            database,
            redis,
            auth,
            directory,
            storage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "STORAGE_BACKEND",
        "APP_ENV",
        "APP_HOST",
        "PORT",
        "DATABASE_URL",
        "REDIS_URL",
        "JWT_PUBLIC_KEY_PEM",
        "JWT_SECRET",
        "JWT_ISSUER",
        "JWT_AUDIENCE",
        "IDENTITY_DIRECTORY_URL",
        "IDENTITY_DIRECTORY_SECRET_KEY",
        "S3_BUCKET",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_default_values() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://test");
        std::env::set_var("JWT_SECRET", "dev-secret");

        let config = Config::from_env().unwrap();

        assert_eq!(config.app.env, "development");
        assert_eq!(config.app.host, "0.0.0.0");
        assert_eq!(config.app.http_port, 8006);
        assert_eq!(config.app.storage_backend, StorageBackend::Postgres);
        let database = config.database.unwrap();
        assert_eq!(database.max_connections, 20);
        assert_eq!(database.min_connections, 5);
        assert!(config.redis.url.is_none());
        assert!(config.storage.is_none());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_memory_backend_needs_no_database() {
        clear_env();
        std::env::set_var("STORAGE_BACKEND", "memory");
        std::env::set_var("JWT_SECRET", "dev-secret");

        let config = Config::from_env().unwrap();
        assert_eq!(config.app.storage_backend, StorageBackend::Memory);
        assert!(config.database.is_none());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_jwt_key_is_rejected() {
        clear_env();
        std::env::set_var("STORAGE_BACKEND", "memory");
        assert!(Config::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_unknown_backend_is_rejected() {
        clear_env();
        std::env::set_var("STORAGE_BACKEND", "cassandra");
        std::env::set_var("JWT_SECRET", "dev-secret");
        assert!(Config::from_env().is_err());
        clear_env();
    }
}
