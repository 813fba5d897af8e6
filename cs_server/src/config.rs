//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use courtside::db::DatabaseConfig;
use courtside::engine::EngineDefaults;
use courtside::MatchMode;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Where matches and participants live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local storage, optionally seeded from a JSON file
    Memory,
    /// PostgreSQL via sqlx
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            other => Err(ConfigError::Invalid {
                var: "STORAGE_BACKEND".to_string(),
                reason: format!("expected 'memory' or 'postgres', got '{other}'"),
            }),
        }
    }
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    pub storage: StorageBackend,
    /// Database configuration, used by the postgres backend
    pub database: DatabaseConfig,
    /// HS256 secret shared with the platform that issues host tokens
    pub jwt_secret: String,
    /// Engine defaults for omitted request parameters
    pub engine: EngineDefaults,
    /// Prometheus listener; metrics are disabled when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Directory seed for the memory backend
    pub seed_file: Option<PathBuf>,
}

/// Values supplied on the command line take precedence over the environment
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind: Option<SocketAddr>,
    pub database_url: Option<String>,
    pub storage: Option<StorageBackend>,
    pub seed_file: Option<PathBuf>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_env_required_format("SERVER_BIND", "127.0.0.1:6969")?,
        };

        let storage = match overrides.storage {
            Some(storage) => storage,
            None => std::env::var("STORAGE_BACKEND")
                .ok()
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or(StorageBackend::Memory),
        };

        let database_url = overrides
            .database_url
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .unwrap_or_else(|| DatabaseConfig::development().database_url);
        let pool_defaults = DatabaseConfig::development();
        let database = DatabaseConfig {
            database_url,
            max_connections: parse_env_or("DB_MAX_CONNECTIONS", pool_defaults.max_connections),
            min_connections: parse_env_or("DB_MIN_CONNECTIONS", pool_defaults.min_connections),
            connection_timeout_secs: parse_env_or(
                "DB_CONNECTION_TIMEOUT_SECS",
                pool_defaults.connection_timeout_secs,
            ),
            idle_timeout_secs: parse_env_or("DB_IDLE_TIMEOUT_SECS", pool_defaults.idle_timeout_secs),
            max_lifetime_secs: parse_env_or("DB_MAX_LIFETIME_SECS", pool_defaults.max_lifetime_secs),
        };

        // Security configuration (REQUIRED)
        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Use the secret the platform signs host tokens with".to_string(),
        })?;

        let defaults = EngineDefaults::default();
        let mode = match std::env::var("DEFAULT_MATCH_MODE") {
            Ok(raw) => raw.parse::<MatchMode>().map_err(|e| ConfigError::Invalid {
                var: "DEFAULT_MATCH_MODE".to_string(),
                reason: e.to_string(),
            })?,
            Err(_) => defaults.mode,
        };
        let engine = EngineDefaults {
            mode,
            skill_tolerance: parse_env_or("DEFAULT_SKILL_TOLERANCE", defaults.skill_tolerance),
            match_duration_minutes: parse_env_or(
                "DEFAULT_MATCH_DURATION_MINUTES",
                defaults.match_duration_minutes,
            ),
        };

        let metrics_bind = match std::env::var("METRICS_BIND") {
            Ok(raw) => Some(raw.parse().map_err(|_| ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("'{raw}' is not a socket address"),
            })?),
            Err(_) => None,
        };

        let seed_file = overrides
            .seed_file
            .or_else(|| std::env::var("SEED_FILE").ok().map(PathBuf::from));

        Ok(ServerConfig {
            bind,
            storage,
            database,
            jwt_secret,
            engine,
            metrics_bind,
            seed_file,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must be at least 32 characters (128-bit security)".to_string(),
            });
        }

        if self.engine.skill_tolerance <= 0 {
            return Err(ConfigError::Invalid {
                var: "DEFAULT_SKILL_TOLERANCE".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.engine.match_duration_minutes == 0 {
            return Err(ConfigError::Invalid {
                var: "DEFAULT_MATCH_DURATION_MINUTES".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.seed_file.is_some() && self.storage == StorageBackend::Postgres {
            return Err(ConfigError::Invalid {
                var: "SEED_FILE".to_string(),
                reason: "Seeding is only supported by the memory backend".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse an environment variable, rejecting values that are set but malformed
fn parse_env_required_format<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
{
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse().map_err(|_| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("cannot parse '{raw}'"),
    })
}
