//! Configuration loading for the Kontor API.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `KONTOR_`, producing a typed [`AppConfig`].

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application configuration derived from `KONTOR_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_api_bind_addr")]
    pub api_bind_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_ms")]
    pub db_acquire_timeout_ms: u64,
    /// Lifetime of a session token from creation, in seconds.
    #[serde(default = "default_session_ttl_seconds")]
    pub session_ttl_seconds: u64,
    /// Largest response body the audit middleware will buffer and inspect.
    #[serde(default = "default_audit_max_body_kb")]
    pub audit_max_body_kb: usize,
    /// Whether to seed the base permission matrix and built-in roles at boot.
    #[serde(default = "default_seed_on_start")]
    pub seed_on_start: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_bind_addr: default_api_bind_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            database_url: default_database_url(),
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_ms: default_db_acquire_timeout_ms(),
            session_ttl_seconds: default_session_ttl_seconds(),
            audit_max_body_kb: default_audit_max_body_kb(),
            seed_on_start: default_seed_on_start(),
        }
    }
}

impl AppConfig {
    /// Parse the configured bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// Serialize the configuration for startup logging. The current schema
    /// carries no secrets, so this is a plain dump kept behind a dedicated
    /// method in case that changes.
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Validate configuration bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr().map_err(|source| ConfigError::InvalidBindAddr {
            value: self.api_bind_addr.clone(),
            source,
        })?;

        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidDbMaxConnections {
                value: self.db_max_connections,
            });
        }

        // Sub-minute sessions only make sense in tests; an hour-to-month
        // window keeps fat-fingered values out of production.
        if self.profile != "test"
            && !(3600..=2_592_000).contains(&self.session_ttl_seconds)
        {
            return Err(ConfigError::InvalidSessionTtl {
                value: self.session_ttl_seconds,
            });
        }

        if self.audit_max_body_kb == 0 || self.audit_max_body_kb > 4096 {
            return Err(ConfigError::InvalidAuditMaxBody {
                value: self.audit_max_body_kb,
            });
        }

        Ok(())
    }
}

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid api bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("db max connections must be positive, got {value}")]
    InvalidDbMaxConnections { value: u32 },
    #[error("session ttl must be between 3600 and 2592000 seconds, got {value}")]
    InvalidSessionTtl { value: u64 },
    #[error("audit max body must be between 1 and 4096 KiB, got {value}")]
    InvalidAuditMaxBody { value: usize },
}

fn default_profile() -> String {
    "dev".to_string()
}

fn default_api_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_database_url() -> String {
    "postgres://localhost:5432/kontor".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_acquire_timeout_ms() -> u64 {
    5_000
}

fn default_session_ttl_seconds() -> u64 {
    86_400
}

fn default_audit_max_body_kb() -> usize {
    64
}

fn default_seed_on_start() -> bool {
    true
}

/// Loads configuration using layered `.env` files and `KONTOR_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads configuration from layered env files and process environment.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Overlay process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix("KONTOR_") {
                layered.insert(stripped.to_string(), value);
            }
        }

        let profile = layered
            .remove("PROFILE")
            .filter(|v| !v.is_empty())
            .unwrap_or(profile_hint);
        let api_bind_addr = layered
            .remove("API_BIND_ADDR")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_api_bind_addr);
        let log_level = layered
            .remove("LOG_LEVEL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_level);
        let log_format = layered
            .remove("LOG_FORMAT")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_format);
        let database_url = layered
            .remove("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_database_url);
        let db_max_connections = layered
            .remove("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_db_max_connections);
        let db_acquire_timeout_ms = layered
            .remove("DB_ACQUIRE_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_db_acquire_timeout_ms);
        let session_ttl_seconds = layered
            .remove("SESSION_TTL_SECONDS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_session_ttl_seconds);
        let audit_max_body_kb = layered
            .remove("AUDIT_MAX_BODY_KB")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_audit_max_body_kb);
        let seed_on_start = layered
            .remove("SEED_ON_START")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_seed_on_start);

        let config = AppConfig {
            profile,
            api_bind_addr,
            log_level,
            log_format,
            database_url,
            db_max_connections,
            db_acquire_timeout_ms,
            session_ttl_seconds,
            audit_max_body_kb,
            seed_on_start,
        };

        config.validate()?;

        Ok(config)
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var("KONTOR_PROFILE")
            .ok()
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix("KONTOR_") {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
