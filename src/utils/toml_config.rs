//! TOML-based configuration for Authgate
//!
//! Infrastructure settings (listener, token lifetimes, session backend,
//! database location) live in `authgate.toml`. Secrets are never stored in the
//! file; the config names the environment variable that holds them.
//!
//! The configuration is loaded once at startup and handed to constructors
//! explicitly. There is no hot reload: the signing secret must stay fixed for
//! the lifetime of the process.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Minimum accepted length (in bytes) of the HMAC signing secret.
pub const MIN_SECRET_LEN: usize = 32;

/// Upper bound for any configured lifetime: ten years, in seconds.
pub const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Root configuration structure loaded from authgate.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthGateConfig {
    /// HTTP listener and logging
    #[serde(default)]
    pub server: ServerConfig,

    /// Token signing and lifetimes
    #[serde(default)]
    pub auth: AuthConfig,

    /// Session store settings
    #[serde(default)]
    pub session: SessionConfig,

    /// User and refresh-token storage
    #[serde(default)]
    pub database: DatabaseConfig,
}

// ============= Server Configuration =============

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Default tracing level; `RUST_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log line format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Upper bound on the time a single request may take
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Largest accepted request body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            request_timeout_secs: default_request_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

// ============= Authentication Configuration =============

/// Signed-token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable name containing the JWT signing secret
    #[serde(default = "default_jwt_secret_env")]
    pub jwt_secret_env: String,

    /// Access token lifetime in seconds
    #[serde(default = "default_access_token_ttl_secs")]
    pub access_token_ttl_secs: i64,

    /// Refresh token lifetime in seconds
    #[serde(default = "default_refresh_token_ttl_secs")]
    pub refresh_token_ttl_secs: i64,
}

fn default_jwt_secret_env() -> String {
    "JWT_SECRET".to_string()
}

fn default_access_token_ttl_secs() -> i64 {
    15 * 60
}

fn default_refresh_token_ttl_secs() -> i64 {
    720 * 60 * 60
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_env: default_jwt_secret_env(),
            access_token_ttl_secs: default_access_token_ttl_secs(),
            refresh_token_ttl_secs: default_refresh_token_ttl_secs(),
        }
    }
}

impl AuthConfig {
    /// Access token lifetime. Out-of-range values saturate; `validate` rejects them.
    pub fn access_ttl(&self) -> chrono::Duration {
        ttl_from_secs(self.access_token_ttl_secs)
    }

    /// Refresh token lifetime. Out-of-range values saturate; `validate` rejects them.
    pub fn refresh_ttl(&self) -> chrono::Duration {
        ttl_from_secs(self.refresh_token_ttl_secs)
    }
}

fn ttl_from_secs(secs: i64) -> chrono::Duration {
    chrono::Duration::try_seconds(secs).unwrap_or(if secs < 0 {
        chrono::Duration::MIN
    } else {
        chrono::Duration::MAX
    })
}

// ============= Session Configuration =============

/// Where sessions are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// In-process map
    #[default]
    Memory,
    /// Shared Redis instance (`redis` feature)
    Redis,
}

/// Server-side session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in seconds
    #[serde(default = "default_session_ttl_secs")]
    pub ttl_secs: u64,

    /// Session store backend
    #[serde(default)]
    pub backend: SessionBackend,

    /// Environment variable for the Redis URL (redis backend only)
    #[serde(default = "default_redis_url_env")]
    pub redis_url_env: String,

    /// Mark the session cookie `Secure` (enable when served over HTTPS)
    #[serde(default)]
    pub cookie_secure: bool,
}

fn default_session_ttl_secs() -> u64 {
    360 * 60 * 60
}

fn default_redis_url_env() -> String {
    "REDIS_URL".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl_secs(),
            backend: SessionBackend::default(),
            redis_url_env: default_redis_url_env(),
            cookie_secure: false,
        }
    }
}

impl SessionConfig {
    /// Session lifetime
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

// ============= Database Configuration =============

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Local database path, or ":memory:"
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Environment variable for Turso URL (optional cloud config)
    pub turso_url_env: Option<String>,

    /// Environment variable for Turso auth token
    pub turso_token_env: Option<String>,

    /// Deadline applied to every ledger and session-store call
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

fn default_database_url() -> String {
    "./data/authgate.db".to_string()
}

fn default_operation_timeout_ms() -> u64 {
    2000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            turso_url_env: None,
            turso_token_env: None,
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    /// Deadline applied to each ledger and session-store call
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file does not exist
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// The config file could not be read
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The config file is not valid TOML
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A value is out of range or inconsistent
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A referenced environment variable is unset or empty
    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    /// The signing secret is shorter than [`MIN_SECRET_LEN`]
    #[error("Signing secret in '{0}' must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret(String),
}

impl AuthGateConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without validating it (no env vars are consulted)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate lifetimes, backend selection and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        let secret = self.jwt_secret()?;
        if secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret(self.auth.jwt_secret_env.clone()));
        }

        if self.auth.access_token_ttl_secs <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.access_token_ttl_secs must be positive".to_string(),
            ));
        }
        if self.auth.refresh_token_ttl_secs <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.refresh_token_ttl_secs must be positive".to_string(),
            ));
        }
        if self.session.ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "session.ttl_secs must be positive".to_string(),
            ));
        }
        for (name, secs) in [
            ("auth.access_token_ttl_secs", self.auth.access_token_ttl_secs),
            ("auth.refresh_token_ttl_secs", self.auth.refresh_token_ttl_secs),
            (
                "session.ttl_secs",
                i64::try_from(self.session.ttl_secs).unwrap_or(i64::MAX),
            ),
        ] {
            if secs > MAX_TTL_SECS {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be at most {} seconds",
                    name, MAX_TTL_SECS
                )));
            }
        }
        if self.database.operation_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "database.operation_timeout_ms must be positive".to_string(),
            ));
        }

        if self.session.backend == SessionBackend::Redis {
            if !cfg!(feature = "redis") {
                return Err(ConfigError::ValidationError(
                    "session.backend = \"redis\" requires the 'redis' feature".to_string(),
                ));
            }
            self.validate_env_var(&self.session.redis_url_env)?;
        }

        if let Some(ref env) = self.database.turso_url_env {
            self.validate_env_var(env)?;
        }
        if let Some(ref env) = self.database.turso_token_env {
            self.validate_env_var(env)?;
        }

        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        match std::env::var(name) {
            Ok(value) if !value.is_empty() => Ok(()),
            _ => Err(ConfigError::MissingEnvVar(name.to_string())),
        }
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok().filter(|v| !v.is_empty())
    }

    /// Get the JWT signing secret from the environment
    pub fn jwt_secret(&self) -> Result<String, ConfigError> {
        self.resolve_env(&self.auth.jwt_secret_env)
            .ok_or_else(|| ConfigError::MissingEnvVar(self.auth.jwt_secret_env.clone()))
    }

    /// Get the Redis URL from the environment
    pub fn redis_url(&self) -> Result<String, ConfigError> {
        self.resolve_env(&self.session.redis_url_env)
            .ok_or_else(|| ConfigError::MissingEnvVar(self.session.redis_url_env.clone()))
    }

    /// Remote Turso credentials, when both env references are configured
    pub fn turso_credentials(&self) -> Option<(String, String)> {
        let url = self.resolve_env(self.database.turso_url_env.as_deref()?)?;
        let token = self.resolve_env(self.database.turso_token_env.as_deref()?)?;
        Some((url, token))
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
