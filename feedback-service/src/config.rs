//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: `FEEDBACK_`, nesting separator: `__`)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/feedback-service/config.toml
//! 4. System directory: /etc/feedback-service/config.toml
//! 5. Default values
//!
//! `Config::load_from` replaces steps 2-4 with a single explicit file.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::config::AuthConfig;
use crate::error::{Error, Result};
use crate::web::session::SessionConfig;

const APP_NAME: &str = "feedback-service";
const ENV_PREFIX: &str = "FEEDBACK_";

/// Upper bound for `stats.recent_window_days` (about a century)
pub const MAX_RECENT_WINDOW_DAYS: i64 = 36_500;

/// Upper bound for `jwt.token_lifetime_secs` (ten years)
pub const MAX_TOKEN_LIFETIME_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Password hashing and registration rules
    #[serde(default)]
    pub auth: AuthConfig,

    /// Storage backend configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Middleware configuration
    #[serde(default)]
    pub middleware: MiddlewareConfig,

    /// Browser session configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Dashboard statistics configuration
    #[serde(default)]
    pub stats: StatsConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Environment (dev, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable multi-line output
    Pretty,
}

/// JWT configuration
///
/// The signing secret comes from `secret`, or from the file at `secret_path`.
/// When neither is set an ephemeral secret is generated at startup, which
/// invalidates every issued token on restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Inline HMAC secret
    #[serde(default)]
    pub secret: Option<String>,

    /// Path to a file holding the HMAC secret
    #[serde(default)]
    pub secret_path: Option<PathBuf>,

    /// JWT algorithm (HS256, HS384, HS512)
    #[serde(default = "default_jwt_algorithm")]
    pub algorithm: String,

    /// Issuer to stamp and validate
    #[serde(default)]
    pub issuer: Option<String>,

    /// Audience to stamp and validate
    #[serde(default)]
    pub audience: Option<String>,

    /// Token lifetime in seconds (default: 30 days)
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_secs: u64,
}

impl JwtConfig {
    /// Token lifetime as a duration
    pub fn token_lifetime(&self) -> Duration {
        Duration::from_secs(self.token_lifetime_secs)
    }
}

/// Which store backend to run against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local maps, lost on restart
    #[default]
    Memory,
    /// SurrealDB (requires the `surrealdb` feature)
    Surrealdb,
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend selection
    #[serde(default)]
    pub backend: StoreBackend,

    /// SurrealDB connection settings, used when `backend = "surrealdb"`
    #[serde(default)]
    pub surrealdb: Option<SurrealDbConfig>,
}

/// SurrealDB connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurrealDbConfig {
    /// Connection URL (`mem://`, `ws://host:port`, `http://host:port`)
    pub url: String,

    /// Namespace to select after connecting
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Database to select after connecting
    #[serde(default = "default_database")]
    pub database: String,

    /// Root username (optional, not used for `mem://`)
    #[serde(default)]
    pub username: Option<String>,

    /// Root password (optional, not used for `mem://`)
    #[serde(default)]
    pub password: Option<String>,

    /// Maximum retry attempts for establishing the connection
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay between retry attempts in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

/// Middleware configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Request tracking configuration
    #[serde(default)]
    pub request_tracking: RequestTrackingConfig,

    /// Body size limit in megabytes
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,

    /// Enable panic recovery
    #[serde(default = "default_true")]
    pub catch_panic: bool,

    /// Enable gzip compression
    #[serde(default = "default_true")]
    pub compression: bool,

    /// CORS mode: "permissive", "restrictive", or "disabled"
    #[serde(default = "default_cors_mode")]
    pub cors_mode: String,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            request_tracking: RequestTrackingConfig::default(),
            body_limit_mb: default_body_limit_mb(),
            catch_panic: true,
            compression: true,
            cors_mode: default_cors_mode(),
        }
    }
}

/// Request tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestTrackingConfig {
    /// Generate and propagate request ids
    #[serde(default = "default_true")]
    pub request_id_enabled: bool,

    /// Header carrying the request id
    #[serde(default = "default_request_id_header")]
    pub request_id_header: String,

    /// Mask authorization and cookie headers in traces
    #[serde(default = "default_true")]
    pub mask_sensitive_headers: bool,
}

impl Default for RequestTrackingConfig {
    fn default() -> Self {
        Self {
            request_id_enabled: true,
            request_id_header: default_request_id_header(),
            mask_sensitive_headers: true,
        }
    }
}

/// Dashboard statistics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Window for the "recent feedback" counter, in days
    #[serde(default = "default_recent_window_days")]
    pub recent_window_days: i64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            recent_window_days: default_recent_window_days(),
        }
    }
}

// Default value functions
fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_jwt_algorithm() -> String {
    "HS256".to_string()
}

fn default_token_lifetime() -> u64 {
    30 * 24 * 60 * 60
}

fn default_namespace() -> String {
    "feedback".to_string()
}

fn default_database() -> String {
    "feedback".to_string()
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay() -> u64 {
    2
}

fn default_true() -> bool {
    true
}

fn default_body_limit_mb() -> usize {
    1
}

fn default_cors_mode() -> String {
    "permissive".to_string()
}

fn default_request_id_header() -> String {
    "x-request-id".to_string()
}

fn default_recent_window_days() -> i64 {
    7
}

impl Config {
    /// Load configuration from the standard search path and the environment
    pub fn load() -> Result<Self> {
        let config_paths = Self::find_config_paths();

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Lowest priority first so later files override earlier ones
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        let config: Self = figment.merge(Self::env_provider()).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from one explicit file plus the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config: Self = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Self::env_provider())
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot be used
    pub fn validate(&self) -> Result<()> {
        let days = self.stats.recent_window_days;
        if !(1..=MAX_RECENT_WINDOW_DAYS).contains(&days) {
            return Err(invalid(format!(
                "stats.recent_window_days must be between 1 and {MAX_RECENT_WINDOW_DAYS}, got {days}"
            )));
        }

        let lifetime = self.jwt.token_lifetime_secs;
        if !(1..=MAX_TOKEN_LIFETIME_SECS).contains(&lifetime) {
            return Err(invalid(format!(
                "jwt.token_lifetime_secs must be between 1 and {MAX_TOKEN_LIFETIME_SECS}, got {lifetime}"
            )));
        }

        Ok(())
    }

    fn env_provider() -> Env {
        Env::prefixed(ENV_PREFIX).split("__")
    }

    /// Candidate config files, highest priority first
    fn find_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_NAME);
        if let Some(path) = xdg_dirs.find_config_file("config.toml") {
            paths.push(path);
        }

        paths.push(PathBuf::from("/etc").join(APP_NAME).join("config.toml"));
        paths
    }

    /// Request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.service.timeout_secs)
    }
}

fn invalid(message: String) -> Error {
    Error::from(figment::Error::from(message))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: APP_NAME.to_string(),
                port: default_port(),
                log_level: default_log_level(),
                log_format: LogFormat::default(),
                timeout_secs: default_timeout(),
                environment: default_environment(),
            },
            jwt: JwtConfig {
                secret: None,
                secret_path: None,
                algorithm: default_jwt_algorithm(),
                issuer: None,
                audience: None,
                token_lifetime_secs: default_token_lifetime(),
            },
            auth: AuthConfig::default(),
            store: StoreConfig::default(),
            middleware: MiddlewareConfig::default(),
            session: SessionConfig::default(),
            stats: StatsConfig::default(),
        }
    }
}
