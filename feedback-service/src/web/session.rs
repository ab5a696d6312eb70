//! Browser sessions for the admin pages
//!
//! The session only ever holds the admin's bearer token. Every dashboard
//! request re-validates it exactly like the JSON API does.
//!
//! ```toml
//! [session]
//! cookie_name = "feedback_session"
//! expiry_secs = 86400
//! secure = true  # behind HTTPS
//! same_site = "lax"
//! ```

use serde::{Deserialize, Serialize};
use time::Duration;
use tower_sessions::{cookie::SameSite, Expiry, Session, SessionManagerLayer};
use tower_sessions_memory_store::MemoryStore;

use crate::error::{Error, Result};

const TOKEN_KEY: &str = "admin_token";

/// Session cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session cookie name
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Inactivity expiry in seconds; `0` ends the session with the browser
    #[serde(default = "default_expiry_secs")]
    pub expiry_secs: u64,

    #[serde(default = "default_cookie_path")]
    pub cookie_path: String,

    /// Only send the cookie over HTTPS
    #[serde(default)]
    pub secure: bool,

    #[serde(default = "default_http_only")]
    pub http_only: bool,

    /// `"strict"`, `"lax"` or `"none"`
    #[serde(default = "default_same_site")]
    pub same_site: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            expiry_secs: default_expiry_secs(),
            cookie_path: default_cookie_path(),
            secure: false,
            http_only: default_http_only(),
            same_site: default_same_site(),
        }
    }
}

fn default_cookie_name() -> String {
    "feedback_session".to_string()
}

fn default_expiry_secs() -> u64 {
    86400
}

fn default_cookie_path() -> String {
    "/".to_string()
}

fn default_http_only() -> bool {
    true
}

fn default_same_site() -> String {
    "lax".to_string()
}

/// Build the in-memory session layer from configuration
pub fn create_memory_session_layer(config: &SessionConfig) -> SessionManagerLayer<MemoryStore> {
    let expiry = if config.expiry_secs == 0 {
        Expiry::OnSessionEnd
    } else {
        Expiry::OnInactivity(Duration::seconds(config.expiry_secs as i64))
    };

    let same_site = match config.same_site.to_lowercase().as_str() {
        "strict" => SameSite::Strict,
        "none" => SameSite::None,
        _ => SameSite::Lax,
    };

    SessionManagerLayer::new(MemoryStore::default())
        .with_name(config.cookie_name.clone())
        .with_expiry(expiry)
        .with_secure(config.secure)
        .with_http_only(config.http_only)
        .with_same_site(same_site)
        .with_path(config.cookie_path.clone())
}

fn session_error(e: tower_sessions::session::Error) -> Error {
    Error::Internal(format!("Session error: {}", e))
}

/// Store a freshly issued token, rotating the session id
pub async fn sign_in(session: &Session, token: &str) -> Result<()> {
    session.cycle_id().await.map_err(session_error)?;
    session
        .insert(TOKEN_KEY, token)
        .await
        .map_err(session_error)
}

/// The stored token, if any
pub async fn token(session: &Session) -> Result<Option<String>> {
    session.get::<String>(TOKEN_KEY).await.map_err(session_error)
}

/// Drop the token and the session itself
pub async fn sign_out(session: &Session) -> Result<()> {
    session.flush().await.map_err(session_error)
}
