//! Admin credentials: password hashing and bearer token issuing
//!
//! Token *validation* lives in [`crate::middleware`], next to the extractor
//! that guards protected routes.

pub mod config;
pub mod password;
pub mod tokens;

pub use config::{AuthConfig, PasswordConfig};
pub use password::PasswordHasher;
pub use tokens::{load_secret, JwtGenerator};
