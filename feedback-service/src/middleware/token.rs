//! Token claims and header extraction

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::ids::AdminId;

const SUBJECT_PREFIX: &str = "admin:";

/// JWT claims carried by admin tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, `admin:<admin id>`
    pub sub: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default)]
    pub roles: Vec<String>,

    /// Expiration (Unix seconds)
    pub exp: i64,

    /// Issued at (Unix seconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Token id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

impl Claims {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Admin id from the subject, if the subject names an admin
    pub fn admin_id(&self) -> Option<AdminId> {
        self.sub.strip_prefix(SUBJECT_PREFIX)?.parse().ok()
    }
}

/// Pull the bearer token out of the `Authorization` header
pub fn extract_token(headers: &HeaderMap) -> Result<String, Error> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::Unauthorized("Not authorized, no token".to_string()))
}
