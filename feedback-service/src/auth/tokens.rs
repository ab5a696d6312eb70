//! Bearer token issuing
//!
//! Tokens are HMAC-signed JWTs. The claims are shared with the validating side
//! in [`crate::middleware::Claims`].

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use rand::RngCore;

use crate::config::JwtConfig;
use crate::error::Error;
use crate::middleware::Claims;
use crate::model::Admin;

/// Role stamped into every admin token
pub const ADMIN_ROLE: &str = "admin";

const GENERATED_SECRET_BYTES: usize = 32;

/// Resolve the signing secret from configuration
///
/// `jwt.secret` wins over `jwt.secret_path`. With neither set a random secret
/// is generated; tokens then stop validating when the process restarts.
pub fn load_secret(config: &JwtConfig) -> Result<Vec<u8>, Error> {
    if let Some(secret) = config.secret.as_deref().filter(|s| !s.is_empty()) {
        return Ok(secret.as_bytes().to_vec());
    }

    if let Some(path) = &config.secret_path {
        let raw = fs::read(path).map_err(|e| {
            Error::Config(Box::new(figment::Error::from(format!(
                "Failed to read JWT secret from '{}': {}",
                path.display(),
                e
            ))))
        })?;
        let trimmed = raw.trim_ascii_end().to_vec();
        if trimmed.is_empty() {
            return Err(Error::Config(Box::new(figment::Error::from(format!(
                "JWT secret file '{}' is empty",
                path.display()
            )))));
        }
        return Ok(trimmed);
    }

    tracing::warn!(
        "No jwt.secret or jwt.secret_path configured; using an ephemeral secret. \
         Issued tokens will not survive a restart."
    );
    let mut secret = vec![0u8; GENERATED_SECRET_BYTES];
    rand::rng().fill_bytes(&mut secret);
    Ok(secret)
}

/// Parse an HMAC algorithm name
pub(crate) fn parse_algorithm(alg: &str) -> Result<Algorithm, Error> {
    match alg.to_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        _ => Err(Error::Config(Box::new(figment::Error::from(format!(
            "Unsupported JWT algorithm: {} (expected HS256, HS384 or HS512)",
            alg
        ))))),
    }
}

/// Signs admin tokens
#[derive(Clone)]
pub struct JwtGenerator {
    encoding_key: Arc<EncodingKey>,
    algorithm: Algorithm,
    lifetime: Duration,
    issuer: Option<String>,
    audience: Option<String>,
}

impl JwtGenerator {
    pub fn new(config: &JwtConfig, secret: &[u8]) -> Result<Self, Error> {
        Ok(Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret)),
            algorithm: parse_algorithm(&config.algorithm)?,
            lifetime: config.token_lifetime(),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
        })
    }

    /// Issue a token for `admin` with the configured lifetime
    pub fn issue(&self, admin: &Admin) -> Result<String, Error> {
        self.issue_with_expiry(admin, self.lifetime)
    }

    pub fn issue_with_expiry(&self, admin: &Admin, expires_in: Duration) -> Result<String, Error> {
        let now = Utc::now().timestamp();
        let exp = i64::try_from(expires_in.as_secs())
            .ok()
            .and_then(|secs| now.checked_add(secs))
            .ok_or_else(|| {
                Error::Internal(format!("token lifetime of {expires_in:?} is out of range"))
            })?;
        let claims = Claims {
            sub: format!("admin:{}", admin.id),
            email: Some(admin.email.clone()),
            roles: vec![ADMIN_ROLE.to_string()],
            exp,
            iat: Some(now),
            jti: Some(uuid::Uuid::new_v4().to_string()),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let header = Header::new(self.algorithm);
        encode(&header, &claims, &self.encoding_key).map_err(Error::from)
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::NewAdmin;
    use std::io::Write;

    fn admin() -> Admin {
        Admin::from_new(
            NewAdmin {
                name: "Root".into(),
                email: "root@example.com".into(),
                password_hash: "hash".into(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_inline_secret_wins() {
        let mut config = Config::default().jwt;
        config.secret = Some("inline".into());
        config.secret_path = Some("/nonexistent".into());
        assert_eq!(load_secret(&config).unwrap(), b"inline".to_vec());
    }

    #[test]
    fn test_secret_file_is_trimmed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "from-file").unwrap();

        let mut config = Config::default().jwt;
        config.secret_path = Some(file.path().to_path_buf());
        assert_eq!(load_secret(&config).unwrap(), b"from-file".to_vec());
    }

    #[test]
    fn test_missing_secret_file_is_config_error() {
        let mut config = Config::default().jwt;
        config.secret_path = Some("/definitely/not/here".into());
        assert!(matches!(load_secret(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_generated_secrets_differ() {
        let config = Config::default().jwt;
        let a = load_secret(&config).unwrap();
        let b = load_secret(&config).unwrap();
        assert_eq!(a.len(), GENERATED_SECRET_BYTES);
        assert_ne!(a, b);
    }

    #[test]
    fn test_rejects_asymmetric_algorithm() {
        let mut config = Config::default().jwt;
        config.algorithm = "RS256".into();
        assert!(JwtGenerator::new(&config, b"secret").is_err());
    }

    #[test]
    fn test_issue_produces_three_part_token() {
        let config = Config::default().jwt;
        let generator = JwtGenerator::new(&config, b"secret").unwrap();
        let token = generator.issue(&admin()).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(generator.lifetime(), config.token_lifetime());
    }

    #[test]
    fn test_unrepresentable_expiry_is_an_error() {
        let generator = JwtGenerator::new(&Config::default().jwt, b"secret").unwrap();
        for expires_in in [Duration::from_secs(u64::MAX), Duration::from_secs(i64::MAX as u64)] {
            assert!(matches!(
                generator.issue_with_expiry(&admin(), expires_in),
                Err(Error::Internal(_))
            ));
        }
    }
}
