//! JWT validation and the admin guard for protected routes

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use std::sync::Arc;

use super::token::{extract_token, Claims};
use crate::auth::tokens::{parse_algorithm, ADMIN_ROLE};
use crate::config::JwtConfig;
use crate::error::Error;
use crate::ids::AdminId;
use crate::state::AppState;
use crate::store::AdminStore;

/// Identity attached to requests that passed [`require_admin`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedAdmin {
    pub id: AdminId,
    pub email: String,
}

/// Validates admin bearer tokens
#[derive(Clone)]
pub struct JwtAuth {
    decoding_key: Arc<DecodingKey>,
    validation: Validation,
}

impl JwtAuth {
    pub fn new(config: &JwtConfig, secret: &[u8]) -> Result<Self, Error> {
        let algorithm = parse_algorithm(&config.algorithm)?;

        let mut validation = Validation::new(algorithm);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key: Arc::new(DecodingKey::from_secret(secret)),
            validation,
        })
    }

    /// Check signature, expiry, issuer and audience
    pub fn validate_token(&self, token: &str) -> Result<Claims, Error> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Validate `token` and confirm the admin it names still exists
    pub async fn authenticate(
        &self,
        token: &str,
        admins: &dyn AdminStore,
    ) -> Result<(Claims, AuthenticatedAdmin), Error> {
        let failed = || Error::Unauthorized("Not authorized, token failed".to_string());

        let claims = self.validate_token(token)?;
        if !claims.has_role(ADMIN_ROLE) {
            return Err(failed());
        }
        let admin_id = claims.admin_id().ok_or_else(failed)?;

        let admin = admins.get_admin(&admin_id).await?.ok_or_else(|| {
            tracing::debug!(admin_id = %admin_id, "Token names an admin that no longer exists");
            failed()
        })?;

        let identity = AuthenticatedAdmin {
            id: admin.id,
            email: admin.email,
        };
        Ok((claims, identity))
    }
}

/// Route guard for admin-only endpoints
///
/// Rejects with 401 when the bearer token is missing, invalid or expired, or
/// when its admin has been removed. On success the request carries
/// [`AuthenticatedAdmin`] and [`Claims`] as extensions.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Error> {
    let token = extract_token(request.headers())?;
    let (claims, admin) = state
        .jwt_auth
        .authenticate(&token, state.stores.admins.as_ref())
        .await?;

    tracing::debug!(admin_id = %admin.id, "Admin authenticated");

    request.extensions_mut().insert(claims);
    request.extensions_mut().insert(admin);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::tokens::JwtGenerator;
    use crate::config::Config;
    use crate::model::{Admin, NewAdmin};
    use crate::store::MemoryStore;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &[u8] = b"test-secret";

    async fn seeded() -> (MemoryStore, Admin) {
        let store = MemoryStore::new();
        let admin = store
            .insert_admin(NewAdmin {
                name: "Root".into(),
                email: "root@example.com".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();
        (store, admin)
    }

    #[tokio::test]
    async fn test_issued_token_authenticates() {
        let config = Config::default().jwt;
        let generator = JwtGenerator::new(&config, SECRET).unwrap();
        let auth = JwtAuth::new(&config, SECRET).unwrap();
        let (store, admin) = seeded().await;

        let token = generator.issue(&admin).unwrap();
        let (claims, identity) = auth.authenticate(&token, &store).await.unwrap();

        assert_eq!(identity.id, admin.id);
        assert_eq!(identity.email, "root@example.com");
        assert_eq!(claims.email.as_deref(), Some("root@example.com"));
        assert!(claims.jti.is_some());
        assert!(claims.exp > Utc::now().timestamp() + 29 * 24 * 3600);
    }

    #[tokio::test]
    async fn test_wrong_secret_fails() {
        let config = Config::default().jwt;
        let generator = JwtGenerator::new(&config, b"other-secret").unwrap();
        let auth = JwtAuth::new(&config, SECRET).unwrap();
        let (store, admin) = seeded().await;

        let token = generator.issue(&admin).unwrap();
        let err = auth.authenticate(&token, &store).await.unwrap_err();
        assert!(matches!(err, Error::Jwt(_)));
        assert_eq!(err.public_message(), "Not authorized, token failed");
    }

    #[tokio::test]
    async fn test_expired_token_fails() {
        let config = Config::default().jwt;
        let auth = JwtAuth::new(&config, SECRET).unwrap();
        let (store, admin) = seeded().await;

        let claims = Claims {
            sub: format!("admin:{}", admin.id),
            email: Some(admin.email.clone()),
            roles: vec!["admin".into()],
            exp: Utc::now().timestamp() - 3600,
            iat: Some(Utc::now().timestamp() - 7200),
            jti: None,
            iss: None,
            aud: None,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap();

        assert!(auth.authenticate(&token, &store).await.is_err());
    }

    #[tokio::test]
    async fn test_deleted_admin_fails() {
        let config = Config::default().jwt;
        let generator = JwtGenerator::new(&config, SECRET).unwrap();
        let auth = JwtAuth::new(&config, SECRET).unwrap();
        let (store, _) = seeded().await;

        let ghost = Admin::from_new(
            NewAdmin {
                name: "Ghost".into(),
                email: "ghost@example.com".into(),
                password_hash: "hash".into(),
            },
            Utc::now(),
        );
        let token = generator.issue(&ghost).unwrap();

        match auth.authenticate(&token, &store).await {
            Err(Error::Unauthorized(msg)) => assert_eq!(msg, "Not authorized, token failed"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_issuer_and_audience_are_enforced() {
        let mut config = Config::default().jwt;
        config.issuer = Some("feedback".into());
        config.audience = Some("dashboard".into());
        let auth = JwtAuth::new(&config, SECRET).unwrap();
        let (store, admin) = seeded().await;

        let good = JwtGenerator::new(&config, SECRET).unwrap().issue(&admin).unwrap();
        assert!(auth.authenticate(&good, &store).await.is_ok());

        let unscoped = JwtGenerator::new(&Config::default().jwt, SECRET)
            .unwrap()
            .issue(&admin)
            .unwrap();
        assert!(auth.authenticate(&unscoped, &store).await.is_err());
    }
}
