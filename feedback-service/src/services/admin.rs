//! Admin registration, login and profile lookup

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::auth::{JwtGenerator, PasswordHasher};
use crate::error::{Error, Result};
use crate::ids::AdminId;
use crate::model::{Admin, AdminProfile, NewAdmin};
use crate::store::AdminStore;
use crate::validation::{normalize_email, validate_registration, RegisterInput};

const REGISTRATION_LOCKED: &str = "Admin registration is locked after the first account";
const ADMIN_EXISTS: &str = "Admin already exists";
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Login request body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Returned by register and login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "_id")]
    pub id: AdminId,
    pub name: String,
    pub email: String,
    pub token: String,
}

/// Admin account use cases
#[derive(Clone)]
pub struct AdminService {
    admins: Arc<dyn AdminStore>,
    hasher: PasswordHasher,
    tokens: JwtGenerator,
    // Serializes the "no admin yet" check with the insert that follows it
    registration: Arc<Mutex<()>>,
}

impl AdminService {
    pub fn new(admins: Arc<dyn AdminStore>, hasher: PasswordHasher, tokens: JwtGenerator) -> Self {
        Self {
            admins,
            hasher,
            tokens,
            registration: Arc::new(Mutex::new(())),
        }
    }

    /// Create the first admin account and sign it in
    ///
    /// Once any admin exists, registration is closed with 403.
    pub async fn register(&self, input: &RegisterInput) -> Result<AuthResponse> {
        let _guard = self.registration.lock().await;

        if self.admins.count_admins().await? > 0 {
            tracing::warn!("Rejected admin registration: an admin already exists");
            return Err(Error::Forbidden(REGISTRATION_LOCKED.to_string()));
        }

        let valid = validate_registration(input, self.hasher.min_password_length())?;

        if self.admins.find_admin_by_email(&valid.email).await?.is_some() {
            return Err(Error::BadRequest(ADMIN_EXISTS.to_string()));
        }

        let hasher = self.hasher.clone();
        let password = valid.password;
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| Error::Internal(format!("Password hashing task failed: {}", e)))??;

        let admin = match self
            .admins
            .insert_admin(NewAdmin {
                name: valid.name,
                email: valid.email,
                password_hash,
            })
            .await
        {
            Ok(admin) => admin,
            Err(e) if e.is_duplicate() => return Err(Error::BadRequest(ADMIN_EXISTS.to_string())),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(admin_id = %admin.id, "First admin registered");
        self.respond(admin)
    }

    /// Check credentials and issue a token
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, input: &LoginInput) -> Result<AuthResponse> {
        let invalid = || Error::Unauthorized(INVALID_CREDENTIALS.to_string());

        let email = input.email.as_deref().map(normalize_email).unwrap_or_default();
        let password = input.password.clone().unwrap_or_default();
        if email.is_empty() || password.is_empty() {
            return Err(invalid());
        }

        let Some(admin) = self.admins.find_admin_by_email(&email).await? else {
            tracing::debug!("Login attempt for unknown email");
            return Err(invalid());
        };

        let hasher = self.hasher.clone();
        let hash = admin.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| Error::Internal(format!("Password verification task failed: {}", e)))??;

        if !matches {
            tracing::debug!(admin_id = %admin.id, "Login attempt with wrong password");
            return Err(invalid());
        }

        tracing::info!(admin_id = %admin.id, "Admin logged in");
        self.respond(admin)
    }

    pub async fn profile(&self, id: &AdminId) -> Result<AdminProfile> {
        self.admins
            .get_admin(id)
            .await?
            .map(|admin| admin.profile())
            .ok_or_else(|| Error::NotFound("Admin not found".to_string()))
    }

    fn respond(&self, admin: Admin) -> Result<AuthResponse> {
        let token = self.tokens.issue(&admin)?;
        Ok(AuthResponse {
            id: admin.id,
            name: admin.name,
            email: admin.email,
            token,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::PasswordConfig;
    use crate::config::Config;
    use crate::middleware::JwtAuth;
    use crate::store::MemoryStore;

    pub(crate) const TEST_SECRET: &[u8] = b"admin-service-secret";

    pub(crate) fn light_hasher() -> PasswordHasher {
        PasswordHasher::new(&PasswordConfig {
            memory_cost_kib: 4096,
            time_cost: 1,
            parallelism: 1,
            min_password_length: 8,
        })
        .unwrap()
    }

    fn service() -> (AdminService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let tokens = JwtGenerator::new(&Config::default().jwt, TEST_SECRET).unwrap();
        (AdminService::new(store.clone(), light_hasher(), tokens), store)
    }

    fn registration(email: &str) -> RegisterInput {
        RegisterInput {
            name: Some("Root".into()),
            email: Some(email.into()),
            password: Some("correct horse battery".into()),
        }
    }

    #[tokio::test]
    async fn test_first_registration_succeeds_and_token_validates() {
        let (service, store) = service();
        let response = service.register(&registration("Root@Example.com")).await.unwrap();
        assert_eq!(response.email, "root@example.com");

        let auth = JwtAuth::new(&Config::default().jwt, TEST_SECRET).unwrap();
        let (_, identity) = auth
            .authenticate(&response.token, store.as_ref())
            .await
            .unwrap();
        assert_eq!(identity.id, response.id);
    }

    #[tokio::test]
    async fn test_second_registration_is_locked() {
        let (service, _) = service();
        service.register(&registration("root@example.com")).await.unwrap();

        match service.register(&registration("other@example.com")).await {
            Err(Error::Forbidden(msg)) => assert_eq!(msg, REGISTRATION_LOCKED),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_concurrent_registrations_admit_one() {
        let (service, store) = service();
        let a = service.clone();
        let b = service.clone();
        let first = registration("a@example.com");
        let second = registration("b@example.com");
        let (ra, rb) = tokio::join!(a.register(&first), b.register(&second));
        assert!(ra.is_ok() ^ rb.is_ok());
        assert_eq!(store.count_admins().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_registration_validation() {
        let (service, _) = service();
        let err = service
            .register(&RegisterInput {
                name: Some("Root".into()),
                email: Some("root@example.com".into()),
                password: Some("short".into()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_login() {
        let (service, _) = service();
        let registered = service.register(&registration("root@example.com")).await.unwrap();

        let ok = service
            .login(&LoginInput {
                email: Some(" ROOT@example.com ".into()),
                password: Some("correct horse battery".into()),
            })
            .await
            .unwrap();
        assert_eq!(ok.id, registered.id);

        for (email, password) in [
            ("root@example.com", "wrong password"),
            ("nobody@example.com", "correct horse battery"),
            ("", ""),
        ] {
            match service
                .login(&LoginInput {
                    email: Some(email.into()),
                    password: Some(password.into()),
                })
                .await
            {
                Err(Error::Unauthorized(msg)) => assert_eq!(msg, INVALID_CREDENTIALS),
                other => panic!("unexpected: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_profile() {
        let (service, _) = service();
        let registered = service.register(&registration("root@example.com")).await.unwrap();

        let profile = service.profile(&registered.id).await.unwrap();
        assert_eq!(profile.name, "Root");

        match service.profile(&AdminId::new()).await {
            Err(Error::NotFound(msg)) => assert_eq!(msg, "Admin not found"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
