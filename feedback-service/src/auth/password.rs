//! Password hashing using Argon2id
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=…,t=…,p=…$salt$hash`), so the
//! parameters travel with the hash and verification needs no configuration.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as Argon2Hasher, PasswordVerifier,
        SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::auth::config::PasswordConfig;
use crate::error::Error;
use crate::validation::ValidationErrors;

/// Password hasher using Argon2id
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    min_password_length: usize,
}

impl PasswordHasher {
    /// Create a hasher from configuration
    ///
    /// Fails when the cost parameters are outside what Argon2 accepts.
    pub fn new(config: &PasswordConfig) -> Result<Self, Error> {
        let params = Params::new(
            config.memory_cost_kib,
            config.time_cost,
            config.parallelism,
            None,
        )
        .map_err(|e| Error::Internal(format!("Invalid Argon2 parameters: {}", e)))?;

        Ok(Self {
            params,
            min_password_length: config.min_password_length,
        })
    }

    /// Hash a password with a fresh random salt
    ///
    /// Passwords shorter than `min_password_length` are rejected as a
    /// validation error on the `password` field.
    pub fn hash(&self, password: &str) -> Result<String, Error> {
        if password.chars().count() < self.min_password_length {
            let mut errors = ValidationErrors::new();
            errors.add(
                "password",
                "TOO_SHORT",
                format!(
                    "Password must be at least {} characters",
                    self.min_password_length
                ),
            );
            return Err(errors.into());
        }

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash in constant time
    ///
    /// A mismatch is `Ok(false)`; only a malformed hash is an error.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, Error> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| Error::Internal(format!("Invalid password hash format: {}", e)))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Internal(format!(
                "Password verification failed: {}",
                e
            ))),
        }
    }

    pub fn min_password_length(&self) -> usize {
        self.min_password_length
    }
}
