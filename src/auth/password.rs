// Salted one-way password hashing (Argon2id, PHC string format)

use crate::core::errors::IdentityError;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;

/// Argon2id hasher with default parameters
#[derive(Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, password: &Secret<String>) -> Result<String, IdentityError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.expose_secret().as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| IdentityError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// `hash` on the blocking pool, keeping async workers free
    pub async fn hash_blocking(
        self: Arc<Self>,
        password: Secret<String>,
    ) -> Result<String, IdentityError> {
        tokio::task::spawn_blocking(move || self.hash(&password))
            .await
            .map_err(|e| IdentityError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    /// Check a password against a stored PHC hash
    pub fn verify(&self, password: &Secret<String>, password_hash: &str) -> bool {
        match PasswordHash::new(password_hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.expose_secret().as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}
