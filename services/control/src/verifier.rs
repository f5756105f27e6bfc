//! Credential lookup used by the `logonAction` dispatch

use std::collections::HashMap;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Credentials, UserProfile};

/// Outcome of a credential check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Verified(UserProfile),
    Rejected,
}

/// Lookup could not give an answer
#[derive(Error, Debug)]
pub enum VerifyError {
    /// Backing store unreachable or failing
    #[error("{0}")]
    Unavailable(String),

    /// Stored password hash could not be parsed
    #[error("Invalid stored password hash for {user_id}: {reason}")]
    InvalidHash { user_id: String, reason: String },
}

/// Checks submitted credentials against a backing store
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, credentials: &Credentials) -> Result<Verification, VerifyError>;
}

/// Hash a password with argon2 and a fresh salt
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();
    Ok(hash)
}

/// Check `password` against a PHC-formatted argon2 hash
pub fn verify_password(user_id: &str, password: &str, hash: &str) -> Result<bool, VerifyError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| VerifyError::InvalidHash {
        user_id: user_id.to_string(),
        reason: e.to_string(),
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[derive(Debug, Clone)]
struct StoredUser {
    user_name: Option<String>,
    password_hash: String,
}

/// Verifier over a fixed set of users held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialVerifier {
    users: HashMap<String, StoredUser>,
}

impl InMemoryCredentialVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user, hashing the password
    pub fn with_user(
        mut self,
        user_id: &str,
        user_name: Option<&str>,
        password: &str,
    ) -> anyhow::Result<Self> {
        self.users.insert(
            user_id.to_string(),
            StoredUser {
                user_name: user_name.map(str::to_string),
                password_hash: hash_password(password)?,
            },
        );
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl CredentialVerifier for InMemoryCredentialVerifier {
    async fn verify(&self, credentials: &Credentials) -> Result<Verification, VerifyError> {
        let Some(stored) = self.users.get(&credentials.user_id) else {
            debug!("No such user: {:?}", credentials.user_id);
            return Ok(Verification::Rejected);
        };

        if verify_password(
            &credentials.user_id,
            &credentials.user_pwd,
            &stored.password_hash,
        )? {
            Ok(Verification::Verified(UserProfile {
                user_name: stored.user_name.clone(),
            }))
        } else {
            warn!("Password mismatch for user: {}", credentials.user_id);
            Ok(Verification::Rejected)
        }
    }
}
