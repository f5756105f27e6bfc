//! User repository for database operations

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row};
use tracing::{error, info};

use crate::{
    models::{Credentials, UserProfile},
    verifier::{CredentialVerifier, Verification, VerifyError, hash_password, verify_password},
};

/// User repository backed by the `users` table
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `users` table if it does not exist yet
    pub async fn ensure_schema(&self) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                user_id TEXT PRIMARY KEY,
                user_name TEXT,
                password_hash TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Migration)?;

        Ok(())
    }

    /// Insert a user, or reset name and password of an existing one
    pub async fn upsert(
        &self,
        user_id: &str,
        user_name: Option<&str>,
        password: &str,
    ) -> anyhow::Result<()> {
        info!("Upserting user: {}", user_id);

        let password_hash = hash_password(password)?;

        sqlx::query(
            r#"
            INSERT INTO users (user_id, user_name, password_hash)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id)
            DO UPDATE SET user_name = EXCLUDED.user_name, password_hash = EXCLUDED.password_hash
            "#,
        )
        .bind(user_id)
        .bind(user_name)
        .bind(&password_hash)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(())
    }

    /// Find the stored name and password hash of a user
    pub async fn find_by_user_id(
        &self,
        user_id: &str,
    ) -> DatabaseResult<Option<(Option<String>, String)>> {
        let row = sqlx::query(
            r#"
            SELECT user_name, password_hash
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(row.map(|row| (row.get("user_name"), row.get("password_hash"))))
    }
}

#[async_trait]
impl CredentialVerifier for UserRepository {
    async fn verify(&self, credentials: &Credentials) -> Result<Verification, VerifyError> {
        info!("Looking up user: {}", credentials.user_id);

        let found = self
            .find_by_user_id(&credentials.user_id)
            .await
            .map_err(|e| {
                error!("Failed to look up user {}: {}", credentials.user_id, e);
                VerifyError::Unavailable(e.to_string())
            })?;

        let Some((user_name, password_hash)) = found else {
            return Ok(Verification::Rejected);
        };

        if verify_password(&credentials.user_id, &credentials.user_pwd, &password_hash)? {
            Ok(Verification::Verified(UserProfile { user_name }))
        } else {
            Ok(Verification::Rejected)
        }
    }
}
