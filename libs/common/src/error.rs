//! Infrastructure error types shared by the services
//!
//! Services wrap these into their own error enums and decide how each one
//! surfaces at the HTTP boundary.

use redis::RedisError;
use sqlx::Error as SqlxError;
use thiserror::Error;

/// Errors raised while talking to PostgreSQL
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred while creating or upgrading the schema
    #[error("Database migration error: {0}")]
    Migration(#[source] SqlxError),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Errors raised while talking to Redis
#[derive(Error, Debug)]
pub enum CacheError {
    /// The client could not be created or a connection could not be opened
    #[error("Redis connection error: {0}")]
    Connection(#[source] RedisError),

    /// A command was sent but failed
    #[error("Redis command error: {0}")]
    Command(#[source] RedisError),

    /// Server answered with something other than what was asked for
    #[error("Unexpected Redis reply: {0}")]
    UnexpectedReply(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Type alias for Result with CacheError
pub type CacheResult<T> = Result<T, CacheError>;
