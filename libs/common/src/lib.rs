//! Common library for the Model2 control application
//!
//! Shared infrastructure used by the services: PostgreSQL pooling, the Redis
//! client, and the error types both raise.

pub mod cache;
pub mod database;
pub mod error;
