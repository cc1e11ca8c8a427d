//! Infrastructure error types shared across services

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Errors raised by the database layer
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a connection to PostgreSQL
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// A query against PostgreSQL failed
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// The connection configuration is invalid
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors raised by the cache layer
#[derive(Error, Debug)]
pub enum CacheError {
    /// Failed to open or talk to the Redis server
    #[error("Cache connection error: {0}")]
    Connection(#[source] redis::RedisError),

    /// A cache command failed after the connection was established
    #[error("Cache command error: {0}")]
    Command(#[source] redis::RedisError),
}

/// Type alias for Result with CacheError
pub type CacheResult<T> = Result<T, CacheError>;
