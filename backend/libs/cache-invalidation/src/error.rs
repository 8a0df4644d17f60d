//! Error types for stale-view invalidation

use thiserror::Error;

/// Invalidation errors
#[derive(Error, Debug)]
pub enum InvalidationError {
    /// Redis connection or operation error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Message serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Path that does not name a known view
    #[error("Invalid view path: {0}")]
    InvalidView(String),
}
