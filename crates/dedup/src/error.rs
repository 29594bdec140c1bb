//! Typed error enum for the dedup/limiter crate.
//!
//! Per spec.md §4.1/§4.2, callers never see a bare Redis failure: dedup fails
//! open (`check`/`mark` swallow errors and log), the limiter fails closed.
//! This type exists for the one place an error *does* propagate — building
//! the initial connection manager at startup.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DedupError {
    #[error("redis connection error: {0}")]
    Connection(#[source] redis::RedisError),
}

impl From<redis::RedisError> for DedupError {
    fn from(err: redis::RedisError) -> Self {
        Self::Connection(err)
    }
}
