//! Typed error enum for the queue broker adapter.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("amqp error: {0}")]
    Amqp(#[from] lapin::Error),
    #[error("payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
