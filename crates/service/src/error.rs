//! Typed error enum for the pipeline orchestrator and worker supervisor.
//!
//! Unifies storage and queue failures into a single error type, the way
//! `ServiceError` wraps `StorageError`/`LlmError`/`EmbeddingError` in the
//! teacher's service layer.

use smsguard_queue::QueueError;
use smsguard_storage::StorageError;
use thiserror::Error;

/// Errors raised by the pipeline orchestrator (C8) and worker supervisor (C9).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required environment variable is missing or a startup connection
    /// (Postgres, RabbitMQ, Redis) failed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A startup connection to a collaborator (Redis dedup/limiter) failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// Event store operation failed.
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Queue broker operation failed.
    #[error("queue: {0}")]
    Queue(#[from] QueueError),

    /// The payload could not be processed: malformed JSON, missing
    /// `sms_event_id`, or an `sms_event_id` with no matching row.
    /// Per spec.md §7, this class is logged at WARN and the message is
    /// discarded rather than requeued — it is not a transient fault.
    #[error("bad payload: {0}")]
    BadPayload(String),
}

impl PipelineError {
    /// Whether this error is the "bad payload" class (spec.md §7):
    /// discarded with a WARN log rather than an ERROR log. Both classes
    /// resolve to the same `nack(requeue=false)` action (see DESIGN.md) —
    /// this only controls log severity.
    #[must_use]
    pub const fn is_bad_payload(&self) -> bool {
        matches!(self, Self::BadPayload(_))
    }
}
