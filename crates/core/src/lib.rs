//! Core types shared across the SMS cost-guard pipeline crates.
//!
//! This crate contains domain types, the error taxonomy and env config
//! helpers used by every other crate in the workspace.

/// Shared default constants (timeouts, thresholds, key prefixes).
pub mod constants;
/// Env var parsing helpers (warn-and-default vs fail-fast).
pub mod env_config;
/// Error types for core domain parsing.
mod error;
/// Phone+body dedup fingerprint.
mod fingerprint;
/// Phone number normalization.
mod phone;
/// `QueuePayload` — the unit of work on the MAIN/DLQ queues.
mod queue_payload;
/// `AiCall` audit record.
mod ai_call;
/// `SmsEvent` lifecycle record and related enums.
mod sms_event;

pub use ai_call::AiCall;
pub use error::CoreError;
pub use fingerprint::phone_body_fingerprint;
pub use phone::normalize_phone;
pub use queue_payload::QueuePayload;
pub use sms_event::{Dlr, ProviderStatus, SmsEvent, SmsStatus, segment_count_for};
