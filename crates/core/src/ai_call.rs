//! `AiCall` — immutable audit record of an advisor invocation (spec.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiCall {
    pub id: i64,
    pub sms_event_id: Option<i64>,
    pub model: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub decision: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}
