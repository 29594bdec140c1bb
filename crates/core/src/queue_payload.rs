//! `QueuePayload` — the unit of work on both the MAIN and DLQ queues
//! (spec.md §3, §6.1).

use serde::{Deserialize, Serialize};

use crate::sms_event::Dlr;

/// JSON payload carried on `MAIN`/`DLQ`. Only `sms_event_id` is required;
/// everything else is advisory — the orchestrator reconciles against the
/// authoritative event row on dequeue. Unknown keys are ignored (no
/// `deny_unknown_fields`), matching spec.md's Design Notes on tagged records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuePayload {
    pub sms_event_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_count: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_dlr: Option<Dlr>,
}

impl QueuePayload {
    #[must_use]
    pub const fn new(sms_event_id: i64) -> Self {
        Self {
            sms_event_id,
            phone: None,
            body: None,
            retry_count: None,
            segment_count: None,
            last_dlr: None,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub const fn with_retry_count(mut self, retry_count: i32) -> Self {
        self.retry_count = Some(retry_count);
        self
    }

    #[must_use]
    pub const fn with_segment_count(mut self, segment_count: i32) -> Self {
        self.segment_count = Some(segment_count);
        self
    }

    #[must_use]
    pub const fn with_last_dlr(mut self, last_dlr: Dlr) -> Self {
        self.last_dlr = Some(last_dlr);
        self
    }
}
