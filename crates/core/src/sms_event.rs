//! `SmsEvent` — the message lifecycle record (spec.md §3).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle status of an `SmsEvent`. Terminal states are `Sent`, `Blocked`,
/// `InDlq`; `Failed` is transient and must be followed by a retry enqueue or
/// an escalation to `InDlq`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SmsStatus {
    Pending,
    Sent,
    Blocked,
    Failed,
    InReview,
    InDlq,
}

impl SmsStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Sent => "SENT",
            Self::Blocked => "BLOCKED",
            Self::Failed => "FAILED",
            Self::InReview => "IN_REVIEW",
            Self::InDlq => "IN_DLQ",
        }
    }

    /// Whether this status is one of the pipeline's terminal states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Blocked | Self::InDlq)
    }
}

impl fmt::Display for SmsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SmsStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "SENT" => Ok(Self::Sent),
            "BLOCKED" => Ok(Self::Blocked),
            "FAILED" => Ok(Self::Failed),
            "IN_REVIEW" => Ok(Self::InReview),
            "IN_DLQ" => Ok(Self::InDlq),
            other => Err(CoreError::InvalidSmsStatus(other.to_owned())),
        }
    }
}

/// Delivery-receipt outcome reported by (or simulated for) the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Dlr {
    Delivered,
    Failed,
    Blocked,
    Timeout,
}

impl Dlr {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delivered => "DELIVERED",
            Self::Failed => "FAILED",
            Self::Blocked => "BLOCKED",
            Self::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for Dlr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dlr {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DELIVERED" => Ok(Self::Delivered),
            "FAILED" => Ok(Self::Failed),
            "BLOCKED" => Ok(Self::Blocked),
            "TIMEOUT" => Ok(Self::Timeout),
            other => Err(CoreError::InvalidDlr(other.to_owned())),
        }
    }
}

/// Provider status codes from spec.md §6.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderStatus {
    Queued = 1,
    Scheduled = 2,
    SentToCarrier4 = 4,
    SentToCarrier5 = 5,
    FailedToSend = 6,
    Delivered = 10,
    Undelivered = 11,
    Cancelled = 13,
    BlockedOptOut = 14,
    InvalidMessageId = 100,
}

impl ProviderStatus {
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Whether this status code is a final outcome for the message.
    #[must_use]
    pub const fn is_final(self) -> bool {
        !matches!(
            self,
            Self::Queued
                | Self::Scheduled
                | Self::SentToCarrier4
                | Self::SentToCarrier5
        )
    }

    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Queued),
            2 => Some(Self::Scheduled),
            4 => Some(Self::SentToCarrier4),
            5 => Some(Self::SentToCarrier5),
            6 => Some(Self::FailedToSend),
            10 => Some(Self::Delivered),
            11 => Some(Self::Undelivered),
            13 => Some(Self::Cancelled),
            14 => Some(Self::BlockedOptOut),
            100 => Some(Self::InvalidMessageId),
            _ => None,
        }
    }
}

/// The message lifecycle record (spec.md §3 `SmsEvent`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmsEvent {
    pub id: i64,
    pub provider_message_id: Option<String>,
    pub phone: String,
    pub body: String,
    pub rewritten_body: Option<String>,
    pub status: SmsStatus,
    pub retry_count: i32,
    pub segment_count: i32,
    pub last_dlr: Option<Dlr>,
    pub provider_status: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SmsEvent {
    /// The effective body the pipeline should act on: the rewritten body if
    /// one exists, otherwise the original (spec.md §4.8 reconciliation rule).
    #[must_use]
    pub fn effective_body(&self) -> &str {
        self.rewritten_body.as_deref().unwrap_or(&self.body)
    }
}

/// Computes `segment_count = ceil(len(body) / max_body_chars)`, minimum 1.
#[must_use]
pub fn segment_count_for(body: &str, max_body_chars: usize) -> i32 {
    if max_body_chars == 0 {
        return 1;
    }
    let len = body.chars().count();
    let segments = len.div_ceil(max_body_chars).max(1);
    i32::try_from(segments).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sms_status_round_trips_through_str() {
        for status in [
            SmsStatus::Pending,
            SmsStatus::Sent,
            SmsStatus::Blocked,
            SmsStatus::Failed,
            SmsStatus::InReview,
            SmsStatus::InDlq,
        ] {
            assert_eq!(status.as_str().parse::<SmsStatus>().unwrap(), status);
        }
    }

    #[test]
    fn sms_status_rejects_unknown_string() {
        assert!("WHATEVER".parse::<SmsStatus>().is_err());
    }

    #[test]
    fn only_sent_blocked_and_in_dlq_are_terminal() {
        assert!(SmsStatus::Sent.is_terminal());
        assert!(SmsStatus::Blocked.is_terminal());
        assert!(SmsStatus::InDlq.is_terminal());
        assert!(!SmsStatus::Pending.is_terminal());
        assert!(!SmsStatus::Failed.is_terminal());
        assert!(!SmsStatus::InReview.is_terminal());
    }

    #[test]
    fn dlr_round_trips_through_str() {
        for dlr in [Dlr::Delivered, Dlr::Failed, Dlr::Blocked, Dlr::Timeout] {
            assert_eq!(dlr.as_str().parse::<Dlr>().unwrap(), dlr);
        }
    }

    #[test]
    fn provider_status_code_round_trips() {
        for status in [
            ProviderStatus::Queued,
            ProviderStatus::Scheduled,
            ProviderStatus::SentToCarrier4,
            ProviderStatus::SentToCarrier5,
            ProviderStatus::FailedToSend,
            ProviderStatus::Delivered,
            ProviderStatus::Undelivered,
            ProviderStatus::Cancelled,
            ProviderStatus::BlockedOptOut,
            ProviderStatus::InvalidMessageId,
        ] {
            assert_eq!(ProviderStatus::from_code(status.code()), Some(status));
        }
    }

    #[test]
    fn unqueued_provider_statuses_are_final() {
        assert!(!ProviderStatus::Queued.is_final());
        assert!(!ProviderStatus::Scheduled.is_final());
        assert!(ProviderStatus::Delivered.is_final());
        assert!(ProviderStatus::FailedToSend.is_final());
    }

    #[test]
    fn unknown_provider_status_code_is_none() {
        assert_eq!(ProviderStatus::from_code(999), None);
    }

    fn sample_event(rewritten_body: Option<&str>) -> SmsEvent {
        SmsEvent {
            id: 1,
            provider_message_id: None,
            phone: "+15551234567".to_owned(),
            body: "original".to_owned(),
            rewritten_body: rewritten_body.map(ToOwned::to_owned),
            status: SmsStatus::Pending,
            retry_count: 0,
            segment_count: 1,
            last_dlr: None,
            provider_status: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn effective_body_prefers_rewritten_body() {
        assert_eq!(sample_event(Some("shorter")).effective_body(), "shorter");
        assert_eq!(sample_event(None).effective_body(), "original");
    }

    #[test]
    fn segment_count_for_divides_and_rounds_up() {
        assert_eq!(segment_count_for("a".repeat(320).as_str(), 320), 1);
        assert_eq!(segment_count_for("a".repeat(321).as_str(), 320), 2);
        assert_eq!(segment_count_for("", 320), 1);
    }

    #[test]
    fn segment_count_for_zero_max_chars_returns_one() {
        assert_eq!(segment_count_for("anything", 0), 1);
    }
}
