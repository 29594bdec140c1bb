//! Mock provider sink (C5): hands a message off and simulates the delivery
//! receipt that would otherwise arrive asynchronously from the real carrier.
//!
//! Grounded on `worker/sms_sender_mock.py`'s DLR distribution, supplemented
//! into spec.md's `{provider_message_id, status_code}` contract (spec.md
//! §4.5, §6.4's `MOCK_DLR` key).

use rand::Rng;
use smsguard_core::{Dlr, ProviderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendResult {
    pub status_code: i32,
    pub simulated_dlr: Dlr,
}

/// Parses `MOCK_DLR`, validating against the four allowed outcomes and
/// discarding anything else (matching `sms_sender_mock.py`'s
/// `MOCK_DLR_OVERRIDE` validation: unset or invalid both mean "no override").
#[must_use]
pub fn mock_dlr_override_from_env(var: Option<&str>) -> Option<Dlr> {
    let raw = var?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.to_ascii_uppercase().as_str() {
        "DELIVERED" => Some(Dlr::Delivered),
        "FAILED" => Some(Dlr::Failed),
        "BLOCKED" => Some(Dlr::Blocked),
        "TIMEOUT" => Some(Dlr::Timeout),
        _ => None,
    }
}

/// Draws a simulated DLR outcome: 85% DELIVERED, 10% TIMEOUT, 3% FAILED,
/// 2% BLOCKED, unless `override_dlr` pins the result.
fn simulate_dlr(override_dlr: Option<Dlr>, rng: &mut impl Rng) -> Dlr {
    if let Some(dlr) = override_dlr {
        return dlr;
    }
    let r: f64 = rng.gen_range(0.0..1.0);
    if r < 0.85 {
        Dlr::Delivered
    } else if r < 0.95 {
        Dlr::Timeout
    } else if r < 0.98 {
        Dlr::Failed
    } else {
        Dlr::Blocked
    }
}

/// Hands `phone`/`body` off to the (mock) carrier and returns a freshly
/// minted `provider_message_id` plus an initial status code (typically
/// `1 = queued`), alongside a simulated DLR for the caller to act on.
#[must_use]
pub fn send(phone: &str, body: &str, override_dlr: Option<Dlr>) -> (String, SendResult) {
    let provider_message_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(phone, body_len = body.chars().count(), provider_message_id, "mock sms send");
    let mut rng = rand::thread_rng();
    let simulated_dlr = simulate_dlr(override_dlr, &mut rng);
    (provider_message_id, SendResult { status_code: ProviderStatus::Queued.code(), simulated_dlr })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_pins_delivered() {
        assert_eq!(mock_dlr_override_from_env(Some("delivered")), Some(Dlr::Delivered));
    }

    #[test]
    fn override_rejects_unknown_value() {
        assert_eq!(mock_dlr_override_from_env(Some("BOUNCED")), None);
    }

    #[test]
    fn override_rejects_empty() {
        assert_eq!(mock_dlr_override_from_env(Some("")), None);
        assert_eq!(mock_dlr_override_from_env(None), None);
    }

    #[test]
    fn send_always_returns_nonempty_id_and_queued_status() {
        let (id, result) = send("+15551234567", "hello", Some(Dlr::Delivered));
        assert!(!id.is_empty());
        assert_eq!(result.status_code, 1);
        assert_eq!(result.simulated_dlr, Dlr::Delivered);
    }

    #[test]
    fn send_respects_override_for_every_outcome() {
        for dlr in [Dlr::Delivered, Dlr::Failed, Dlr::Blocked, Dlr::Timeout] {
            let (_, result) = send("+15551234567", "hello", Some(dlr));
            assert_eq!(result.simulated_dlr, dlr);
        }
    }
}
