//! Rule engine (C4): a pure classification function over message metadata.
//!
//! Grounded on `worker/rule_engine.py::classify`, with one deliberate
//! deviation: the original folds duplicate detection into `REVIEW` so the
//! advisor gets a final say; this pipeline's rule table classifies a
//! duplicate as `DROP` directly (spec.md §4.4, clause 6), since the dedup
//! store's verdict is itself already authoritative here — there's nothing
//! for the advisor to add. The function takes C1's duplicate flags as plain
//! booleans rather than querying Redis itself, keeping it pure and testable
//! without a live store.

use smsguard_core::Dlr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Send,
    Review,
    Poison,
    Drop,
}

/// Parameters a classification decision is evaluated against. Grouped into
/// one struct so call sites don't have to track seven positional arguments.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyInput<'a> {
    pub body: &'a str,
    pub retry_count: i32,
    pub last_dlr: Option<Dlr>,
    pub segment_count: i32,
    pub dup_by_id: bool,
    pub dup_by_content: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ClassifyThresholds {
    pub max_retry_before_dlq: i32,
    pub multipart_segment_threshold: i32,
    pub max_body_chars: usize,
}

/// Evaluates spec.md §4.4's ordered rule table; the first matching clause
/// wins.
#[must_use]
pub fn classify(input: ClassifyInput<'_>, thresholds: ClassifyThresholds) -> Classification {
    if input.retry_count >= thresholds.max_retry_before_dlq {
        tracing::info!(
            retry_count = input.retry_count,
            max = thresholds.max_retry_before_dlq,
            "rule: POISON (retry budget exhausted)"
        );
        return Classification::Poison;
    }

    if matches!(input.last_dlr, Some(Dlr::Failed | Dlr::Blocked)) && input.retry_count >= 1 {
        tracing::info!(?input.last_dlr, retry_count = input.retry_count, "rule: POISON (permanent dlr on retry)");
        return Classification::Poison;
    }

    if matches!(input.last_dlr, Some(Dlr::Timeout)) && input.retry_count >= 1 {
        tracing::info!(retry_count = input.retry_count, "rule: REVIEW (timeout retry)");
        return Classification::Review;
    }

    if input.segment_count > thresholds.multipart_segment_threshold {
        tracing::info!(segments = input.segment_count, "rule: REVIEW (multipart)");
        return Classification::Review;
    }

    if input.body.chars().count() > thresholds.max_body_chars && input.segment_count >= 2 {
        tracing::info!(len = input.body.chars().count(), "rule: REVIEW (long body + segments)");
        return Classification::Review;
    }

    if input.dup_by_id || input.dup_by_content {
        tracing::info!(dup_by_id = input.dup_by_id, dup_by_content = input.dup_by_content, "rule: DROP (duplicate)");
        return Classification::Drop;
    }

    Classification::Send
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_THRESHOLDS: ClassifyThresholds =
        ClassifyThresholds { max_retry_before_dlq: 3, multipart_segment_threshold: 2, max_body_chars: 320 };

    fn base_input() -> ClassifyInput<'static> {
        ClassifyInput {
            body: "hello",
            retry_count: 0,
            last_dlr: None,
            segment_count: 1,
            dup_by_id: false,
            dup_by_content: false,
        }
    }

    #[test]
    fn clean_message_sends() {
        assert_eq!(classify(base_input(), DEFAULT_THRESHOLDS), Classification::Send);
    }

    #[test]
    fn retry_at_max_poisons() {
        let input = ClassifyInput { retry_count: 3, ..base_input() };
        assert_eq!(classify(input, DEFAULT_THRESHOLDS), Classification::Poison);
    }

    #[test]
    fn permanent_dlr_failure_on_retry_poisons() {
        let input = ClassifyInput { retry_count: 1, last_dlr: Some(Dlr::Failed), ..base_input() };
        assert_eq!(classify(input, DEFAULT_THRESHOLDS), Classification::Poison);
    }

    #[test]
    fn permanent_dlr_blocked_on_retry_poisons() {
        let input = ClassifyInput { retry_count: 1, last_dlr: Some(Dlr::Blocked), ..base_input() };
        assert_eq!(classify(input, DEFAULT_THRESHOLDS), Classification::Poison);
    }

    #[test]
    fn permanent_dlr_failure_without_retry_does_not_poison() {
        let input = ClassifyInput { retry_count: 0, last_dlr: Some(Dlr::Failed), ..base_input() };
        assert_ne!(classify(input, DEFAULT_THRESHOLDS), Classification::Poison);
    }

    #[test]
    fn timeout_retry_reviews() {
        let input = ClassifyInput { retry_count: 1, last_dlr: Some(Dlr::Timeout), ..base_input() };
        assert_eq!(classify(input, DEFAULT_THRESHOLDS), Classification::Review);
    }

    #[test]
    fn poison_takes_priority_over_timeout_review() {
        // retry_count >= max wins even though last_dlr is TIMEOUT.
        let input = ClassifyInput { retry_count: 3, last_dlr: Some(Dlr::Timeout), ..base_input() };
        assert_eq!(classify(input, DEFAULT_THRESHOLDS), Classification::Poison);
    }

    #[test]
    fn excess_segments_reviews() {
        let input = ClassifyInput { segment_count: 3, ..base_input() };
        assert_eq!(classify(input, DEFAULT_THRESHOLDS), Classification::Review);
    }

    #[test]
    fn long_body_with_multiple_segments_reviews() {
        let body = "a".repeat(321);
        let input = ClassifyInput { body: &body, segment_count: 2, ..base_input() };
        assert_eq!(classify(input, DEFAULT_THRESHOLDS), Classification::Review);
    }

    #[test]
    fn long_body_single_segment_does_not_review() {
        let body = "a".repeat(321);
        let input = ClassifyInput { body: &body, segment_count: 1, ..base_input() };
        assert_eq!(classify(input, DEFAULT_THRESHOLDS), Classification::Send);
    }

    #[test]
    fn duplicate_by_id_drops() {
        let input = ClassifyInput { dup_by_id: true, ..base_input() };
        assert_eq!(classify(input, DEFAULT_THRESHOLDS), Classification::Drop);
    }

    #[test]
    fn duplicate_by_content_drops() {
        let input = ClassifyInput { dup_by_content: true, ..base_input() };
        assert_eq!(classify(input, DEFAULT_THRESHOLDS), Classification::Drop);
    }

    #[test]
    fn review_clauses_take_priority_over_duplicate_drop() {
        let input = ClassifyInput { segment_count: 3, dup_by_id: true, ..base_input() };
        assert_eq!(classify(input, DEFAULT_THRESHOLDS), Classification::Review);
    }
}
