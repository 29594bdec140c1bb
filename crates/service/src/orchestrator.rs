//! Pipeline Orchestrator (C8): the per-message state machine tying C1–C7
//! together, grounded on `worker/process.py::_process_main_message` /
//! `_process_dlq_message` (spec.md §4.8).

use smsguard_advisor::{advise, AdviseConfig, AdviseInput};
use smsguard_core::{Dlr, QueuePayload, SmsEvent, SmsStatus};
use smsguard_rules::{classify, ClassifyInput, ClassifyThresholds, Classification};
use smsguard_storage::StorageError;

use crate::deps::Deps;
use crate::error::PipelineError;

/// Terminal or in-flight result of processing one queue delivery, surfaced
/// for logging and for the integration tests in `tests/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Sent,
    Blocked,
    InDlq,
    /// A new payload for the same `sms_event_id` was published back to
    /// MAIN (a simulated-timeout retry or a REWRITE-and-requeue); the event
    /// row is PENDING again.
    Requeued,
    /// The provider returned no id; the row stays PENDING with an
    /// incremented `retry_count` and no requeue (spec.md §9 Open Question a:
    /// left to an external reaper or the next upstream enqueue).
    Pending,
}

/// The dedup-store identifier used for a message before it has a
/// provider-assigned id: `event:<sms_event_id>`. Stable across a
/// REWRITE-and-requeue of the same logical message (spec.md §9 Open
/// Question c) since the `sms_event_id` never changes.
#[must_use]
fn dedup_message_id(sms_event_id: i64) -> String {
    format!("event:{sms_event_id}")
}

/// Parses a raw queue delivery body as a `QueuePayload` and runs it through
/// the main-consumer pipeline.
///
/// # Errors
/// Returns `PipelineError::BadPayload` for malformed JSON.
pub async fn process_main_delivery(deps: &Deps, raw_body: &[u8]) -> Result<ProcessOutcome, PipelineError> {
    let payload: QueuePayload =
        serde_json::from_slice(raw_body).map_err(|err| PipelineError::BadPayload(format!("invalid JSON: {err}")))?;
    process_main_payload(deps, payload).await
}

/// Parses a raw queue delivery body as a `QueuePayload` and runs it through
/// the DLQ-consumer pipeline.
///
/// # Errors
/// Returns `PipelineError::BadPayload` for malformed JSON.
pub async fn process_dlq_delivery(deps: &Deps, raw_body: &[u8]) -> Result<ProcessOutcome, PipelineError> {
    let payload: QueuePayload =
        serde_json::from_slice(raw_body).map_err(|err| PipelineError::BadPayload(format!("invalid JSON: {err}")))?;
    process_dlq_payload(deps, payload).await
}

async fn load_event(deps: &Deps, sms_event_id: i64) -> Result<SmsEvent, PipelineError> {
    deps.store.get_by_id(sms_event_id).await.map_err(|err| match err {
        StorageError::NotFound { .. } => {
            PipelineError::BadPayload(format!("no sms_event row for id {sms_event_id}"))
        },
        other => PipelineError::Storage(other),
    })
}

/// Runs the main-consumer branch of spec.md §4.8's state machine: load →
/// classify → act.
///
/// # Errors
/// Returns `PipelineError::BadPayload` if `sms_event_id` has no matching
/// row, or `PipelineError::Storage`/`Queue` if a collaborator write fails.
pub async fn process_main_payload(deps: &Deps, payload: QueuePayload) -> Result<ProcessOutcome, PipelineError> {
    let event = load_event(deps, payload.sms_event_id).await?;

    // Reconciliation rule (spec.md §4.8): the row is authoritative, the
    // payload only carries the retry/rewrite delta across hops.
    let phone = payload.phone.clone().unwrap_or_else(|| event.phone.clone());
    let body = payload.body.clone().unwrap_or_else(|| event.effective_body().to_owned());
    let retry_count = payload.retry_count.unwrap_or(event.retry_count);
    let segment_count = payload.segment_count.unwrap_or(event.segment_count);
    let last_dlr = payload.last_dlr.or(event.last_dlr);
    let message_id = dedup_message_id(event.id);

    let dup = deps.dedup.check(&message_id, &phone, &body, deps.config.duplicate_window_seconds).await;

    let classification = classify(
        ClassifyInput {
            body: &body,
            retry_count,
            last_dlr,
            segment_count,
            dup_by_id: dup.dup_by_id,
            dup_by_content: dup.dup_by_content,
        },
        ClassifyThresholds {
            max_retry_before_dlq: deps.config.max_retry_before_dlq,
            multipart_segment_threshold: deps.config.multipart_segment_threshold,
            max_body_chars: deps.config.max_body_chars,
        },
    );

    tracing::info!(sms_event_id = event.id, retry_count, ?classification, "main consumer classified message");

    match classification {
        Classification::Send => handle_send(deps, &event, &phone, &body, retry_count, segment_count).await,
        Classification::Drop => {
            deps.store.update_status_by_id(event.id, SmsStatus::Blocked, None, Some(retry_count)).await?;
            deps.dedup.mark(&message_id, deps.config.duplicate_window_seconds).await;
            Ok(ProcessOutcome::Blocked)
        },
        Classification::Review => {
            handle_review(deps, &event, &message_id, &phone, &body, retry_count, segment_count, last_dlr).await
        },
        Classification::Poison => {
            let dlq_payload = QueuePayload::new(event.id)
                .with_body(event.body.clone())
                .with_retry_count(retry_count)
                .with_segment_count(event.segment_count);
            deps.queue.publish(deps.queue.dlq_queue(), &dlq_payload).await?;
            deps.store.update_status_by_id(event.id, SmsStatus::InDlq, None, Some(retry_count)).await?;
            deps.dedup.mark(&message_id, deps.config.duplicate_window_seconds).await;
            tracing::info!(sms_event_id = event.id, "published to DLQ");
            Ok(ProcessOutcome::InDlq)
        },
    }
}

async fn handle_send(
    deps: &Deps,
    event: &SmsEvent,
    phone: &str,
    body: &str,
    retry_count: i32,
    segment_count: i32,
) -> Result<ProcessOutcome, PipelineError> {
    let (provider_message_id, send_result) = smsguard_provider::send(phone, body, deps.config.mock_dlr_override);

    if provider_message_id.is_empty() {
        // spec.md §9 Open Question (a): no requeue is issued here; an
        // external reaper or the next upstream enqueue is expected to
        // reintroduce this event.
        tracing::warn!(sms_event_id = event.id, "provider returned no message id, staying pending");
        deps.store.update_status_by_id(event.id, SmsStatus::Pending, None, Some(retry_count + 1)).await?;
        return Ok(ProcessOutcome::Pending);
    }

    deps.store.assign_provider_message(event.id, &provider_message_id, send_result.status_code).await?;

    // The timeout roll runs before the terminal SENT write: status
    // transitions are monotonic within a run, so PENDING is only ever
    // reached from PENDING, never walked back from SENT.
    let timeout_roll: f64 = rand::random();
    if retry_count < deps.config.max_retry_before_dlq && timeout_roll < deps.config.mock_timeout_retry_prob {
        let next_retry = retry_count + 1;
        deps.store.update_status_by_id(event.id, SmsStatus::Pending, Some(Dlr::Timeout), Some(next_retry)).await?;
        let requeue = QueuePayload::new(event.id)
            .with_body(body.to_owned())
            .with_retry_count(next_retry)
            .with_segment_count(segment_count)
            .with_last_dlr(Dlr::Timeout);
        deps.queue.publish(deps.queue.main_queue(), &requeue).await?;
        tracing::info!(sms_event_id = event.id, retry_count = next_retry, "simulated timeout DLR, requeued");
        return Ok(ProcessOutcome::Requeued);
    }

    // Records the provider's own simulated DLR alongside the SENT status.
    deps.store
        .update_status_by_id(event.id, SmsStatus::Sent, Some(send_result.simulated_dlr), Some(retry_count))
        .await?;
    deps.dedup.mark(&provider_message_id, deps.config.duplicate_window_seconds).await;
    tracing::info!(sms_event_id = event.id, provider_message_id, simulated_dlr = ?send_result.simulated_dlr, "sent");

    Ok(ProcessOutcome::Sent)
}

#[allow(clippy::too_many_arguments)]
async fn handle_review(
    deps: &Deps,
    event: &SmsEvent,
    message_id: &str,
    phone: &str,
    body: &str,
    retry_count: i32,
    segment_count: i32,
    last_dlr: Option<Dlr>,
) -> Result<ProcessOutcome, PipelineError> {
    let advise_config = AdviseConfig {
        model: deps.config.openrouter_model.clone(),
        max_tokens: deps.config.ai_guard_max_tokens,
        max_body_chars: deps.config.max_body_chars,
        daily_limit: deps.config.ai_daily_call_limit,
        daily_limit_key_prefix: deps.config.ai_daily_limiter_key_prefix.clone(),
        daily_limit_tz: deps.config.ai_daily_limiter_tz.clone(),
    };

    let (decision, input_tokens, output_tokens) = advise(
        deps.advisor_client.as_ref(),
        deps.config.openrouter_api_key.as_deref(),
        &deps.limiter,
        &advise_config,
        AdviseInput { message_id, phone, body, retry_count, last_dlr, segment_count },
    )
    .await;

    // Invariant 3: every C3 invocation inserts exactly one AiCall row,
    // regardless of decision or parse failure.
    deps.store
        .insert_ai_call(Some(event.id), &deps.config.openrouter_model, input_tokens, output_tokens, &decision.decision, &decision.reason)
        .await?;

    if decision.rate_limited {
        deps.store.update_status_by_id(event.id, SmsStatus::Blocked, None, Some(retry_count)).await?;
        deps.dedup.mark(message_id, deps.config.duplicate_window_seconds).await;
        tracing::info!(sms_event_id = event.id, "blocked: AI daily limit reached");
        return Ok(ProcessOutcome::Blocked);
    }

    if decision.is_rewrite() {
        if let Some(rewritten) = decision.body.filter(|b| !b.is_empty()) {
            deps.store.update_rewritten_body_by_id(event.id, &rewritten).await?;
            deps.store.update_segment_count_by_id(event.id, 1).await?;
            deps.store.update_status_by_id(event.id, SmsStatus::Pending, None, Some(retry_count)).await?;
            let requeue =
                QueuePayload::new(event.id).with_body(rewritten).with_retry_count(retry_count).with_segment_count(1);
            deps.queue.publish(deps.queue.main_queue(), &requeue).await?;
            tracing::info!(sms_event_id = event.id, "rewritten and requeued");
            return Ok(ProcessOutcome::Requeued);
        }
        tracing::warn!(sms_event_id = event.id, "REWRITE decision had an empty body, blocking");
    }

    deps.store.update_status_by_id(event.id, SmsStatus::Blocked, None, Some(retry_count)).await?;
    deps.dedup.mark(message_id, deps.config.duplicate_window_seconds).await;
    tracing::info!(sms_event_id = event.id, reason = %decision.reason, "blocked by advisor");
    Ok(ProcessOutcome::Blocked)
}

/// Runs the DLQ-consumer branch of spec.md §4.8: unconditional quarantine,
/// no advisor call (spec.md §9 Open Question b: the latest behavior is
/// taken as the spec).
///
/// # Errors
/// Returns `PipelineError::BadPayload` if `sms_event_id` has no matching
/// row, or `PipelineError::Storage` if the status update fails.
pub async fn process_dlq_payload(deps: &Deps, payload: QueuePayload) -> Result<ProcessOutcome, PipelineError> {
    let event = load_event(deps, payload.sms_event_id).await?;
    let message_id = dedup_message_id(event.id);

    deps.store.update_status_by_id(event.id, SmsStatus::Blocked, None, None).await?;
    deps.dedup.mark(&message_id, deps.config.duplicate_window_seconds).await;
    tracing::info!(sms_event_id = event.id, "dlq consumer quarantined message");
    Ok(ProcessOutcome::Blocked)
}
