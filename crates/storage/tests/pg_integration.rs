//! Integration tests against a live Postgres instance.
//!
//! Ignored by default — run with `DATABASE_URL=... cargo test -- --ignored`
//! against a throwaway database, mirroring the teacher's `pg_integration.rs`.

use smsguard_core::{Dlr, SmsStatus};
use smsguard_storage::PgStore;

async fn store() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for this test");
    PgStore::new(&url).await.expect("connect and migrate")
}

#[tokio::test]
#[ignore = "requires a live Postgres instance"]
async fn insert_and_fetch_roundtrip() {
    let store = store().await;
    let event = store.insert_pending("+15551234567", "hello world", 1).await.unwrap();
    assert_eq!(event.status, SmsStatus::Pending);
    assert_eq!(event.retry_count, 0);

    let fetched = store.get_by_id(event.id).await.unwrap();
    assert_eq!(fetched.phone, "+15551234567");
}

#[tokio::test]
#[ignore = "requires a live Postgres instance"]
async fn status_update_coalesces_last_dlr_and_retry_count() {
    let store = store().await;
    let event = store.insert_pending("+15551234567", "hello", 1).await.unwrap();

    store.update_status_by_id(event.id, SmsStatus::Failed, Some(Dlr::Timeout), Some(1)).await.unwrap();
    let after = store.get_by_id(event.id).await.unwrap();
    assert_eq!(after.status, SmsStatus::Failed);
    assert_eq!(after.last_dlr, Some(Dlr::Timeout));
    assert_eq!(after.retry_count, 1);

    // Passing None for last_dlr keeps the prior value (COALESCE pass-through).
    store.update_status_by_id(event.id, SmsStatus::Sent, None, None).await.unwrap();
    let sent = store.get_by_id(event.id).await.unwrap();
    assert_eq!(sent.status, SmsStatus::Sent);
    assert_eq!(sent.last_dlr, Some(Dlr::Timeout));
    assert_eq!(sent.retry_count, 1);
}

#[tokio::test]
#[ignore = "requires a live Postgres instance"]
async fn assign_provider_message_is_fetchable_by_provider_id() {
    let store = store().await;
    let event = store.insert_pending("+15551234567", "hello", 1).await.unwrap();
    store.assign_provider_message(event.id, "prov-abc-123", 1).await.unwrap();

    let fetched = store.get_by_provider_message_id("prov-abc-123").await.unwrap();
    assert_eq!(fetched.id, event.id);
    assert_eq!(fetched.provider_status, Some(1));
}

#[tokio::test]
#[ignore = "requires a live Postgres instance"]
async fn insert_ai_call_links_to_sms_event() {
    let store = store().await;
    let event = store.insert_pending("+15551234567", "hello", 1).await.unwrap();
    let call = store
        .insert_ai_call(Some(event.id), "openrouter/some-model", 42, 8, "SEND", "looks fine")
        .await
        .unwrap();
    assert_eq!(call.sms_event_id, Some(event.id));
    assert_eq!(call.decision, "SEND");
}

#[tokio::test]
#[ignore = "requires a live Postgres instance"]
async fn ai_call_survives_sms_event_deletion_via_set_null() {
    let store = store().await;
    let event = store.insert_pending("+15551234567", "hello", 1).await.unwrap();
    let call = store.insert_ai_call(Some(event.id), "m", 1, 1, "SEND", "r").await.unwrap();

    sqlx::query("DELETE FROM sms_events WHERE id = $1")
        .bind(event.id)
        .execute(store.pool())
        .await
        .unwrap();

    let row: (Option<i64>,) =
        sqlx::query_as("SELECT sms_event_id FROM ai_calls WHERE id = $1")
            .bind(call.id)
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(row.0, None);
}
