//! PostgreSQL event store backing `sms_events` and `ai_calls` (spec.md §4.7,
//! §6.2). Grounded on the teacher's `PgStorage::new` pool setup
//! (`PgPoolOptions` + `sqlx::migrate!`) and its per-domain query modules.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use smsguard_core::{
    constants::{PG_POOL_ACQUIRE_TIMEOUT_SECS, PG_POOL_IDLE_TIMEOUT_SECS, PG_POOL_MAX_CONNECTIONS},
    AiCall, Dlr, SmsEvent, SmsStatus,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::error::StorageError;

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects to Postgres, runs embedded migrations, and returns a ready
    /// store. Mirrors the teacher's `PgStorage::new`.
    ///
    /// # Errors
    /// Returns `StorageError::Database` if the connection fails, or
    /// `StorageError::Migration` if a migration fails to apply.
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(PG_POOL_MAX_CONNECTIONS)
            .acquire_timeout(std::time::Duration::from_secs(PG_POOL_ACQUIRE_TIMEOUT_SECS))
            .idle_timeout(std::time::Duration::from_secs(PG_POOL_IDLE_TIMEOUT_SECS))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StorageError::Migration(e.to_string()))?;
        tracing::info!("PgStore initialized");
        Ok(Self { pool })
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts a new `PENDING` event row (intake). Not part of spec.md §4.7's
    /// operation list directly, but required to create the rows that list
    /// operates on; kept here rather than in a separate out-of-scope intake
    /// crate since the schema and the insert are one concern.
    ///
    /// # Errors
    /// Returns `StorageError::Database` on any SQL failure.
    pub async fn insert_pending(&self, phone: &str, body: &str, segment_count: i32) -> Result<SmsEvent, StorageError> {
        let row = sqlx::query(
            "INSERT INTO sms_events (phone, body, status, retry_count, segment_count)
             VALUES ($1, $2, 'PENDING', 0, $3)
             RETURNING id, provider_message_id, phone, body, rewritten_body, status,
                       retry_count, segment_count, last_dlr, provider_status, created_at, updated_at",
        )
        .bind(phone)
        .bind(body)
        .bind(segment_count)
        .fetch_one(&self.pool)
        .await?;
        row_to_sms_event(&row)
    }

    /// # Errors
    /// Returns `StorageError::NotFound` if no row with `id` exists.
    pub async fn get_by_id(&self, id: i64) -> Result<SmsEvent, StorageError> {
        let row = sqlx::query(
            "SELECT id, provider_message_id, phone, body, rewritten_body, status,
                    retry_count, segment_count, last_dlr, provider_status, created_at, updated_at
             FROM sms_events WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::NotFound { entity: "sms_event", id: id.to_string() })?;
        row_to_sms_event(&row)
    }

    /// # Errors
    /// Returns `StorageError::NotFound` if no row with `provider_message_id` exists.
    pub async fn get_by_provider_message_id(&self, provider_message_id: &str) -> Result<SmsEvent, StorageError> {
        let row = sqlx::query(
            "SELECT id, provider_message_id, phone, body, rewritten_body, status,
                    retry_count, segment_count, last_dlr, provider_status, created_at, updated_at
             FROM sms_events WHERE provider_message_id = $1",
        )
        .bind(provider_message_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::NotFound {
            entity: "sms_event",
            id: provider_message_id.to_owned(),
        })?;
        row_to_sms_event(&row)
    }

    /// Updates `status`, and optionally `last_dlr` (COALESCE — `None` keeps
    /// the prior value) and `retry_count` (only set when `Some`).
    ///
    /// # Errors
    /// Returns `StorageError::Database` on any SQL failure.
    pub async fn update_status_by_id(
        &self,
        id: i64,
        status: SmsStatus,
        last_dlr: Option<Dlr>,
        retry_count: Option<i32>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE sms_events
             SET status = $2,
                 last_dlr = COALESCE($3, last_dlr),
                 retry_count = COALESCE($4, retry_count),
                 updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(last_dlr.map(Dlr::as_str))
        .bind(retry_count)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// # Errors
    /// Returns `StorageError::Duplicate` if `provider_message_id` is already
    /// assigned to another row.
    pub async fn assign_provider_message(
        &self,
        id: i64,
        provider_message_id: &str,
        status_code: i32,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "UPDATE sms_events
             SET provider_message_id = $2, provider_status = $3, updated_at = now()
             WHERE id = $1",
        )
        .bind(id)
        .bind(provider_message_id)
        .bind(status_code)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// # Errors
    /// Returns `StorageError::NotFound` if no row has this `provider_message_id`.
    pub async fn update_provider_status_by_message_id(
        &self,
        provider_message_id: &str,
        status_code: i32,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE sms_events SET provider_status = $2, updated_at = now()
             WHERE provider_message_id = $1",
        )
        .bind(provider_message_id)
        .bind(status_code)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound {
                entity: "sms_event",
                id: provider_message_id.to_owned(),
            });
        }
        Ok(())
    }

    /// # Errors
    /// Returns `StorageError::Database` on any SQL failure.
    pub async fn update_rewritten_body_by_id(&self, id: i64, rewritten_body: &str) -> Result<(), StorageError> {
        sqlx::query("UPDATE sms_events SET rewritten_body = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(rewritten_body)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// # Errors
    /// Returns `StorageError::Database` on any SQL failure.
    pub async fn update_segment_count_by_id(&self, id: i64, segment_count: i32) -> Result<(), StorageError> {
        sqlx::query("UPDATE sms_events SET segment_count = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(segment_count)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// # Errors
    /// Returns `StorageError::Database` on any SQL failure.
    pub async fn insert_ai_call(
        &self,
        sms_event_id: Option<i64>,
        model: &str,
        input_tokens: i32,
        output_tokens: i32,
        decision: &str,
        reason: &str,
    ) -> Result<AiCall, StorageError> {
        let row = sqlx::query(
            "INSERT INTO ai_calls (sms_event_id, model, input_tokens, output_tokens, decision, reason)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, sms_event_id, model, input_tokens, output_tokens, decision, reason, created_at",
        )
        .bind(sms_event_id)
        .bind(model)
        .bind(input_tokens)
        .bind(output_tokens)
        .bind(decision)
        .bind(reason)
        .fetch_one(&self.pool)
        .await?;
        Ok(AiCall {
            id: row.try_get("id")?,
            sms_event_id: row.try_get("sms_event_id")?,
            model: row.try_get("model")?,
            input_tokens: row.try_get("input_tokens")?,
            output_tokens: row.try_get("output_tokens")?,
            decision: row.try_get("decision")?,
            reason: row.try_get("reason")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

fn row_to_sms_event(row: &sqlx::postgres::PgRow) -> Result<SmsEvent, StorageError> {
    let status_str: String = row.try_get("status")?;
    let status = SmsStatus::from_str(&status_str).unwrap_or_else(|_| {
        tracing::warn!(invalid_status = %status_str, "corrupt sms_events.status, defaulting to Pending");
        SmsStatus::Pending
    });
    let last_dlr_str: Option<String> = row.try_get("last_dlr")?;
    let last_dlr = last_dlr_str.and_then(|s| Dlr::from_str(&s).ok());
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(SmsEvent {
        id: row.try_get("id")?,
        provider_message_id: row.try_get("provider_message_id")?,
        phone: row.try_get("phone")?,
        body: row.try_get("body")?,
        rewritten_body: row.try_get("rewritten_body")?,
        status,
        retry_count: row.try_get("retry_count")?,
        segment_count: row.try_get("segment_count")?,
        last_dlr,
        provider_status: row.try_get("provider_status")?,
        created_at,
        updated_at,
    })
}
