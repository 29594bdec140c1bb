//! Phone+body dedup store (C1), grounded on `worker/dedup.py`.

use std::time::Duration;

use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Script};
use smsguard_core::constants::REDIS_SOCKET_TIMEOUT_SECS;
use smsguard_core::phone_body_fingerprint;

use crate::error::DedupError;

/// Atomically checks-and-marks the phone+body window key. Returns 0 if the
/// key was absent (now set) or already set to this same `message_id`
/// (refreshed); returns 1 for any other existing value (true duplicate).
/// Transcribed from `worker/dedup.py::_LUA_PHONE_BODY_WINDOW`.
const PHONE_BODY_WINDOW_SCRIPT: &str = r"
local pb_key = KEYS[1]
local ttl_seconds = tonumber(ARGV[1])
local message_id = ARGV[2]

local existing = redis.call('GET', pb_key)

if existing == false then
  redis.call('SET', pb_key, message_id, 'EX', ttl_seconds)
  return 0
end

if existing == message_id then
  redis.call('EXPIRE', pb_key, ttl_seconds)
  return 0
end

redis.call('EXPIRE', pb_key, ttl_seconds)
return 1
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DuplicateFlags {
    pub dup_by_id: bool,
    pub dup_by_content: bool,
}

#[derive(Clone)]
pub struct DedupStore {
    conn: ConnectionManager,
    key_prefix: String,
}

impl DedupStore {
    /// # Errors
    /// Returns `DedupError::Connection` if the initial connection fails.
    pub async fn connect(redis_url: &str, key_prefix: impl Into<String>) -> Result<Self, DedupError> {
        let client = redis::Client::open(redis_url)?;
        let timeout = Duration::from_secs(REDIS_SOCKET_TIMEOUT_SECS);
        let config = ConnectionManagerConfig::new().set_response_timeout(timeout).set_connection_timeout(timeout);
        let conn = ConnectionManager::new_with_config(client, config).await?;
        Ok(Self { conn, key_prefix: key_prefix.into() })
    }

    /// Checks `message_id` against the id-window and the phone+body
    /// fingerprint window. Any Redis fault fails open: `(false, false)`,
    /// logged at warn level (spec.md §4.1's "fail-open to avoid blocking
    /// legitimate traffic").
    pub async fn check(&self, message_id: &str, phone: &str, body: &str, window_seconds: i64) -> DuplicateFlags {
        if window_seconds <= 0 {
            return DuplicateFlags::default();
        }

        let mut conn = self.conn.clone();
        let mid_key = format!("{}:mid:{message_id}", self.key_prefix);
        let pb_key = format!("{}:pb:{}", self.key_prefix, phone_body_fingerprint(phone, body));

        let dup_by_id_result: Result<bool, redis::RedisError> = conn.exists(&mid_key).await;
        let dup_by_id = match dup_by_id_result {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!(message_id, error = %err, "redis dedup id check failed, failing open");
                return DuplicateFlags::default();
            },
        };

        let script = Script::new(PHONE_BODY_WINDOW_SCRIPT);
        let dup_by_content_result: Result<i64, redis::RedisError> = script
            .key(&pb_key)
            .arg(window_seconds)
            .arg(message_id)
            .invoke_async(&mut conn)
            .await;
        let dup_by_content = match dup_by_content_result {
            Ok(v) => v != 0,
            Err(err) => {
                tracing::warn!(message_id, error = %err, "redis dedup content check failed, failing open");
                return DuplicateFlags::default();
            },
        };

        DuplicateFlags { dup_by_id, dup_by_content }
    }

    /// Marks `message_id` as seen for `ttl_seconds`. Best-effort: a failure
    /// is logged, never surfaced.
    pub async fn mark(&self, message_id: &str, ttl_seconds: i64) {
        if ttl_seconds <= 0 {
            return;
        }
        let mut conn = self.conn.clone();
        let mid_key = format!("{}:mid:{message_id}", self.key_prefix);
        let result: Result<(), redis::RedisError> = conn.set_ex(&mid_key, "1", ttl_seconds.unsigned_abs()).await;
        if let Err(err) = result {
            tracing::warn!(message_id, error = %err, "redis dedup mark failed");
        }
    }
}
