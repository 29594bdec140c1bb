//! Daily AI-call limiter (C2), grounded on `worker/rate_limiter.py`.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::Script;
use smsguard_core::constants::REDIS_SOCKET_TIMEOUT_SECS;

use crate::error::DedupError;

/// Atomic `INCR`-then-check-limit script. Transcribed from
/// `worker/rate_limiter.py::_LUA_CONSUME_DAILY`. Returns `{allowed, used}`.
const CONSUME_DAILY_SCRIPT: &str = r"
local key = KEYS[1]
local limit = tonumber(ARGV[1])
local ttl_seconds = tonumber(ARGV[2])

local current = redis.call('INCR', key)
if current == 1 then
  redis.call('EXPIRE', key, ttl_seconds)
end

if current > limit then
  redis.call('DECR', key)
  return {0, current - 1}
end

return {1, current}
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyLimitResult {
    pub allowed: bool,
    pub used_today: i64,
    pub remaining_today: i64,
    pub day_key: String,
}

#[derive(Clone)]
pub struct DailyLimiter {
    conn: ConnectionManager,
}

impl DailyLimiter {
    /// # Errors
    /// Returns `DedupError::Connection` if the initial connection fails.
    pub async fn connect(redis_url: &str) -> Result<Self, DedupError> {
        let client = redis::Client::open(redis_url)?;
        let timeout = Duration::from_secs(REDIS_SOCKET_TIMEOUT_SECS);
        let config = ConnectionManagerConfig::new().set_response_timeout(timeout).set_connection_timeout(timeout);
        let conn = ConnectionManager::new_with_config(client, config).await?;
        Ok(Self { conn })
    }

    /// Attempts to consume one unit of today's AI-call budget.
    ///
    /// `limit <= 0` denies immediately. An invalid `tz_name` falls back to
    /// UTC with a warning. Any Redis fault denies with `used=0` — fail
    /// closed, to prevent runaway spend (spec.md §4.2).
    pub async fn try_consume(&self, key_prefix: &str, limit: i64, tz_name: &str) -> DailyLimitResult {
        let tz: Tz = tz_name.parse().unwrap_or_else(|_| {
            tracing::warn!(tz_name, "invalid timezone, falling back to UTC");
            chrono_tz::UTC
        });

        if limit <= 0 {
            return DailyLimitResult {
                allowed: false,
                used_today: 0,
                remaining_today: 0,
                day_key: today_key(key_prefix, tz),
            };
        }

        let day_key = today_key(key_prefix, tz);
        let ttl_seconds = seconds_until_next_midnight(tz);

        let mut conn = self.conn.clone();
        let script = Script::new(CONSUME_DAILY_SCRIPT);
        let result: Result<(i64, i64), redis::RedisError> =
            script.key(&day_key).arg(limit).arg(ttl_seconds).invoke_async(&mut conn).await;

        match result {
            Ok((allowed, used)) => {
                let used_today = used.max(0);
                DailyLimitResult {
                    allowed: allowed != 0,
                    used_today,
                    remaining_today: (limit - used_today).max(0),
                    day_key,
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "redis daily limit check failed, failing closed");
                DailyLimitResult { allowed: false, used_today: 0, remaining_today: 0, day_key }
            },
        }
    }
}

fn today_key(prefix: &str, tz: Tz) -> String {
    let today = Utc::now().with_timezone(&tz).date_naive();
    format!("{prefix}:{today}")
}

fn seconds_until_next_midnight(tz: Tz) -> i64 {
    let now = Utc::now().with_timezone(&tz);
    let tomorrow = now.date_naive().succ_opt().unwrap_or(now.date_naive());
    let next_midnight = tz
        .from_local_datetime(&tomorrow.and_hms_opt(0, 0, 0).unwrap_or_default())
        .single()
        .unwrap_or(now);
    (next_midnight - now).num_seconds().max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn today_key_uses_prefix_and_iso_date() {
        let key = today_key("ai:daily", chrono_tz::UTC);
        assert!(key.starts_with("ai:daily:"));
        assert_eq!(key.len(), "ai:daily:".len() + "2026-07-31".len());
    }

    #[test]
    fn seconds_until_midnight_is_positive_and_bounded() {
        let secs = seconds_until_next_midnight(chrono_tz::UTC);
        assert!(secs >= 1);
        assert!(secs <= 86400);
    }
}
