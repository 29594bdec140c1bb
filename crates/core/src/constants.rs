//! Shared constants for the SMS cost-guard pipeline.
//!
//! Centralizes default values that mirror `spec.md` §6.4 so every crate reads
//! the same defaults instead of duplicating magic numbers.

/// Default `MAX_BODY_CHARS`: single-segment GSM-7 SMS body length.
pub const DEFAULT_MAX_BODY_CHARS: usize = 320;

/// Default `DUPLICATE_WINDOW_SECONDS`: sliding dedup window.
pub const DEFAULT_DUPLICATE_WINDOW_SECONDS: i64 = 300;

/// Default `MAX_RETRY_BEFORE_DLQ`.
pub const DEFAULT_MAX_RETRY_BEFORE_DLQ: i32 = 3;

/// Default `MULTIPART_SEGMENT_THRESHOLD`.
pub const DEFAULT_MULTIPART_SEGMENT_THRESHOLD: i32 = 2;

/// Default `MOCK_TIMEOUT_RETRY_PROB`.
pub const DEFAULT_MOCK_TIMEOUT_RETRY_PROB: f64 = 0.03;

/// Default `AI_DAILY_CALL_LIMIT`.
pub const DEFAULT_AI_DAILY_CALL_LIMIT: i64 = 50;

/// Default `AI_GUARD_MAX_TOKENS`.
pub const DEFAULT_AI_GUARD_MAX_TOKENS: u32 = 160;

/// Default `OPENROUTER_TIMEOUT` in seconds.
pub const DEFAULT_OPENROUTER_TIMEOUT_SECS: u64 = 15;

/// Default dedup-store key prefix (`dedup:sms`).
pub const DEFAULT_DEDUP_KEY_PREFIX: &str = "dedup:sms";

/// Default daily-limiter key prefix (`ai:daily`).
pub const DEFAULT_LIMITER_KEY_PREFIX: &str = "ai:daily";

/// PostgreSQL connection pool: maximum connections.
pub const PG_POOL_MAX_CONNECTIONS: u32 = 20;

/// PostgreSQL connection pool: acquire timeout in seconds.
pub const PG_POOL_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL connection pool: idle timeout in seconds.
pub const PG_POOL_IDLE_TIMEOUT_SECS: u64 = 300;

/// Redis socket/connect timeout for dedup and limiter operations (spec §5).
pub const REDIS_SOCKET_TIMEOUT_SECS: u64 = 1;

/// Per-consumer QoS prefetch count (spec §4.6: strict one-in-flight ordering).
pub const QUEUE_PREFETCH_COUNT: u16 = 1;
