//! Environment configuration for the pipeline (spec.md §6.4), read once at
//! startup and threaded through `Deps`. Required connection URLs fail fast;
//! every tunable threshold warns and falls back to its documented default
//! via `env_parse_with_default`.

use smsguard_core::constants::{
    DEFAULT_AI_DAILY_CALL_LIMIT, DEFAULT_AI_GUARD_MAX_TOKENS, DEFAULT_DEDUP_KEY_PREFIX,
    DEFAULT_DUPLICATE_WINDOW_SECONDS, DEFAULT_LIMITER_KEY_PREFIX, DEFAULT_MAX_BODY_CHARS,
    DEFAULT_MAX_RETRY_BEFORE_DLQ, DEFAULT_MOCK_TIMEOUT_RETRY_PROB,
    DEFAULT_MULTIPART_SEGMENT_THRESHOLD, DEFAULT_OPENROUTER_TIMEOUT_SECS,
};
use smsguard_core::env_config::{env_optional_nonempty, env_parse_with_default, env_required};
use smsguard_core::Dlr;

/// Default OpenRouter-compatible base URL when `OPENROUTER_BASE_URL` is unset.
const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api";
/// Default model name when `OPENROUTER_MODEL` is unset.
const DEFAULT_OPENROUTER_MODEL: &str = "openrouter/auto";
/// Default IANA zone for the daily AI-call limiter's midnight rollover.
const DEFAULT_LIMITER_TZ: &str = "UTC";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub database_url: String,
    pub rabbitmq_url: String,
    pub rabbitmq_main_queue: String,
    pub rabbitmq_dlq: String,
    pub redis_url: String,

    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub openrouter_model: String,
    pub openrouter_timeout_secs: u64,
    pub ai_daily_call_limit: i64,
    pub ai_guard_max_tokens: u32,
    pub ai_daily_limiter_key_prefix: String,
    pub ai_daily_limiter_tz: String,

    pub max_body_chars: usize,
    pub duplicate_window_seconds: i64,
    pub max_retry_before_dlq: i32,
    pub multipart_segment_threshold: i32,
    pub mock_timeout_retry_prob: f64,
    pub mock_dlr_override: Option<Dlr>,
    pub dedup_key_prefix: String,
}

impl PipelineConfig {
    /// Reads every spec.md §6.4 key from the process environment.
    ///
    /// # Errors
    /// Returns `PipelineError::Config` if any of `DATABASE_URL`,
    /// `RABBITMQ_URL`, `RABBITMQ_MAIN_QUEUE`, `RABBITMQ_DLQ`, `REDIS_URL` is
    /// unset — there is no sensible default for a connection URL.
    pub fn from_env() -> Result<Self, crate::PipelineError> {
        let mock_dlr_env = env_optional_nonempty("MOCK_DLR");
        Ok(Self {
            database_url: env_required("DATABASE_URL").map_err(crate::PipelineError::Config)?,
            rabbitmq_url: env_required("RABBITMQ_URL").map_err(crate::PipelineError::Config)?,
            rabbitmq_main_queue: env_required("RABBITMQ_MAIN_QUEUE").map_err(crate::PipelineError::Config)?,
            rabbitmq_dlq: env_required("RABBITMQ_DLQ").map_err(crate::PipelineError::Config)?,
            redis_url: env_required("REDIS_URL").map_err(crate::PipelineError::Config)?,

            openrouter_api_key: env_optional_nonempty("OPENROUTER_API_KEY"),
            openrouter_base_url: std::env::var("OPENROUTER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENROUTER_BASE_URL.to_owned()),
            openrouter_model: std::env::var("OPENROUTER_MODEL")
                .unwrap_or_else(|_| DEFAULT_OPENROUTER_MODEL.to_owned()),
            openrouter_timeout_secs: env_parse_with_default(
                "OPENROUTER_TIMEOUT",
                DEFAULT_OPENROUTER_TIMEOUT_SECS,
            ),
            ai_daily_call_limit: env_parse_with_default("AI_DAILY_CALL_LIMIT", DEFAULT_AI_DAILY_CALL_LIMIT),
            ai_guard_max_tokens: env_parse_with_default("AI_GUARD_MAX_TOKENS", DEFAULT_AI_GUARD_MAX_TOKENS),
            ai_daily_limiter_key_prefix: std::env::var("AI_DAILY_LIMITER_KEY_PREFIX")
                .unwrap_or_else(|_| DEFAULT_LIMITER_KEY_PREFIX.to_owned()),
            ai_daily_limiter_tz: std::env::var("AI_DAILY_LIMITER_TZ")
                .unwrap_or_else(|_| DEFAULT_LIMITER_TZ.to_owned()),

            max_body_chars: env_parse_with_default("MAX_BODY_CHARS", DEFAULT_MAX_BODY_CHARS),
            duplicate_window_seconds: env_parse_with_default(
                "DUPLICATE_WINDOW_SECONDS",
                DEFAULT_DUPLICATE_WINDOW_SECONDS,
            ),
            max_retry_before_dlq: env_parse_with_default("MAX_RETRY_BEFORE_DLQ", DEFAULT_MAX_RETRY_BEFORE_DLQ),
            multipart_segment_threshold: env_parse_with_default(
                "MULTIPART_SEGMENT_THRESHOLD",
                DEFAULT_MULTIPART_SEGMENT_THRESHOLD,
            ),
            mock_timeout_retry_prob: env_parse_with_default(
                "MOCK_TIMEOUT_RETRY_PROB",
                DEFAULT_MOCK_TIMEOUT_RETRY_PROB,
            ),
            mock_dlr_override: smsguard_provider::mock_dlr_override_from_env(mock_dlr_env.as_deref()),
            dedup_key_prefix: std::env::var("DEDUP_KEY_PREFIX").unwrap_or_else(|_| DEFAULT_DEDUP_KEY_PREFIX.to_owned()),
        })
    }
}
