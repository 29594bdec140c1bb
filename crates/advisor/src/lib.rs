//! AI advisor (C3): a cost-review call to an OpenRouter-compatible chat
//! endpoint, gated by the daily call limiter (C2) and defensive against
//! every way an LLM reply can go wrong (spec.md §4.3).

mod client;
mod error;
mod parsing;
mod types;

pub use client::{AdvisorClient, ChatCompletion};
pub use error::AdvisorError;
pub use types::AdvisorDecision;

use smsguard_core::Dlr;
use smsguard_dedup::DailyLimiter;
use types::{ChatRequest, Message, ResponseFormat};

const SYSTEM_PROMPT: &str = "You are an SMS cost guard. Reply only with a single JSON object, no other text.\n\
Output format: {\"decision\": \"DROP\"|\"RETRY\"|\"REWRITE\", \"reason\": \"short reason\"}\n\
- DROP: do not send, avoid cost (duplicate, low value, permanent failure).\n\
- RETRY: send again (e.g. temporary timeout).\n\
- REWRITE: suggest shortening or splitting (e.g. multipart cost).";

/// Parameters needed to evaluate one `advise()` call, grouped to avoid a
/// long positional argument list at the call site.
#[derive(Debug, Clone, Copy)]
pub struct AdviseInput<'a> {
    pub message_id: &'a str,
    pub phone: &'a str,
    pub body: &'a str,
    pub retry_count: i32,
    pub last_dlr: Option<Dlr>,
    pub segment_count: i32,
}

#[derive(Debug, Clone)]
pub struct AdviseConfig {
    pub model: String,
    pub max_tokens: u32,
    pub max_body_chars: usize,
    pub daily_limit: i64,
    pub daily_limit_key_prefix: String,
    pub daily_limit_tz: String,
}

fn build_user_prompt(input: AdviseInput<'_>, max_body_chars: usize) -> String {
    let last_dlr = input.last_dlr.map_or_else(|| "none".to_owned(), |d| d.to_string());
    let truncated_body: String = input.body.chars().take(500).collect();
    format!(
        "message_id={} phone={} retry_count={} last_dlr={} segments={} max_chars={}\nbody: {}",
        input.message_id, input.phone, input.retry_count, last_dlr, input.segment_count, max_body_chars, truncated_body
    )
}

/// Runs the full 7-step advisor protocol from spec.md §4.3: API-key gate,
/// daily-limit consumption, the HTTP round trip, and every documented
/// fallback for a malformed or truncated reply.
///
/// Never returns `Err` — every failure mode degrades to a synthetic `DROP`
/// decision per the spec's protocol, which is itself the point of this
/// function: the pipeline should never be blocked by the advisor being
/// unavailable.
pub async fn advise(
    client: Option<&AdvisorClient>,
    api_key: Option<&str>,
    limiter: &DailyLimiter,
    config: &AdviseConfig,
    input: AdviseInput<'_>,
) -> (AdvisorDecision, i32, i32) {
    let (Some(client), Some(_api_key)) = (client, api_key) else {
        tracing::warn!("OPENROUTER_API_KEY not set; returning default DROP");
        return (AdvisorDecision::drop_with_reason("AI not configured"), 0, 0);
    };

    let limit_result =
        limiter.try_consume(&config.daily_limit_key_prefix, config.daily_limit, &config.daily_limit_tz).await;
    if !limit_result.allowed {
        return (AdvisorDecision::rate_limited(), 0, 0);
    }

    let request = ChatRequest {
        model: config.model.clone(),
        messages: vec![
            Message { role: "system".to_owned(), content: SYSTEM_PROMPT.to_owned() },
            Message { role: "user".to_owned(), content: build_user_prompt(input, config.max_body_chars) },
        ],
        response_format: ResponseFormat { format_type: "json_object".to_owned() },
        temperature: 0.0,
        max_tokens: Some(config.max_tokens),
    };

    let completion = match client.chat_completion(&request).await {
        Ok(completion) => completion,
        Err(err) => {
            tracing::warn!(error = %err, "advisor request failed");
            return (AdvisorDecision::drop_with_reason(format!("AI error: {err}")), 0, 0);
        },
    };

    let mut decision = parsing::parse_advisor_reply(&completion.content);
    if completion.truncated && decision.is_rewrite() && decision.body.as_deref().unwrap_or("").is_empty() {
        decision = AdvisorDecision::drop_with_reason("AI response truncated");
    }

    (decision, completion.input_tokens, completion.output_tokens)
}

#[cfg(test)]
mod advise_tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> AdviseConfig {
        AdviseConfig {
            model: "openrouter/test-model".to_owned(),
            max_tokens: 160,
            max_body_chars: 320,
            daily_limit: 50,
            daily_limit_key_prefix: "ai:daily:test".to_owned(),
            daily_limit_tz: "UTC".to_owned(),
        }
    }

    fn input() -> AdviseInput<'static> {
        AdviseInput {
            message_id: "event:1",
            phone: "+15551234567",
            body: "hello world",
            retry_count: 0,
            last_dlr: None,
            segment_count: 1,
        }
    }

    #[tokio::test]
    #[ignore = "requires a live Redis instance"]
    async fn returns_synthetic_drop_when_no_api_key() {
        let redis_url = std::env::var("REDIS_URL").expect("REDIS_URL must be set for this test");
        let limiter = DailyLimiter::connect(&redis_url).await.unwrap();
        let (decision, in_tok, out_tok) = advise(None, None, &limiter, &config(), input()).await;
        assert_eq!(decision.decision, "DROP");
        assert_eq!(decision.reason, "AI not configured");
        assert_eq!((in_tok, out_tok), (0, 0));
    }

    #[tokio::test]
    async fn rewrite_with_empty_body_and_truncated_finish_reason_downgrades_to_drop() {
        let server = MockServer::start().await;
        let client = AdvisorClient::new("test-key".to_owned(), server.uri(), std::time::Duration::from_secs(5));

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": {"content": "{\"decision\":\"REWRITE\",\"reason\":\"too long\""},
                    "finish_reason": "length"
                }],
                "usage": {"prompt_tokens": 10, "completion_tokens": 20}
            })))
            .mount(&server)
            .await;

        let completion = client
            .chat_completion(&ChatRequest {
                model: "m".to_owned(),
                messages: vec![],
                response_format: ResponseFormat { format_type: "json_object".to_owned() },
                temperature: 0.0,
                max_tokens: Some(10),
            })
            .await
            .unwrap();
        assert!(completion.truncated);

        let mut decision = parsing::parse_advisor_reply(&completion.content);
        if completion.truncated && decision.is_rewrite() && decision.body.as_deref().unwrap_or("").is_empty() {
            decision = AdvisorDecision::drop_with_reason("AI response truncated");
        }
        assert_eq!(decision.decision, "DROP");
        assert_eq!(decision.reason, "AI response truncated");
    }

    #[test]
    fn unrecognized_decision_string_is_not_auto_converted_but_caller_treats_as_drop() {
        // spec.md §4.3: "any other string is treated as DROP" is the
        // *caller's* responsibility (is_rewrite() is the only special case);
        // parse_advisor_reply preserves whatever string the model returned.
        let decision = parsing::parse_advisor_reply(r#"{"decision":"RETRY","reason":"temporary"}"#);
        assert_eq!(decision.decision, "RETRY");
        assert!(!decision.is_rewrite());
    }

    #[test]
    fn build_user_prompt_truncates_body_to_500_chars() {
        let long_body = "x".repeat(600);
        let input = AdviseInput { body: &long_body, ..input() };
        let prompt = build_user_prompt(input, 320);
        let body_line = prompt.lines().last().unwrap();
        assert_eq!(body_line.trim_start_matches("body: ").chars().count(), 500);
    }
}
