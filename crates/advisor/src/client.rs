//! HTTP client for the advisor's chat-completions endpoint, grounded on the
//! teacher's `LlmClient` (client.rs) shape and its retry contract.

use std::time::Duration;

use crate::error::AdvisorError;
use crate::types::ChatRequest;

/// Maximum number of attempts for a single `chat_completion` call (one
/// initial attempt plus three retries) — matches the exhaustion behavior
/// exercised by this crate's retry tests.
const MAX_ATTEMPTS: u32 = 4;

#[derive(Debug, Clone)]
pub struct AdvisorClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

/// A chat-completions response, split into the raw content and whether the
/// provider reported a truncated (`finish_reason == "length"`) completion.
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    pub content: String,
    pub truncated: bool,
    pub input_tokens: i32,
    pub output_tokens: i32,
}

impl AdvisorClient {
    /// # Panics
    /// Panics if the underlying `reqwest::Client` fails to build (only
    /// possible with an invalid TLS configuration, which never happens with
    /// defaults).
    #[must_use]
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder().timeout(timeout).build().expect("reqwest client");
        Self { client, api_key, base_url: base_url.trim_end_matches('/').to_owned(), timeout }
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Posts `request` to `{base_url}/v1/chat/completions`, retrying up to
    /// [`MAX_ATTEMPTS`] times on a transient HTTP status (429 or 5xx) or
    /// network error. Any other status fails immediately without retry.
    ///
    /// # Errors
    /// Returns `AdvisorError::HttpStatus` for a non-transient error status,
    /// or `AdvisorError::RetriesExhausted` once all attempts are spent.
    pub async fn chat_completion(&self, request: &ChatRequest) -> Result<ChatCompletion, AdvisorError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let mut last_err = None;

        for attempt in 1..=MAX_ATTEMPTS {
            let result = self.try_once(&url, request).await;
            match result {
                Ok(completion) => return Ok(completion),
                Err(err) if err.is_transient() && attempt < MAX_ATTEMPTS => {
                    tracing::warn!(attempt, error = %err, "advisor call failed, retrying");
                    tokio::time::sleep(Duration::from_millis(50 * u64::from(attempt))).await;
                    last_err = Some(err);
                },
                Err(err) => return Err(if err.is_transient() { AdvisorError::RetriesExhausted(Box::new(err)) } else { err }),
            }
        }

        Err(AdvisorError::RetriesExhausted(Box::new(
            last_err.unwrap_or(AdvisorError::HttpStatus { code: 0, body: "unknown".to_owned() }),
        )))
    }

    async fn try_once(&self, url: &str, request: &ChatRequest) -> Result<ChatCompletion, AdvisorError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::HttpStatus { code: status.as_u16(), body });
        }

        let parsed: crate::types::ChatResponse = response.json().await?;
        let choice = parsed.choices.into_iter().next();
        let (content, truncated) = choice
            .map(|c| (c.message.content, c.finish_reason.as_deref() == Some("length")))
            .unwrap_or_default();
        let usage = parsed.usage.unwrap_or_default();
        Ok(ChatCompletion {
            content,
            truncated,
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        })
    }
}
