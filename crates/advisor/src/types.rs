//! Wire types for the advisor's chat-completions request/response, grounded
//! on the teacher's `ai_types.rs`.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub response_format: ResponseFormat,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Serialize, Clone)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

#[derive(Serialize, Clone)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: i32,
    #[serde(default)]
    pub completion_tokens: i32,
}

/// The decision object the pipeline acts on (spec.md §4.3). Anything outside
/// `{DROP, REWRITE}` in `decision` is treated as `DROP` by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisorDecision {
    pub decision: String,
    pub reason: String,
    pub body: Option<String>,
    pub rate_limited: bool,
}

impl AdvisorDecision {
    #[must_use]
    pub fn drop_with_reason(reason: impl Into<String>) -> Self {
        Self { decision: "DROP".to_owned(), reason: reason.into(), body: None, rate_limited: false }
    }

    #[must_use]
    pub fn rate_limited() -> Self {
        Self {
            decision: "DROP".to_owned(),
            reason: "AI daily usage limit reached".to_owned(),
            body: None,
            rate_limited: true,
        }
    }

    /// Whether the pipeline should act on `REWRITE`; anything else (including
    /// unrecognized strings) is treated as `DROP` (spec.md §4.3's last line).
    #[must_use]
    pub fn is_rewrite(&self) -> bool {
        self.decision == "REWRITE"
    }
}
