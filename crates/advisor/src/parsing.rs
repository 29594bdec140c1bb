//! JSON-robust parsing of the advisor's free-text reply (spec.md §4.3 step
//! 5), grounded on `worker/ai_guard.py::_safe_json_parse`.

use crate::types::AdvisorDecision;

/// Strips a leading/trailing Markdown code fence (with an optional `json`
/// language tag) the way LLMs habitually wrap JSON replies in, even when
/// asked not to.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let mut parts = trimmed.splitn(3, "```");
    let _ = parts.next();
    let Some(body) = parts.next() else {
        return trimmed;
    };
    body.strip_prefix("json").unwrap_or(body).trim()
}

/// Extracts the first balanced `{...}` substring, tolerating leading/trailing
/// prose around the JSON object.
fn extract_balanced_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0_i32;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            },
            _ => {},
        }
    }
    None
}

/// Scans raw text for `"decision"`/`"reason"`/`"body"` string-valued tokens
/// without requiring valid JSON, as a last-resort fallback (spec.md §4.3
/// step 5's "forgiving field extractor").
fn forgiving_field_scan(text: &str) -> AdvisorDecision {
    let decision = scan_field(text, "decision");
    let reason = scan_field(text, "reason");
    let body = scan_field(text, "body");
    AdvisorDecision {
        decision: decision.unwrap_or_else(|| "DROP".to_owned()),
        reason: reason.unwrap_or_else(|| "Unknown".to_owned()),
        body,
        rate_limited: false,
    }
}

fn scan_field(text: &str, field: &str) -> Option<String> {
    let needle = format!("\"{field}\"");
    let idx = text.find(&needle)?;
    let after_key = &text[idx + needle.len()..];
    let colon = after_key.find(':')?;
    let after_colon = after_key[colon + 1..].trim_start();
    let quote = after_colon.strip_prefix('"')?;
    let end = quote.find('"')?;
    Some(quote[..end].to_owned())
}

/// Parses the advisor's raw reply content into a decision object, following
/// spec.md §4.3 step 5's fallback chain: code-fence strip -> balanced-brace
/// JSON parse -> forgiving field scan -> default DROP/Invalid.
#[must_use]
pub fn parse_advisor_reply(raw_content: &str) -> AdvisorDecision {
    let unfenced = strip_code_fence(raw_content);
    let candidate = extract_balanced_braces(unfenced).unwrap_or(unfenced);

    match serde_json::from_str::<serde_json::Value>(candidate) {
        Ok(serde_json::Value::Object(map)) => AdvisorDecision {
            decision: map.get("decision").and_then(|v| v.as_str()).unwrap_or("DROP").to_owned(),
            reason: map.get("reason").and_then(|v| v.as_str()).unwrap_or("Unknown").to_owned(),
            body: map.get("body").and_then(|v| v.as_str()).map(ToOwned::to_owned),
            rate_limited: false,
        },
        _ => {
            let scanned = forgiving_field_scan(unfenced);
            if scanned.reason == "Unknown" && scanned.body.is_none() && scanned.decision == "DROP" {
                tracing::warn!(raw = %raw_content, "AI returned non-JSON, no fields recovered");
                AdvisorDecision::drop_with_reason("Invalid AI response")
            } else {
                scanned
            }
        },
    }
}
