//! Extraction of structured payloads from reasoning-service responses.
//!
//! The service is asked to answer via a function tool, but models do not
//! always comply: sometimes the payload arrives as free text containing a
//! JSON object, fenced or bare. The result is tagged so callers can tell a
//! clean tool call from a fallback parse from a flat failure, instead of
//! treating the last two as the same thing.

use kimi_async::types::chat::ChatCompletionResponse;
use regex::Regex;
use serde_json::Value;

/// Tagged outcome of payload extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolPayload {
    /// The model called the requested tool with parseable arguments
    Structured(Value),
    /// No usable tool call; a JSON object was recovered from text content
    FallbackParsed(Value),
    /// Nothing parseable; carries the raw text (possibly empty) for logging
    Unparsed(String),
}

impl ToolPayload {
    /// The recovered payload, if any.
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Structured(v) | Self::FallbackParsed(v) => Some(v),
            Self::Unparsed(_) => None,
        }
    }
}

/// Extracts the payload for `tool_name` from a chat response.
///
/// Preference order: a tool call matching `tool_name` (any tool call is
/// accepted if none matches by name, since the request forces a single
/// tool), then a JSON object recovered from the text content.
#[must_use]
pub fn extract_payload(resp: &ChatCompletionResponse, tool_name: &str) -> ToolPayload {
    if let Some(calls) = resp
        .choices
        .first()
        .and_then(|c| c.message.tool_calls.as_ref())
    {
        let call = calls
            .iter()
            .find(|c| c.function.name == tool_name)
            .or_else(|| calls.first());
        if let Some(call) = call {
            match serde_json::from_str::<Value>(&call.function.arguments) {
                Ok(v) if v.is_object() => return ToolPayload::Structured(v),
                Ok(_) | Err(_) => {
                    tracing::debug!(
                        tool = %call.function.name,
                        "tool call arguments were not a JSON object; trying text fallback"
                    );
                }
            }
        }
    }

    let text = resp.first_text().unwrap_or_default();
    match recover_json_object(text) {
        Some(v) => ToolPayload::FallbackParsed(v),
        None => ToolPayload::Unparsed(text.to_string()),
    }
}

/// Best-effort recovery of a JSON object from free text.
///
/// Tries, in order: the whole text, the first fenced ```json block, and
/// the first balanced `{...}` span.
#[must_use]
pub fn recover_json_object(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(v) = serde_json::from_str::<Value>(trimmed)
        && v.is_object()
    {
        return Some(v);
    }

    if let Some(fenced) = extract_fenced_json(trimmed)
        && let Ok(v) = serde_json::from_str::<Value>(&fenced)
        && v.is_object()
    {
        return Some(v);
    }

    let span = balanced_object_span(trimmed)?;
    serde_json::from_str::<Value>(span).ok().filter(Value::is_object)
}

fn extract_fenced_json(s: &str) -> Option<String> {
    // Tolerates an optional language tag and leading whitespace on fences.
    let re = Regex::new(r"(?s)```(?:json|JSON)?\s*\n(.*?)```").ok()?;
    re.captures(s)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// Finds the first balanced top-level `{...}` span, honoring strings and
/// escapes so braces inside string values do not confuse the scan.
fn balanced_object_span(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: serde_json::Value) -> ChatCompletionResponse {
        serde_json::from_value(body).unwrap()
    }

    fn text_response(content: &str) -> ChatCompletionResponse {
        response(json!({
            "id": "cmpl-t",
            "object": "chat.completion",
            "model": "kimi-k2-0905-preview",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content }
            }]
        }))
    }

    #[test]
    fn structured_tool_call_wins() {
        let resp = response(json!({
            "id": "cmpl-1",
            "object": "chat.completion",
            "model": "kimi-k2-0905-preview",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "I'll use the tool.",
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {
                            "name": "check_foundation",
                            "arguments": "{\"is_foundation\": true}"
                        }
                    }]
                }
            }]
        }));

        let p = extract_payload(&resp, "check_foundation");
        assert_eq!(p, ToolPayload::Structured(json!({ "is_foundation": true })));
    }

    #[test]
    fn mismatched_tool_name_still_accepted() {
        let resp = response(json!({
            "id": "cmpl-2",
            "object": "chat.completion",
            "model": "kimi-k2-0905-preview",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "check-foundation", "arguments": "{\"is_foundation\": false}" }
                    }]
                }
            }]
        }));

        let p = extract_payload(&resp, "check_foundation");
        assert!(matches!(p, ToolPayload::Structured(_)));
    }

    #[test]
    fn fallback_whole_text_object() {
        let p = extract_payload(&text_response(r#"{"prerequisites": ["A", "B"]}"#), "list_prerequisites");
        assert_eq!(
            p,
            ToolPayload::FallbackParsed(json!({ "prerequisites": ["A", "B"] }))
        );
    }

    #[test]
    fn fallback_fenced_block() {
        let content = "Here you go:\n```json\n{\"is_foundation\": false}\n```\nHope that helps!";
        let p = extract_payload(&text_response(content), "check_foundation");
        assert_eq!(p, ToolPayload::FallbackParsed(json!({ "is_foundation": false })));
    }

    #[test]
    fn fallback_object_embedded_in_prose() {
        let content = r#"The answer is {"prerequisites": ["algebra {basics}", "geometry"]} as requested."#;
        let p = extract_payload(&text_response(content), "list_prerequisites");
        assert_eq!(
            p,
            ToolPayload::FallbackParsed(json!({ "prerequisites": ["algebra {basics}", "geometry"] }))
        );
    }

    #[test]
    fn braces_inside_strings_do_not_break_scan() {
        let v = recover_json_object(r#"x {"a": "b } c", "d": 1} y"#).unwrap();
        assert_eq!(v, json!({ "a": "b } c", "d": 1 }));
    }

    #[test]
    fn garbage_is_unparsed() {
        let p = extract_payload(&text_response("I cannot answer that."), "check_foundation");
        assert_eq!(p, ToolPayload::Unparsed("I cannot answer that.".into()));
    }

    #[test]
    fn empty_content_is_unparsed() {
        let resp = response(json!({
            "id": "cmpl-3",
            "object": "chat.completion",
            "model": "kimi-k2-0905-preview",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "   " }
            }]
        }));
        let p = extract_payload(&resp, "enrich_math");
        assert_eq!(p, ToolPayload::Unparsed(String::new()));
    }

    #[test]
    fn bare_array_is_not_an_object() {
        assert!(recover_json_object(r#"["A", "B"]"#).is_none());
    }
}
