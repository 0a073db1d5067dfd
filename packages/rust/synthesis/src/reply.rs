//! Decoding of raw generative backend replies.
//!
//! Models often wrap JSON in a Markdown code fence (```` ```json ````).
//! The fence is stripped before parsing; replies that are not JSON are kept
//! as text so the normalizer can still surface them.

use serde_json::Value;
use tracing::debug;

const FENCE: &str = "```";

/// Strip a surrounding Markdown code fence, if any.
///
/// The payload runs from the line after the opening fence to the last
/// closing fence. An unterminated fence keeps everything after the
/// opening line.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(after_open) = trimmed.strip_prefix(FENCE) else {
        return trimmed;
    };

    // Skip the optional language tag on the opening line.
    let Some(newline) = after_open.find('\n') else {
        return trimmed;
    };
    let body = &after_open[newline + 1..];

    match body.rfind(FENCE) {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Decode a backend reply into an optional JSON value plus the reply text.
///
/// The returned text is the fence-stripped reply, used by the normalizer
/// when no structure could be parsed.
pub fn decode_reply(text: &str) -> (Option<Value>, String) {
    let payload = strip_code_fence(text);
    match serde_json::from_str::<Value>(payload) {
        Ok(value) => (Some(value), payload.to_string()),
        Err(e) => {
            debug!(error = %e, "reply is not JSON, keeping raw text");
            (None, payload.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn plain_json_is_untouched() {
        assert_eq!(strip_code_fence(r#"  {"a": 1} "#), r#"{"a": 1}"#);
    }

    #[test]
    fn json_fence_is_stripped() {
        let reply = "```json\n{\"sections\": []}\n```";
        assert_eq!(strip_code_fence(reply), "{\"sections\": []}");
    }

    #[test]
    fn bare_fence_is_stripped() {
        let reply = "```\n[1, 2]\n```\n";
        assert_eq!(strip_code_fence(reply), "[1, 2]");
    }

    #[test]
    fn unterminated_fence_keeps_body() {
        let reply = "```json\n{\"a\": 1}";
        assert_eq!(strip_code_fence(reply), "{\"a\": 1}");
    }

    #[test]
    fn single_line_fence_is_left_alone() {
        assert_eq!(strip_code_fence("```json```"), "```json```");
    }

    #[test]
    fn decode_parses_fenced_json() {
        let (value, text) = decode_reply("```json\n{\"summary\": \"S\"}\n```");
        assert_eq!(value, Some(json!({"summary": "S"})));
        assert_eq!(text, "{\"summary\": \"S\"}");
    }

    #[test]
    fn decode_keeps_prose() {
        let (value, text) = decode_reply("  The evidence suggests flow matters.  ");
        assert!(value.is_none());
        assert_eq!(text, "The evidence suggests flow matters.");
    }

    #[test]
    fn decode_empty_reply() {
        let (value, text) = decode_reply("");
        assert!(value.is_none());
        assert!(text.is_empty());
    }
}
