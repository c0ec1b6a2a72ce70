//! Best-effort JSON extraction from free-form model replies.
//!
//! The remote model's output format is not contractually guaranteed, so the
//! extractor walks a cascade of progressively looser strategies and never
//! errors on malformed structure.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Outermost brace block; one level of nested braces tolerated
static BRACE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(?:[^{}]|\{[^{}]*\})*\}").unwrap());

/// Fenced code block explicitly labeled as JSON
static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(.*?)```").unwrap());

/// Any fenced code block
static ANY_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:[a-zA-Z0-9_-]*)\s*(.*?)```").unwrap());

/// Extracts a JSON value from a model's raw text reply.
///
/// Strategies, in order, until one parses:
/// 1. the whole string as JSON;
/// 2. the outermost brace-delimited block;
/// 3. a fenced block labeled `json`;
/// 4. any fenced block.
///
/// Returns `None` when every strategy fails.
pub fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    if let Some(block) = BRACE_BLOCK.find(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(block.as_str()) {
            return Some(value);
        }
    }

    for fence in [&*JSON_FENCE, &*ANY_FENCE] {
        if let Some(captures) = fence.captures(trimmed) {
            if let Ok(value) = serde_json::from_str::<Value>(captures[1].trim()) {
                return Some(value);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_whole_string_json() {
        assert_eq!(extract_json(r#"{"a":1}"#), Some(json!({"a": 1})));
    }

    #[test]
    fn test_whole_string_json_array() {
        assert_eq!(extract_json("[1, 2]"), Some(json!([1, 2])));
    }

    #[test]
    fn test_brace_block_inside_prose() {
        let text = r#"Sure! Here you go: {"a": 1} and that's all."#;
        assert_eq!(extract_json(text), Some(json!({"a": 1})));
    }

    #[test]
    fn test_brace_block_with_one_nesting_level() {
        let text = r#"result: {"analysis": "ok", "inner": {"b": 2}} done"#;
        assert_eq!(
            extract_json(text),
            Some(json!({"analysis": "ok", "inner": {"b": 2}}))
        );
    }

    #[test]
    fn test_labeled_fence() {
        let text = "blah ```json\n{\"a\":1}\n``` blah";
        assert_eq!(extract_json(text), Some(json!({"a": 1})));
    }

    #[test]
    fn test_unlabeled_fence() {
        let text = "reply:\n```\n[\"x\", \"y\"]\n```";
        assert_eq!(extract_json(text), Some(json!(["x", "y"])));
    }

    #[test]
    fn test_fence_beats_nothing_when_brace_block_is_malformed() {
        // The inline brace block is invalid JSON; the fenced block parses.
        let text = "{oops} ```json\n{\"ok\": true}\n```";
        assert_eq!(extract_json(text), Some(json!({"ok": true})));
    }

    #[test]
    fn test_no_json_found() {
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json(""), None);
        assert_eq!(extract_json("   "), None);
    }

    #[test]
    fn test_malformed_everywhere() {
        assert_eq!(extract_json("{not json} ```json\n{nor this}\n```"), None);
    }
}
