//! Pulling JSON out of model text

use crate::error::ApiError;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::de::DeserializeOwned;

static FENCED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)```").expect("fence pattern is valid")
});

/// Find the JSON payload in a model answer.
///
/// Order of preference: a fenced code block whose body starts with `{` or
/// `[`, then the first balanced top-level object or array in the text.
pub fn extract_json_block(text: &str) -> Option<&str> {
    for captures in FENCED.captures_iter(text) {
        if let Some(body) = captures.get(1) {
            let body = body.as_str().trim();
            if body.starts_with('{') || body.starts_with('[') {
                return Some(body);
            }
        }
    }
    balanced(text)
}

/// First balanced `{...}` or `[...]`, skipping brackets inside strings
fn balanced(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[start..start + i + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract and deserialize a model answer, keeping the raw text on failure
pub fn parse_model_json<T: DeserializeOwned>(raw: &str) -> Result<T, ApiError> {
    let fail = |message: String| {
        metrics::counter!("ai_parse_failures_total").increment(1);
        ApiError::AiParse {
            message,
            raw: raw.to_string(),
        }
    };

    let block = extract_json_block(raw).ok_or_else(|| fail("no JSON found".to_string()))?;
    serde_json::from_str(block).map_err(|e| fail(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Grams {
        grams: f64,
    }

    #[test]
    fn test_json_fence() {
        let text = "Here you go:\n```json\n{\"grams\": 120}\n```\nEnjoy!";
        assert_eq!(extract_json_block(text), Some("{\"grams\": 120}"));
    }

    #[test]
    fn test_plain_fence_and_array() {
        let text = "```\n[{\"grams\": 1}]\n```";
        assert_eq!(extract_json_block(text), Some("[{\"grams\": 1}]"));
    }

    #[test]
    fn test_non_json_fence_is_skipped() {
        let text = "```text\nnothing here\n```\nthen {\"grams\": 5}";
        assert_eq!(extract_json_block(text), Some("{\"grams\": 5}"));
    }

    #[test]
    fn test_bare_object_with_braces_in_strings() {
        let text = "Sure! {\"note\": \"use } carefully\", \"grams\": 3} trailing";
        assert_eq!(
            extract_json_block(text),
            Some("{\"note\": \"use } carefully\", \"grams\": 3}")
        );
    }

    #[test]
    fn test_no_json() {
        assert_eq!(extract_json_block("I can't help with that."), None);
        assert_eq!(extract_json_block("{ unterminated"), None);
    }

    #[test]
    fn test_parse_model_json() {
        let parsed: Grams = parse_model_json("```json\n{\"grams\": 42.5}\n```").unwrap();
        assert_eq!(parsed, Grams { grams: 42.5 });
    }

    #[test]
    fn test_parse_failure_keeps_raw_text() {
        let raw = "```json\n{\"grams\": \"lots\"}\n```";
        match parse_model_json::<Grams>(raw) {
            Err(ApiError::AiParse { raw: kept, .. }) => assert_eq!(kept, raw),
            other => panic!("unexpected: {other:?}"),
        }
        match parse_model_json::<Grams>("no idea") {
            Err(ApiError::AiParse { message, .. }) => assert_eq!(message, "no JSON found"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
