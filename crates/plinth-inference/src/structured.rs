//! Tolerant parsing of structured model output.

use serde::de::DeserializeOwned;

use crate::error::{LlmError, LlmResult};

/// Parses a JSON value out of raw model output.
///
/// Models frequently wrap JSON in markdown code fences despite instructions;
/// leading and trailing fence markers are stripped before deserialization.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> LlmResult<T> {
    let cleaned = strip_code_fences(raw);

    serde_json::from_str(cleaned)
        .map_err(|e| LlmError::parse(format!("structured output did not match schema: {e}")))
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop an optional language tag on the opening fence line.
    let rest = match rest.split_once('\n') {
        Some((_lang, body)) => body,
        None => rest,
    };

    rest.trim().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Verdict {
        requires_rag: bool,
        reason: String,
    }

    #[test]
    fn parses_bare_json() {
        let verdict: Verdict =
            parse_structured(r#"{"requires_rag": true, "reason": "factual"}"#).unwrap();
        assert!(verdict.requires_rag);
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n{\"requires_rag\": false, \"reason\": \"greeting\"}\n```";
        let verdict: Verdict = parse_structured(raw).unwrap();
        assert!(!verdict.requires_rag);
        assert_eq!(verdict.reason, "greeting");
    }

    #[test]
    fn parses_fence_without_language() {
        let raw = "```\n{\"requires_rag\": true, \"reason\": \"x\"}\n```";
        let verdict: Verdict = parse_structured(raw).unwrap();
        assert!(verdict.requires_rag);
    }

    #[test]
    fn rejects_non_json() {
        let result: LlmResult<Verdict> = parse_structured("I think the answer is yes.");
        assert!(result.is_err());
    }
}
