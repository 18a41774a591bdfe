//! Conversational query reformulation.
//!
//! A small model rewrites a follow-up turn into a standalone query that
//! resolves pronouns and elided references. The stage is strictly
//! best-effort: on timeout, empty output, or suspicious output the original
//! query is used unchanged.

use plinth_inference::provider::CompletionProvider;
use tokio_util::sync::CancellationToken;

use super::config::CqrConfig;
use super::types::{ChatTurn, TurnRole};
use crate::TRACING_TARGET;

const INSTRUCTIONS: &str = "\
Rewrite the latest user message as a standalone search query. Resolve \
pronouns and references to earlier turns so the query is understandable \
without the conversation. Keep the user's language and intent. Return only \
the rewritten query, nothing else.";

/// Outcome of the reformulation stage.
#[derive(Debug, Clone)]
pub(crate) struct CqrOutcome {
    /// The query all later stages run with.
    pub effective_query: String,
    /// Whether the rewrite was applied.
    pub applied: bool,
}

/// Reformulates a follow-up turn against recent history.
///
/// Returns the original query when there is no history to resolve against.
pub(crate) async fn reformulate(
    provider: &CompletionProvider,
    query: &str,
    history: &[ChatTurn],
    config: &CqrConfig,
    cancel: &CancellationToken,
) -> CqrOutcome {
    if history.is_empty() {
        return CqrOutcome {
            effective_query: query.to_string(),
            applied: false,
        };
    }

    let prompt = build_prompt(query, history, config);

    let rewritten = match tokio::time::timeout(
        config.timeout,
        provider.complete_prompt(&prompt, cancel),
    )
    .await
    {
        Ok(Ok(text)) => text,
        Ok(Err(error)) => {
            tracing::debug!(
                target: TRACING_TARGET,
                error = %error,
                "Query reformulation failed; using original query"
            );
            return CqrOutcome {
                effective_query: query.to_string(),
                applied: false,
            };
        }
        Err(_elapsed) => {
            tracing::debug!(
                target: TRACING_TARGET,
                timeout_ms = config.timeout.as_millis() as u64,
                "Query reformulation timed out; using original query"
            );
            return CqrOutcome {
                effective_query: query.to_string(),
                applied: false,
            };
        }
    };

    match accept_rewrite(query, &rewritten, config) {
        Some(effective_query) => CqrOutcome {
            effective_query,
            applied: true,
        },
        None => CqrOutcome {
            effective_query: query.to_string(),
            applied: false,
        },
    }
}

/// Validates a rewrite against the suspicious-output heuristics.
///
/// Rejects empty output, output identical to the original, and output
/// exceeding either the expansion ratio or the absolute length cap.
fn accept_rewrite(original: &str, rewritten: &str, config: &CqrConfig) -> Option<String> {
    let rewritten = rewritten.trim().trim_matches('"').trim();

    if rewritten.is_empty() || rewritten == original {
        return None;
    }

    let original_len = original.chars().count().max(1);
    let rewritten_len = rewritten.chars().count();

    if rewritten_len as f64 > original_len as f64 * config.max_expansion_ratio {
        return None;
    }
    if rewritten_len > config.max_rewritten_chars {
        return None;
    }

    Some(rewritten.to_string())
}

fn build_prompt(query: &str, history: &[ChatTurn], config: &CqrConfig) -> String {
    let mut lines = Vec::new();

    let start = history.len().saturating_sub(config.history_messages);
    for turn in &history[start..] {
        let role = match turn.role {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        };
        let content: String = turn
            .content
            .chars()
            .take(config.history_message_chars)
            .collect();
        lines.push(format!("{role}: {content}"));
    }

    format!(
        "{INSTRUCTIONS}\n\nConversation:\n{}\n\nLatest user message: {query}",
        lines.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CqrConfig {
        CqrConfig::default()
    }

    #[test]
    fn accepts_reasonable_rewrite() {
        let accepted = accept_rewrite(
            "When does it ship?",
            "When does Project Atlas ship?",
            &config(),
        );
        assert_eq!(accepted.as_deref(), Some("When does Project Atlas ship?"));
    }

    #[test]
    fn rejects_empty_and_identical() {
        assert!(accept_rewrite("query", "", &config()).is_none());
        assert!(accept_rewrite("query", "   ", &config()).is_none());
        assert!(accept_rewrite("query", "query", &config()).is_none());
    }

    #[test]
    fn rejects_excessive_expansion_ratio() {
        // > 3x the original length is suspicious.
        let long = "w".repeat(100);
        assert!(accept_rewrite("short one", &long, &config()).is_none());
    }

    #[test]
    fn rejects_absolute_length_cap() {
        let mut cfg = config();
        cfg.max_expansion_ratio = 1000.0;
        cfg.max_rewritten_chars = 64;

        let long = "word ".repeat(20);
        assert!(accept_rewrite("original question here", &long, &cfg).is_none());
    }

    #[test]
    fn strips_wrapping_quotes() {
        let accepted = accept_rewrite(
            "when does it ship",
            "\"when does Atlas ship\"",
            &config(),
        );
        assert_eq!(accepted.as_deref(), Some("when does Atlas ship"));
    }

    #[test]
    fn prompt_clamps_history() {
        let cfg = CqrConfig {
            history_messages: 2,
            history_message_chars: 10,
            ..config()
        };

        let history = vec![
            ChatTurn::user("first message that is quite long"),
            ChatTurn::assistant("second message that is quite long"),
            ChatTurn::user("third message that is quite long"),
        ];

        let prompt = build_prompt("next?", &history, &cfg);
        // Only the last two turns survive, truncated to ten characters.
        assert!(!prompt.contains("first mess"));
        assert!(prompt.contains("second mes"));
        assert!(prompt.contains("third mess"));
        assert!(!prompt.contains("quite long"));
    }
}
