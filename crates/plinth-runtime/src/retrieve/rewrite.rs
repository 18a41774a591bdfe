//! Query rewriting.
//!
//! Expands the effective query into distinct reformulations and extracts
//! keywords for full-text search. Very short queries bypass the model call
//! entirely; failures degrade to the original query plus naive keywords.

use std::time::Duration;

use plinth_inference::provider::CompletionProvider;
use schemars::JsonSchema;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET;

const SOFT_TIMEOUT: Duration = Duration::from_secs(2);

/// Maximum keywords contributed to full-text search.
const MAX_KEYWORDS: usize = 6;

/// Queries at or below this word count skip rewriting.
const SHORT_QUERY_WORDS: usize = 3;

const INSTRUCTIONS: &str = "\
Expand the search query into distinct reformulations that could surface \
relevant passages: synonyms, specific phrasings, and decompositions. Also \
extract the most discriminative keywords.";

/// Strict output contract for the rewriter.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
struct RewriteOutput {
    /// Distinct query reformulations.
    variations: Vec<String>,
    /// Discriminative keywords.
    keywords: Vec<String>,
}

/// Outcome of the rewrite stage.
#[derive(Debug, Clone)]
pub(crate) struct RewriteOutcome {
    /// Query variations; always contains the effective query first.
    pub variations: Vec<String>,
    /// Up to six keywords for full-text search.
    pub keywords: Vec<String>,
}

/// Expands the effective query into `target_count` variations.
pub(crate) async fn expand(
    provider: &CompletionProvider,
    query: &str,
    target_count: usize,
    cancel: &CancellationToken,
) -> RewriteOutcome {
    if is_short_query(query) {
        return RewriteOutcome {
            variations: vec![query.to_string()],
            keywords: naive_keywords(query),
        };
    }

    let input = format!("Query: {query}\nTarget variation count: {target_count}");

    let result = tokio::time::timeout(
        SOFT_TIMEOUT,
        provider.generate_structured::<RewriteOutput>(INSTRUCTIONS, &input, cancel),
    )
    .await;

    match result {
        Ok(Ok(output)) => assemble(query, output, target_count),
        Ok(Err(error)) => {
            tracing::debug!(
                target: TRACING_TARGET,
                error = %error,
                "Query rewrite failed; using original query"
            );
            fallback(query)
        }
        Err(_elapsed) => {
            tracing::debug!(
                target: TRACING_TARGET,
                "Query rewrite timed out; using original query"
            );
            fallback(query)
        }
    }
}

/// Builds the degraded outcome: the query itself plus naive keywords.
pub(crate) fn fallback(query: &str) -> RewriteOutcome {
    RewriteOutcome {
        variations: vec![query.to_string()],
        keywords: naive_keywords(query),
    }
}

fn is_short_query(query: &str) -> bool {
    query.split_whitespace().count() <= SHORT_QUERY_WORDS
}

fn assemble(query: &str, output: RewriteOutput, target_count: usize) -> RewriteOutcome {
    let mut variations = vec![query.to_string()];
    for variation in output.variations {
        let variation = variation.trim().to_string();
        if !variation.is_empty() && !variations.contains(&variation) {
            variations.push(variation);
        }
        if variations.len() >= target_count.max(1) {
            break;
        }
    }

    let mut keywords: Vec<String> = output
        .keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();
    keywords.dedup();
    keywords.truncate(MAX_KEYWORDS);

    if keywords.is_empty() {
        keywords = naive_keywords(query);
    }

    RewriteOutcome {
        variations,
        keywords,
    }
}

/// Extracts keywords without a model: the longest distinct words.
fn naive_keywords(query: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut words: Vec<String> = query
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|w| w.chars().count() > 2)
        .filter(|w| seen.insert(w.clone()))
        .collect();

    words.sort_by_key(|w| std::cmp::Reverse(w.chars().count()));
    words.truncate(MAX_KEYWORDS);
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_queries_bypass_rewriting() {
        assert!(is_short_query("refund policy"));
        assert!(is_short_query("what is this"));
        assert!(!is_short_query("what is our refund policy exactly"));
    }

    #[test]
    fn fallback_contributes_query_and_tokens() {
        let outcome = fallback("what is our refund policy");
        assert_eq!(outcome.variations, vec!["what is our refund policy"]);
        assert!(outcome.keywords.contains(&"refund".to_string()));
        assert!(outcome.keywords.contains(&"policy".to_string()));
        // Short tokens are dropped.
        assert!(!outcome.keywords.contains(&"is".to_string()));
    }

    #[test]
    fn assemble_dedupes_and_caps() {
        let output = RewriteOutput {
            variations: vec![
                "refund policy details".to_string(),
                "refund policy details".to_string(),
                "how to get a refund".to_string(),
                "money back policy".to_string(),
            ],
            keywords: vec![
                "refund".to_string(),
                "policy".to_string(),
                "returns".to_string(),
                "money".to_string(),
                "back".to_string(),
                "reimbursement".to_string(),
                "overflow".to_string(),
            ],
        };

        let outcome = assemble("what is our refund policy", output, 3);
        assert_eq!(outcome.variations.len(), 3);
        assert_eq!(outcome.variations[0], "what is our refund policy");
        assert_eq!(outcome.keywords.len(), MAX_KEYWORDS);
    }
}
