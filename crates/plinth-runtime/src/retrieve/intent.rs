//! Intent gate.
//!
//! Classifies whether a turn needs knowledge retrieval at all. Greetings,
//! acknowledgments, and small talk short-circuit the pipeline. The gate
//! fails open: any classification failure proceeds with retrieval.

use std::time::Duration;

use plinth_inference::provider::CompletionProvider;
use schemars::JsonSchema;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET;

const SOFT_TIMEOUT: Duration = Duration::from_secs(2);

const INSTRUCTIONS: &str = "\
Classify whether answering the user's message requires searching a knowledge \
base. Greetings, acknowledgments, thanks, and small talk do not. Factual \
questions, information-seeking queries, and anything referencing documents, \
policies, products, or facts do.";

/// Strict output contract for the classifier.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub(crate) struct IntentVerdict {
    /// Whether retrieval is required.
    pub requires_rag: bool,
    /// Short reason for the verdict.
    pub reason: String,
}

/// Outcome of the intent gate.
#[derive(Debug, Clone)]
pub(crate) struct IntentOutcome {
    /// Whether the pipeline should continue to retrieval.
    pub requires_rag: bool,
    /// Reason string, recorded in the debug record.
    pub reason: String,
}

/// Classifies the effective query.
pub(crate) async fn classify(
    provider: &CompletionProvider,
    query: &str,
    cancel: &CancellationToken,
) -> IntentOutcome {
    let result = tokio::time::timeout(
        SOFT_TIMEOUT,
        provider.generate_structured::<IntentVerdict>(INSTRUCTIONS, query, cancel),
    )
    .await;

    match result {
        Ok(Ok(verdict)) => IntentOutcome {
            requires_rag: verdict.requires_rag,
            reason: verdict.reason,
        },
        Ok(Err(error)) => {
            tracing::debug!(
                target: TRACING_TARGET,
                error = %error,
                "Intent classification failed; proceeding with retrieval"
            );
            IntentOutcome {
                requires_rag: true,
                reason: "classification failed; defaulting to retrieval".to_string(),
            }
        }
        Err(_elapsed) => {
            tracing::debug!(
                target: TRACING_TARGET,
                "Intent classification timed out; proceeding with retrieval"
            );
            IntentOutcome {
                requires_rag: true,
                reason: "classification timed out; defaulting to retrieval".to_string(),
            }
        }
    }
}
