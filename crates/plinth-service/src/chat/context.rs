//! System prompt composition.

use plinth_runtime::retrieve::RetrievedChunk;

const CONTEXT_HEADER: &str = "## Knowledge Base Context";

const CITATION_INSTRUCTIONS: &str = "\
Use the numbered context entries above to ground your answer. When you use \
information from an entry, cite it with [source: <sourceId>].";

const CONTEXT_ONLY_DIRECTIVE: &str = "\
Answer only from the provided context. If the context does not contain the \
answer, say that you do not know.";

/// Composes the final system prompt: the rendered template plus, when
/// retrieval produced context, a structured knowledge block and citation
/// instructions, plus any guardrail directives.
pub(crate) fn compose_system_prompt(
    rendered: &str,
    context: Option<&[RetrievedChunk]>,
    context_only: bool,
) -> String {
    let mut prompt = rendered.trim_end().to_string();

    if let Some(chunks) = context
        && !chunks.is_empty()
    {
        prompt.push_str("\n\n");
        prompt.push_str(CONTEXT_HEADER);
        prompt.push('\n');

        for (i, chunk) in chunks.iter().enumerate() {
            let source = chunk
                .source_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| chunk.chunk_id.clone());
            let relevance = (chunk.score.clamp(0.0, 1.0) * 100.0).round() as u32;

            prompt.push_str(&format!(
                "\n[{}] (source: {}, relevance: {}%)\n{}\n",
                i + 1,
                source,
                relevance,
                chunk.content.trim()
            ));
        }

        prompt.push('\n');
        prompt.push_str(CITATION_INSTRUCTIONS);
    }

    if context_only {
        prompt.push_str("\n\n");
        prompt.push_str(CONTEXT_ONLY_DIRECTIVE);
    }

    prompt
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn chunk(content: &str, score: f64) -> RetrievedChunk {
        RetrievedChunk {
            chunk_id: Uuid::new_v4().to_string(),
            source_id: Some(Uuid::new_v4()),
            chunk_index: Some(0),
            content: content.to_string(),
            score,
            vector_score: None,
            rerank_score: None,
            file_name: None,
        }
    }

    #[test]
    fn no_context_keeps_base_prompt() {
        let prompt = compose_system_prompt("You are helpful.", None, false);
        assert_eq!(prompt, "You are helpful.");
        assert!(!prompt.contains(CONTEXT_HEADER));
    }

    #[test]
    fn context_block_lists_numbered_chunks() {
        let chunks = vec![chunk("First passage.", 0.92), chunk("Second passage.", 0.5)];
        let prompt = compose_system_prompt("Base.", Some(&chunks), false);

        assert!(prompt.contains(CONTEXT_HEADER));
        assert!(prompt.contains("[1] (source: "));
        assert!(prompt.contains("relevance: 92%"));
        assert!(prompt.contains("[2] (source: "));
        assert!(prompt.contains("First passage."));
        assert!(prompt.contains("[source: <sourceId>]"));
    }

    #[test]
    fn guardrail_directive_appended() {
        let prompt = compose_system_prompt("Base.", None, true);
        assert!(prompt.ends_with(CONTEXT_ONLY_DIRECTIVE));
    }
}
