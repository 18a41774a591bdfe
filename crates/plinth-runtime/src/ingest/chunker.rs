//! Recursive text chunking.

use text_splitter::{ChunkConfig, TextSplitter};

use crate::TRACING_TARGET;

/// Configuration for the chunker.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Maximum chunk size in characters.
    pub max_chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub overlap: usize,
    /// Fragments shorter than this are discarded.
    pub min_chunk_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 1024,
            overlap: 200,
            min_chunk_size: 32,
        }
    }
}

/// Splits text into semantically coherent chunks.
///
/// Uses a recursive splitter that prefers paragraph, then sentence, then word
/// boundaries. Post-condition: every emitted chunk has a length within
/// `[min_chunk_size, max_chunk_size]` — oversized input is recursively
/// resplit rather than truncated mid-word, and tiny fragments are discarded.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Creates a chunker with the given configuration.
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Splits text into chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chunk_config = ChunkConfig::new(self.config.max_chunk_size)
            .with_overlap(self.config.overlap.min(self.config.max_chunk_size / 2))
            .expect("overlap must be less than max chunk size")
            .with_trim(true);

        let splitter = TextSplitter::new(chunk_config);

        let chunks: Vec<String> = splitter
            .chunks(text)
            .filter(|chunk| chunk.chars().count() >= self.config.min_chunk_size)
            .map(str::to_string)
            .collect();

        tracing::debug!(
            target: TRACING_TARGET,
            chunk_count = chunks.len(),
            text_len = text.len(),
            "Split text into chunks"
        );

        chunks
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(ChunkerConfig::default())
    }
}

/// Rough token estimate used for chunk rows and run metrics.
pub fn estimate_tokens(text: &str) -> i32 {
    (text.chars().count() / 4).max(1) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_respect_bounds() {
        let chunker = Chunker::new(ChunkerConfig {
            max_chunk_size: 100,
            overlap: 20,
            min_chunk_size: 10,
        });

        let paragraph = "The refund policy allows returns within thirty days of purchase. \
            Items must be unused and in original packaging. Refunds are issued to the \
            original payment method within five business days of receiving the return.";
        let text = format!("{paragraph}\n\n{paragraph}\n\n{paragraph}");

        let chunks = chunker.split(&text);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            let len = chunk.chars().count();
            assert!(len <= 100, "chunk exceeded max size: {len}");
            assert!(len >= 10, "tiny fragment survived: {len}");
        }
    }

    #[test]
    fn discards_tiny_fragments() {
        let chunker = Chunker::new(ChunkerConfig {
            max_chunk_size: 50,
            overlap: 0,
            min_chunk_size: 30,
        });

        let chunks = chunker.split("ok");
        assert!(chunks.is_empty());
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let chunker = Chunker::new(ChunkerConfig {
            max_chunk_size: 60,
            overlap: 0,
            min_chunk_size: 5,
        });

        let chunks = chunker.split("First paragraph about shipping.\n\nSecond paragraph about returns.");
        assert!(chunks.len() >= 2);
        assert!(chunks[0].contains("shipping"));
        assert!(chunks[1].contains("returns"));
    }

    #[test]
    fn token_estimate_is_positive() {
        assert_eq!(estimate_tokens(""), 1);
        assert!(estimate_tokens(&"word ".repeat(100)) > 100);
    }
}
