//! Server-sent event parsing for streaming completions.

use std::pin::Pin;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use super::wire::StreamChunk;
use crate::TRACING_TARGET;
use crate::error::{LlmError, LlmResult};
use crate::usage::UsageStats;

/// One event of a streaming completion.
#[derive(Debug, Clone)]
pub enum TokenEvent {
    /// An incremental text delta.
    Delta(String),
    /// Terminal event; emitted exactly once when the stream ends.
    Done {
        /// Accumulated token usage, when the provider reported it.
        usage: UsageStats,
        /// Why generation stopped.
        finish_reason: Option<String>,
    },
}

/// A stream of token events.
pub type TokenStream = Pin<Box<dyn Stream<Item = LlmResult<TokenEvent>> + Send>>;

/// Parses an SSE response body into a [`TokenStream`].
///
/// Lines are `data: {json}` chunks terminated by `data: [DONE]`. Providers
/// that omit the `[DONE]` sentinel still get a terminal [`TokenEvent::Done`]
/// when the body ends.
pub(crate) fn parse_sse_stream(
    response: reqwest::Response,
    provider: String,
    cancel: CancellationToken,
) -> TokenStream {
    Box::pin(async_stream::try_stream! {
        let mut body = Box::pin(response.bytes_stream());
        // Byte buffer: network chunks may split multi-byte characters, so
        // only complete lines are decoded.
        let mut buffer: Vec<u8> = Vec::new();
        let mut usage = UsageStats::default();
        let mut finish_reason: Option<String> = None;

        'outer: loop {
            let cancelled;
            let next = tokio::select! {
                _ = cancel.cancelled() => {
                    cancelled = true;
                    None
                }
                chunk = body.next() => {
                    cancelled = false;
                    chunk
                }
            };
            if cancelled {
                Err::<(), LlmError>(LlmError::Cancelled)?;
            }

            let Some(chunk) = next else { break };
            let chunk = chunk.map_err(LlmError::Transport)?;
            buffer.extend_from_slice(&chunk);

            while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
                let line_bytes: Vec<u8> = buffer.drain(..=newline).collect();
                let line = String::from_utf8_lossy(&line_bytes);
                let line = line.trim_end_matches(['\n', '\r']);

                let Some(data) = line.strip_prefix("data: ") else {
                    continue;
                };

                if data == "[DONE]" {
                    break 'outer;
                }

                let parsed: StreamChunk = match serde_json::from_str(data) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        tracing::warn!(
                            target: TRACING_TARGET,
                            provider = %provider,
                            error = %e,
                            "Skipping unparseable stream chunk"
                        );
                        continue;
                    }
                };

                if let Some(wire_usage) = parsed.usage {
                    usage = wire_usage.into();
                }

                for choice in parsed.choices {
                    if let Some(reason) = choice.finish_reason {
                        finish_reason = Some(reason);
                    }
                    if let Some(content) = choice.delta.content
                        && !content.is_empty()
                    {
                        yield TokenEvent::Delta(content);
                    }
                }
            }
        }

        yield TokenEvent::Done {
            usage,
            finish_reason,
        };
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // SSE framing is exercised through string-level parsing of the chunk
    // payloads; the network path is covered by the provider tests.
    #[test]
    fn chunk_parses_delta_and_finish() {
        let chunk: StreamChunk = serde_json::from_str(
            r#"{"choices":[{"delta":{"content":"Hel"},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hel"));

        let done: StreamChunk = serde_json::from_str(
            r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert_eq!(done.choices[0].finish_reason.as_deref(), Some("stop"));
    }
}
