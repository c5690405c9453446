//! Ollama NDJSON stream to [`StreamEvent`] adapter.
//!
//! The response body arrives in arbitrary byte chunks; [`LineBuffer`]
//! reassembles complete lines, each of which is one [`GenerateChunk`].

use futures_util::{Stream, StreamExt};

use dialogue_core::llm::LlmStream;
use dialogue_types::llm::{LlmError, StreamEvent, Usage};

use super::types::GenerateChunk;

/// Splits a byte stream into complete newline-terminated lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Add bytes and drain every complete, non-blank line.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line).trim().to_string();
            if !text.is_empty() {
                lines.push(text);
            }
        }
        lines
    }

    /// The unterminated remainder, if any.
    pub fn finish(self) -> Option<String> {
        let text = String::from_utf8_lossy(&self.pending).trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}

fn parse_line(line: &str) -> Result<GenerateChunk, LlmError> {
    let chunk: GenerateChunk =
        serde_json::from_str(line).map_err(|e| LlmError::Deserialization(e.to_string()))?;
    match chunk.error {
        Some(message) => Err(LlmError::Provider { message }),
        None => Ok(chunk),
    }
}

fn chunk_events(chunk: GenerateChunk) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    if !chunk.response.is_empty() {
        events.push(StreamEvent::TextDelta {
            text: chunk.response,
        });
    }
    if chunk.done {
        events.push(StreamEvent::Usage(Usage {
            input_tokens: chunk.prompt_eval_count.unwrap_or(0),
            output_tokens: chunk.eval_count.unwrap_or(0),
        }));
        events.push(StreamEvent::Done);
    }
    events
}

/// Map a response byte stream to stream events.
///
/// Emits `Connected` first and `Done` exactly once, even when the body ends
/// without a final `done` line.
pub fn map_ndjson_stream<S, B, E>(body: S) -> LlmStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(async_stream::try_stream! {
        yield StreamEvent::Connected;

        let mut body = Box::pin(body);
        let mut buffer = LineBuffer::default();
        let mut finished = false;

        while let Some(bytes) = body.next().await {
            let bytes = bytes.map_err(|e| LlmError::Stream(e.to_string()))?;
            for line in buffer.push(bytes.as_ref()) {
                if finished {
                    continue;
                }
                let chunk = parse_line(&line)?;
                finished = chunk.done;
                for event in chunk_events(chunk) {
                    yield event;
                }
            }
            if finished {
                break;
            }
        }

        if !finished {
            if let Some(line) = buffer.finish() {
                let chunk = parse_line(&line)?;
                finished = chunk.done;
                for event in chunk_events(chunk) {
                    yield event;
                }
            }
        }
        if !finished {
            yield StreamEvent::Done;
        }
    })
}
