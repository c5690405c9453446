//! LlmProvider trait definition.

use std::pin::Pin;

use futures_util::Stream;

use dialogue_types::llm::{CompletionRequest, LlmError, StreamEvent};

/// Boxed stream of completion events.
pub type LlmStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>;

/// Trait for streaming completion backends.
///
/// `stream` returns a boxed stream rather than RPITIT so that the trait can
/// be erased behind `BoxLlmProvider`. Implementations live in
/// dialogue-infra (e.g. `OllamaProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g. "ollama").
    fn name(&self) -> &str;

    /// Model used when a request leaves `model` empty.
    fn default_model(&self) -> &str;

    /// Send a streaming completion request.
    ///
    /// Connection and HTTP failures surface as the first stream item.
    fn stream(&self, request: CompletionRequest) -> LlmStream;
}
