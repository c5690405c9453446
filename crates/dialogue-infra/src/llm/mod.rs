//! LLM provider implementations.
//!
//! [`create_provider`] builds the configured provider behind a
//! [`BoxLlmProvider`]. Ollama is the only backend.

pub mod ollama;

use dialogue_core::llm::BoxLlmProvider;
use dialogue_types::config::LlmSettings;
use dialogue_types::llm::LlmError;

use self::ollama::OllamaProvider;

/// Create a [`BoxLlmProvider`] from [`LlmSettings`].
pub fn create_provider(settings: &LlmSettings) -> Result<BoxLlmProvider, LlmError> {
    if settings.model.trim().is_empty() {
        return Err(LlmError::InvalidRequest("llm.model must not be empty".to_string()));
    }
    let provider = OllamaProvider::new(settings)?;
    tracing::info!(
        provider = "ollama",
        model = %settings.model,
        base_url = %settings.base_url,
        "LLM provider configured"
    );
    Ok(BoxLlmProvider::new(provider))
}
