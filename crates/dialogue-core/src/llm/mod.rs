//! LLM provider abstractions.
//!
//! - `LlmProvider`: trait for concrete streaming backends
//! - `BoxLlmProvider`: object-safe wrapper for runtime provider selection

pub mod box_provider;
pub mod provider;

pub use box_provider::BoxLlmProvider;
pub use provider::{LlmProvider, LlmStream};
