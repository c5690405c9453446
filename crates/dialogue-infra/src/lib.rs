//! Infrastructure layer for the dialogue services.
//!
//! Implements the ports defined in `dialogue-core`: the sidecar HTTP client
//! (state, pub/sub, invocation) and the Ollama streaming provider. Also
//! loads `ServiceConfig` from TOML and the environment.

pub mod config;
pub mod dapr;
pub mod llm;
