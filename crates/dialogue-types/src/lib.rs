//! Shared domain types for the tea-party dialogue services.
//!
//! This crate contains the data shapes exchanged between the orchestrator,
//! the generator, the sidecar runtime and the language model: agents,
//! conversation messages, CloudEvent envelopes, configuration and errors.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod agent;
pub mod config;
pub mod conversation;
pub mod error;
pub mod event;
pub mod llm;
