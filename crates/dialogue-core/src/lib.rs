//! Business logic and port trait definitions for the dialogue services.
//!
//! This crate defines the "ports" (sidecar and LLM traits) that the
//! infrastructure layer implements, and the logic built on them: the agent
//! registry, the conversation router and the response generator. It depends
//! only on `dialogue-types` -- never on `dialogue-infra` or any HTTP crate.

pub mod budget;
pub mod feed;
pub mod generator;
pub mod history;
pub mod llm;
pub mod prompt;
pub mod registry;
pub mod router;
pub mod sidecar;
