//! Service configuration types.
//!
//! `ServiceConfig` is the top-level `dialogue.toml` shared by both services
//! and the operator CLI. Every field has a default matching the demo
//! deployment, so an empty file (or no file) is a valid configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub sidecar: SidecarSettings,
    #[serde(default)]
    pub runtime: RuntimeSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub registry: RegistrySettings,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub observability: ObservabilitySettings,
}

/// How to reach the sidecar's HTTP API.
#[derive(Clone, Serialize, Deserialize)]
pub struct SidecarSettings {
    #[serde(default = "default_http_endpoint")]
    pub http_endpoint: String,
    /// Value for the `dapr-api-token` header, when the sidecar requires one.
    #[serde(default, skip_serializing)]
    pub api_token: Option<String>,
    #[serde(default = "default_sidecar_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_http_endpoint() -> String {
    "http://localhost:3500".to_string()
}

fn default_sidecar_timeout_secs() -> u64 {
    60
}

impl Default for SidecarSettings {
    fn default() -> Self {
        Self {
            http_endpoint: default_http_endpoint(),
            api_token: None,
            timeout_secs: default_sidecar_timeout_secs(),
        }
    }
}

impl fmt::Debug for SidecarSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SidecarSettings")
            .field("http_endpoint", &self.http_endpoint)
            .field("api_token", &self.api_token.as_ref().map(|_| "****"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Names of the runtime components and topics the services use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeSettings {
    #[serde(default = "default_state_store")]
    pub state_store: String,
    #[serde(default = "default_pubsub")]
    pub pubsub: String,
    #[serde(default = "default_agents_topic")]
    pub agents_topic: String,
    #[serde(default = "default_conversations_topic")]
    pub conversations_topic: String,
    /// App id of the generator service for service invocation.
    #[serde(default = "default_generator_app_id")]
    pub generator_app_id: String,
}

fn default_state_store() -> String {
    "statestore".to_string()
}

fn default_pubsub() -> String {
    "pubsub".to_string()
}

fn default_agents_topic() -> String {
    "agents".to_string()
}

fn default_conversations_topic() -> String {
    "conversations".to_string()
}

fn default_generator_app_id() -> String {
    "dialogue-generator".to_string()
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            state_store: default_state_store(),
            pubsub: default_pubsub(),
            agents_topic: default_agents_topic(),
            conversations_topic: default_conversations_topic(),
            generator_app_id: default_generator_app_id(),
        }
    }
}

/// Language model endpoint used by the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_model() -> String {
    "llama3".to_string()
}

fn default_llm_base_url() -> String {
    "http://ollama.zuru.local:11434".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    300
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            base_url: default_llm_base_url(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

/// Agent registry write behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Write the agent record and the tracked key list in one state
    /// transaction. Disable for state stores without transaction support.
    #[serde(default = "default_atomic_writes")]
    pub atomic_writes: bool,
}

fn default_atomic_writes() -> bool {
    true
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            atomic_writes: default_atomic_writes(),
        }
    }
}

/// Shared conversation history settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySettings {
    /// Number of trailing history entries fed into the prompt.
    #[serde(default = "default_history_window")]
    pub window: usize,
}

fn default_history_window() -> usize {
    12
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            window: default_history_window(),
        }
    }
}

/// Tracing export settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilitySettings {
    /// Bridge spans to OpenTelemetry (stdout exporter).
    #[serde(default)]
    pub otel: bool,
}
