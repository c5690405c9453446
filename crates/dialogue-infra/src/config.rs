//! Service configuration loader.
//!
//! Reads an optional TOML file into [`ServiceConfig`], falling back to
//! defaults when the file is missing or malformed, then applies environment
//! overrides. The override variable names match the ones the deployed
//! services already use.
//!
//! Configuration is loaded before the tracing subscriber exists (the
//! subscriber itself is configured from it), so problems are collected as
//! warnings and logged by the caller once tracing is up.

use std::path::Path;

use dialogue_types::config::ServiceConfig;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dialogue.toml";

/// A loaded configuration and the problems found while loading it.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: ServiceConfig,
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Emit every collected warning through `tracing`.
    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            tracing::warn!("{warning}");
        }
    }
}

/// Load configuration from `path` (or `./dialogue.toml`) and the process
/// environment.
pub async fn load_service_config(path: Option<&Path>) -> LoadedConfig {
    let path = path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
    let (mut config, file_warning) = read_config_file(path).await;
    let mut warnings: Vec<String> = file_warning.into_iter().collect();
    warnings.extend(apply_env_overrides(&mut config, |name| {
        std::env::var(name).ok()
    }));
    LoadedConfig { config, warnings }
}

/// Parse a TOML config file.
///
/// - Missing file: defaults.
/// - Unreadable or malformed file: defaults plus a warning.
pub async fn read_config_file(path: &Path) -> (ServiceConfig, Option<String>) {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return (ServiceConfig::default(), None);
        }
        Err(err) => {
            return (
                ServiceConfig::default(),
                Some(format!("Failed to read {}: {err}, using defaults", path.display())),
            );
        }
    };

    match toml::from_str::<ServiceConfig>(&content) {
        Ok(config) => (config, None),
        Err(err) => (
            ServiceConfig::default(),
            Some(format!("Failed to parse {}: {err}, using defaults", path.display())),
        ),
    }
}

/// Apply environment overrides through `lookup`, returning a warning for
/// each value that could not be used.
///
/// `DAPR_HTTP_ENDPOINT` wins over `DAPR_HTTP_PORT`. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let mut warnings = Vec::new();

    if let Some(v) = var("DAPR_STATE_STORE") {
        config.runtime.state_store = v;
    }
    if let Some(v) = var("DAPR_PUBSUB_NAME") {
        config.runtime.pubsub = v;
    }
    if let Some(v) = var("DAPR_AGENTS_TOPIC") {
        config.runtime.agents_topic = v;
    }
    if let Some(v) = var("DAPR_CONVERSATIONS_TOPIC") {
        config.runtime.conversations_topic = v;
    }
    if let Some(v) = var("DIALOGUE_GENERATOR_APP_ID") {
        config.runtime.generator_app_id = v;
    }

    if let Some(endpoint) = var("DAPR_HTTP_ENDPOINT") {
        config.sidecar.http_endpoint = endpoint;
    } else if let Some(port) = var("DAPR_HTTP_PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => config.sidecar.http_endpoint = format!("http://localhost:{port}"),
            Err(_) => warnings.push(format!("Ignoring invalid DAPR_HTTP_PORT value '{port}'")),
        }
    }
    if let Some(token) = var("DAPR_API_TOKEN") {
        config.sidecar.api_token = Some(token);
    }

    if let Some(v) = var("OLLAMA_LLM_NAME") {
        config.llm.model = v;
    }
    if let Some(v) = var("OLLAMA_LLM_URL") {
        config.llm.base_url = v;
    }

    if let Some(v) = var("DIALOGUE_OTEL") {
        config.observability.otel = matches!(v.trim(), "1" | "true" | "yes");
    }

    warnings
}
