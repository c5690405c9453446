//! Health and runtime-discovery endpoints.

use axum::Json;
use serde_json::{Value, json};

use dialogue_types::event::TopicSubscription;

pub async fn orchestrator_health() -> Json<Value> {
    Json(json!({"status": "ok", "service": "dialogue-orchestrator"}))
}

pub async fn generator_health() -> Json<Value> {
    Json(json!({"status": "ok", "service": "dialogue-generator"}))
}

/// `GET /dapr/config`: no actor or runtime configuration.
pub async fn runtime_config() -> Json<Value> {
    Json(json!({}))
}

/// `GET /dapr/subscribe` for apps that subscribe to nothing.
pub async fn no_subscriptions() -> Json<Vec<TopicSubscription>> {
    Json(Vec::new())
}
