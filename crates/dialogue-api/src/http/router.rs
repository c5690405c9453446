//! Axum routers with middleware (CORS, request tracing).

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::{GeneratorState, OrchestratorState, Sidecar};

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Router of the orchestrator service.
pub fn orchestrator_router<S: Sidecar>(state: OrchestratorState<S>) -> Router {
    Router::new()
        .route("/dapr/subscribe", get(handlers::pubsub::subscriptions::<S>))
        .route("/dapr/config", get(handlers::health::runtime_config))
        .route("/agents", post(handlers::pubsub::agents_event::<S>))
        .route("/conversations", post(handlers::pubsub::conversations_event::<S>))
        .route("/events", get(handlers::feed::conversation_feed::<S>))
        .route("/health", get(handlers::health::orchestrator_health))
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state)
}

/// Router of the generator service.
pub fn generator_router<S: Sidecar>(state: GeneratorState<S>) -> Router {
    Router::new()
        .route("/generate", post(handlers::generate::generate::<S>))
        .route("/dapr/subscribe", get(handlers::health::no_subscriptions))
        .route("/dapr/config", get(handlers::health::runtime_config))
        .route("/health", get(handlers::health::generator_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
