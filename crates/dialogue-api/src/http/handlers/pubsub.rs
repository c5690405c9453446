//! Pub/sub subscriber endpoints of the orchestrator.
//!
//! The sidecar discovers the subscriptions through `GET /dapr/subscribe` and
//! then POSTs CloudEvents to the declared routes. Store and routing failures
//! are logged and acknowledged; only an undecodable event is dropped.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde::de::DeserializeOwned;
use tracing::{Instrument, error, info, info_span, warn};

use dialogue_core::registry::RegistryChange;
use dialogue_core::router::RouteOutcome;
use dialogue_observe::genai_attrs::{GEN_AI_OPERATION_NAME, OP_ROUTE_TURN};
use dialogue_types::agent::Agent;
use dialogue_types::conversation::{ConversationMessage, FeedEvent};
use dialogue_types::event::{CloudEvent, SubscriptionReply, SubscriptionStatus, TopicSubscription};

use crate::state::{OrchestratorState, Sidecar};

/// Route receiving agent updates.
pub const AGENTS_ROUTE: &str = "/agents";

/// Route receiving conversation turns.
pub const CONVERSATIONS_ROUTE: &str = "/conversations";

/// `GET /dapr/subscribe`
pub async fn subscriptions<S: Sidecar>(
    State(state): State<OrchestratorState<S>>,
) -> Json<Vec<TopicSubscription>> {
    let runtime = &state.runtime;
    Json(vec![
        TopicSubscription {
            pubsubname: runtime.pubsub.clone(),
            topic: runtime.agents_topic.clone(),
            route: AGENTS_ROUTE.to_string(),
        },
        TopicSubscription {
            pubsubname: runtime.pubsub.clone(),
            topic: runtime.conversations_topic.clone(),
            route: CONVERSATIONS_ROUTE.to_string(),
        },
    ])
}

/// Decode the payload of a delivered event body.
fn decode_event<T: DeserializeOwned>(body: &[u8]) -> Result<T, String> {
    let event: CloudEvent = serde_json::from_slice(body).map_err(|e| e.to_string())?;
    event.decode_data().map_err(|e| e.to_string())
}

fn reply(status: SubscriptionStatus) -> Json<SubscriptionReply> {
    Json(status.into())
}

/// `POST /agents`
pub async fn agents_event<S: Sidecar>(
    State(state): State<OrchestratorState<S>>,
    body: Bytes,
) -> Json<SubscriptionReply> {
    let agent: Agent = match decode_event(&body) {
        Ok(agent) => agent,
        Err(e) => {
            warn!("Dropping undecodable agent event: {e}");
            return reply(SubscriptionStatus::Drop);
        }
    };

    match state.registry().apply(&agent).await {
        Ok(RegistryChange::Upserted) | Ok(RegistryChange::Retired) => {}
        Ok(RegistryChange::Unchanged) => info!(agent = %agent.name, "Agent event left registry unchanged"),
        Err(e) => error!(agent = %agent.name, "Failed to update agent registry: {e}"),
    }
    reply(SubscriptionStatus::Success)
}

/// `POST /conversations`
pub async fn conversations_event<S: Sidecar>(
    State(state): State<OrchestratorState<S>>,
    body: Bytes,
) -> Json<SubscriptionReply> {
    let message: ConversationMessage = match decode_event(&body) {
        Ok(message) => message,
        Err(e) => {
            error!("Dropping conversation event without name/message: {e}");
            return reply(SubscriptionStatus::Drop);
        }
    };

    state.feed.publish(FeedEvent::now(&message));

    let span = info_span!(
        "route_turn",
        { GEN_AI_OPERATION_NAME } = OP_ROUTE_TURN,
        author = %message.name,
    );
    match state.router.route(&message).instrument(span).await {
        RouteOutcome::Forwarded { agent, reply } => {
            info!(agent = %agent.name, "Response from dialogue generator: {reply}");
        }
        RouteOutcome::NoAgent => info!("No agent selected"),
        RouteOutcome::Failed { agent, error } => {
            warn!(agent = %agent.name, "Conversation turn was not answered: {error}");
        }
    }
    reply(SubscriptionStatus::Success)
}
