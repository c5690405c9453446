//! Conversation routing.
//!
//! Every conversation turn is answered by one randomly chosen live agent
//! other than its author. The router forwards the turn to the generator
//! service; the generator's own announcements keep the conversation going.

use tracing::{error, info};

use dialogue_types::agent::Agent;
use dialogue_types::conversation::{ConversationMessage, DialogueRequest, DialogueResponse};
use dialogue_types::error::SidecarError;

use crate::registry::AgentRegistry;
use crate::sidecar::{Invoker, StateStore};

/// Method invoked on the generator service.
pub const GENERATE_METHOD: &str = "generate";

/// What happened to a routed conversation turn.
#[derive(Debug)]
pub enum RouteOutcome {
    /// The turn was forwarded and the generator answered.
    Forwarded { agent: Agent, reply: String },
    /// No live agent other than the author exists.
    NoAgent,
    /// The generator could not be reached or refused the turn.
    Failed { agent: Agent, error: SidecarError },
}

/// Routes conversation turns to the generator service.
pub struct ConversationRouter<S: StateStore, I: Invoker> {
    registry: AgentRegistry<S>,
    invoker: I,
    generator_app_id: String,
}

impl<S: StateStore, I: Invoker> ConversationRouter<S, I> {
    pub fn new(registry: AgentRegistry<S>, invoker: I, generator_app_id: impl Into<String>) -> Self {
        Self {
            registry,
            invoker,
            generator_app_id: generator_app_id.into(),
        }
    }

    pub fn registry(&self) -> &AgentRegistry<S> {
        &self.registry
    }

    /// Forward `message` to a live agent other than its author.
    pub async fn route(&self, message: &ConversationMessage) -> RouteOutcome {
        info!(author = %message.name, "Received conversation message");

        let Some(agent) = self.registry.select_excluding(&message.name).await else {
            return RouteOutcome::NoAgent;
        };

        let request = DialogueRequest {
            agent: agent.clone(),
            message: message.message.clone(),
        };
        let payload = match serde_json::to_value(&request) {
            Ok(payload) => payload,
            Err(e) => {
                return RouteOutcome::Failed {
                    agent,
                    error: SidecarError::Encode(e.to_string()),
                };
            }
        };

        match self
            .invoker
            .invoke(&self.generator_app_id, GENERATE_METHOD, &payload)
            .await
        {
            Ok(body) => {
                let reply = reply_text(body);
                info!(agent = %agent.name, "Dialogue generator answered");
                RouteOutcome::Forwarded { agent, reply }
            }
            Err(e) => {
                error!(agent = %agent.name, app_id = %self.generator_app_id, "Failed to invoke dialogue generator: {e}");
                RouteOutcome::Failed { agent, error: e }
            }
        }
    }
}

/// The reply text of a generator response body; unrecognised bodies are
/// returned verbatim.
fn reply_text(body: String) -> String {
    match serde_json::from_str::<DialogueResponse>(&body) {
        Ok(response) => response.data,
        Err(_) => body,
    }
}
