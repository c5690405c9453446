//! Response generation for a routed conversation turn.
//!
//! The generator renders a prompt from the agent description and the
//! trailing shared history, streams a completion, charges the agent's tea
//! budget for the output and announces both the updated agent and the reply.
//! Announcements and the history append are best effort: their failures are
//! logged and the reply is still returned. A completion failure aborts the
//! turn before anything is published or stored.

use futures_util::StreamExt;
use tracing::{Instrument, debug, error, info, info_span, warn};

use dialogue_types::agent::Agent;
use dialogue_types::conversation::{
    ConversationMessage, DialogueRequest, DialogueResponse, HistoryEntry,
};
use dialogue_types::llm::{CompletionRequest, LlmError, StreamEvent};

use crate::budget::{TokenTally, remaining_tea};
use crate::history::{ConversationHistory, DEFAULT_WINDOW};
use crate::llm::BoxLlmProvider;
use crate::prompt::render_prompt;
use crate::sidecar::{Publisher, StateStore};

/// Topics the generator announces on.
#[derive(Debug, Clone)]
pub struct GeneratorTopics {
    pub agents: String,
    pub conversations: String,
}

impl Default for GeneratorTopics {
    fn default() -> Self {
        Self {
            agents: "agents".to_string(),
            conversations: "conversations".to_string(),
        }
    }
}

/// Result of one generation turn.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub response: DialogueResponse,
    /// The agent after its budget was charged.
    pub agent: Agent,
    /// Approximate output token count.
    pub token_count: u64,
}

/// Produces agent replies and publishes their side effects.
pub struct DialogueGenerator<S: StateStore, P: Publisher> {
    history: ConversationHistory<S>,
    publisher: P,
    provider: BoxLlmProvider,
    topics: GeneratorTopics,
    window: usize,
    model: String,
}

impl<S: StateStore, P: Publisher> DialogueGenerator<S, P> {
    pub fn new(store: S, publisher: P, provider: BoxLlmProvider) -> Self {
        Self {
            history: ConversationHistory::new(store),
            publisher,
            provider,
            topics: GeneratorTopics::default(),
            window: DEFAULT_WINDOW,
            model: String::new(),
        }
    }

    pub fn with_topics(mut self, topics: GeneratorTopics) -> Self {
        self.topics = topics;
        self
    }

    /// Number of trailing history entries used as context.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Model requested from the provider; empty uses its default.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Generate one reply for `request.agent`.
    pub async fn generate(&self, request: DialogueRequest) -> Result<GenerationOutcome, LlmError> {
        let context = self.history.recent(self.window).await;
        let prompt = render_prompt(&request.agent.description, &context);

        let model = if self.model.is_empty() {
            self.provider.default_model().to_string()
        } else {
            self.model.clone()
        };
        let completion = CompletionRequest {
            model,
            prompt,
        };

        let span = info_span!(
            "gen_ai.generate",
            gen_ai.provider.name = self.provider.name(),
            gen_ai.request.model = %completion.model,
            gen_ai.request.stream = true,
        );
        let tally = self.complete(completion).instrument(span).await?;

        let token_count = tally.tokens();
        let text = tally.into_text();
        let agent = request
            .agent
            .with_tea(remaining_tea(request.agent.tea_amount_ml, token_count));
        info!(
            agent = %agent.name,
            tokens = token_count,
            tea_before = request.agent.tea_amount_ml,
            tea_after = agent.tea_amount_ml,
            "Generated reply"
        );

        self.announce(&agent, &text).await;

        let entry = HistoryEntry::from(DialogueRequest {
            agent: agent.clone(),
            message: request.message,
        });
        match self.history.append(&entry).await {
            Ok(()) => debug!("Saved updated conversations to shared history"),
            Err(e) => error!("Failed to save conversation history: {e}"),
        }

        Ok(GenerationOutcome {
            response: DialogueResponse::text(text),
            agent,
            token_count,
        })
    }

    async fn complete(&self, request: CompletionRequest) -> Result<TokenTally, LlmError> {
        let mut stream = self.provider.stream(request);
        let mut tally = TokenTally::new();
        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::TextDelta { text } => tally.push(&text),
                StreamEvent::Usage(usage) => debug!(
                    provider_output_tokens = usage.output_tokens,
                    provider_input_tokens = usage.input_tokens,
                    "Provider reported usage"
                ),
                StreamEvent::Done => break,
                StreamEvent::Connected => {}
            }
        }
        Ok(tally)
    }

    /// Publish the updated agent, then the reply.
    async fn announce(&self, agent: &Agent, text: &str) {
        match serde_json::to_value(agent) {
            Ok(payload) => {
                info!(topic = %self.topics.agents, "Publishing updated agent info");
                if let Err(e) = self.publisher.publish(&self.topics.agents, &payload).await {
                    warn!(topic = %self.topics.agents, "Failed to publish agent update: {e}");
                }
            }
            Err(e) => warn!("Failed to encode agent update: {e}"),
        }

        let reply = ConversationMessage {
            name: agent.name.clone(),
            message: text.to_string(),
        };
        match serde_json::to_value(&reply) {
            Ok(payload) => {
                info!(topic = %self.topics.conversations, "Publishing generated message");
                if let Err(e) = self
                    .publisher
                    .publish(&self.topics.conversations, &payload)
                    .await
                {
                    warn!(topic = %self.topics.conversations, "Failed to publish generated message: {e}");
                }
            }
            Err(e) => warn!("Failed to encode generated message: {e}"),
        }
    }
}
