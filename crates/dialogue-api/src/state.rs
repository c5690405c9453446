//! Service state wiring.
//!
//! Both services are generic over a [`Sidecar`] so handlers can be exercised
//! against the in-memory double; `init` pins them to [`DaprClient`].

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use dialogue_core::feed::ConversationFeed;
use dialogue_core::generator::{DialogueGenerator, GeneratorTopics};
use dialogue_core::llm::BoxLlmProvider;
use dialogue_core::registry::AgentRegistry;
use dialogue_core::router::ConversationRouter;
use dialogue_core::sidecar::{Invoker, Publisher, StateStore};
use dialogue_infra::dapr::DaprClient;
use dialogue_infra::llm::create_provider;
use dialogue_types::config::{RuntimeSettings, ServiceConfig};

/// Everything a service needs from the sidecar.
pub trait Sidecar: StateStore + Publisher + Invoker + Clone + 'static {}

impl<T> Sidecar for T where T: StateStore + Publisher + Invoker + Clone + 'static {}

/// State of the orchestrator service.
#[derive(Clone)]
pub struct OrchestratorState<S: Sidecar> {
    pub router: Arc<ConversationRouter<S, S>>,
    pub feed: ConversationFeed,
    pub runtime: RuntimeSettings,
    /// Cancelled when the server begins shutting down; ends open feed streams.
    pub shutdown: CancellationToken,
}

impl<S: Sidecar> OrchestratorState<S> {
    pub fn new(sidecar: S, config: &ServiceConfig) -> Self {
        let registry = AgentRegistry::new(sidecar.clone(), config.registry.atomic_writes);
        let router = ConversationRouter::new(
            registry,
            sidecar,
            config.runtime.generator_app_id.clone(),
        );
        Self {
            router: Arc::new(router),
            feed: ConversationFeed::default(),
            runtime: config.runtime.clone(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn registry(&self) -> &AgentRegistry<S> {
        self.router.registry()
    }
}

/// Build the sidecar client and report whether the sidecar answers.
///
/// An unreachable sidecar is not fatal: it may come up after the app.
async fn connect_sidecar(config: &ServiceConfig) -> anyhow::Result<DaprClient> {
    let sidecar = DaprClient::new(&config.sidecar, &config.runtime)?;
    match sidecar.health().await {
        Ok(()) => tracing::info!(endpoint = sidecar.base_url(), "Sidecar is healthy"),
        Err(e) => tracing::warn!(endpoint = sidecar.base_url(), "Sidecar health check failed: {e}"),
    }
    Ok(sidecar)
}

impl OrchestratorState<DaprClient> {
    /// Connect to the sidecar and make sure the key tracking list exists.
    pub async fn init(config: &ServiceConfig) -> anyhow::Result<Self> {
        let sidecar = connect_sidecar(config).await?;
        let state = Self::new(sidecar, config);
        if let Err(e) = state.registry().ensure_initialized().await {
            tracing::warn!("Could not initialize agent key tracking list: {e}");
        }
        Ok(state)
    }
}

/// State of the generator service.
#[derive(Clone)]
pub struct GeneratorState<S: Sidecar> {
    pub generator: Arc<DialogueGenerator<S, S>>,
}

impl<S: Sidecar> GeneratorState<S> {
    pub fn new(sidecar: S, provider: BoxLlmProvider, config: &ServiceConfig) -> Self {
        let generator = DialogueGenerator::new(sidecar.clone(), sidecar, provider)
            .with_topics(GeneratorTopics {
                agents: config.runtime.agents_topic.clone(),
                conversations: config.runtime.conversations_topic.clone(),
            })
            .with_window(config.history.window)
            .with_model(config.llm.model.clone());
        Self {
            generator: Arc::new(generator),
        }
    }
}

impl GeneratorState<DaprClient> {
    pub async fn init(config: &ServiceConfig) -> anyhow::Result<Self> {
        let sidecar = connect_sidecar(config).await?;
        let provider = create_provider(&config.llm)?;
        Ok(Self::new(sidecar, provider, config))
    }
}
