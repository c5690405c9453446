//! Agent registry backed by the sidecar state store.
//!
//! Each live agent is stored under `dialogue-orchestrator:agent_<id>`, and the
//! set of live record keys is kept in a separate tracked key list under
//! `agent_keys`. An agent stays registered while its tea budget is above
//! zero; an update that drains the budget deletes the record and untracks it.
//!
//! With `atomic_writes` the record write and the key-list write go out as a
//! single state transaction. Without it they are two independent writes, and
//! a crash between them leaves the two out of step. The key list itself is a
//! read-modify-write with no concurrency token; concurrent updates can lose a
//! key, which is acceptable for a single conversation at a time.

use rand::Rng;
use tracing::{debug, error, info, warn};

use dialogue_types::agent::Agent;
use dialogue_types::error::RegistryError;

use crate::sidecar::{StateOperation, StateStore, decode_state};

/// State key of the tracked key list.
pub const AGENT_KEYS: &str = "agent_keys";

/// Prefix of per-agent record keys.
pub const AGENT_KEY_PREFIX: &str = "dialogue-orchestrator:agent_";

/// State key of an agent record.
pub fn agent_key(id: &str) -> String {
    format!("{AGENT_KEY_PREFIX}{id}")
}

/// What an update did to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryChange {
    /// The record was written and its key is tracked.
    Upserted,
    /// The record was deleted and its key untracked.
    Retired,
    /// Nothing was written.
    Unchanged,
}

/// Registry of live agents.
pub struct AgentRegistry<S: StateStore> {
    store: S,
    atomic_writes: bool,
}

impl<S: StateStore> AgentRegistry<S> {
    pub fn new(store: S, atomic_writes: bool) -> Self {
        Self {
            store,
            atomic_writes,
        }
    }

    /// Write an empty tracked key list if none exists yet.
    ///
    /// Returns true when the list was created.
    pub async fn ensure_initialized(&self) -> Result<bool, RegistryError> {
        if self.store.get(AGENT_KEYS).await?.is_some() {
            return Ok(false);
        }
        self.store
            .save(AGENT_KEYS, &serde_json::Value::Array(Vec::new()))
            .await?;
        info!("Initialized agent key tracking list");
        Ok(true)
    }

    /// The tracked record keys. A missing list is empty.
    pub async fn tracked_keys(&self) -> Result<Vec<String>, RegistryError> {
        match self.store.get(AGENT_KEYS).await? {
            Some(value) => Ok(decode_state(AGENT_KEYS, value)?),
            None => Ok(Vec::new()),
        }
    }

    /// Apply an agent update from the agents topic.
    pub async fn apply(&self, agent: &Agent) -> Result<RegistryChange, RegistryError> {
        if agent.is_alive() {
            self.upsert(agent).await
        } else {
            self.retire(agent).await
        }
    }

    /// Store an agent with tea left and track its key.
    ///
    /// An agent whose budget is already zero is retired instead.
    pub async fn upsert(&self, agent: &Agent) -> Result<RegistryChange, RegistryError> {
        if agent.id.is_empty() {
            return Err(RegistryError::MissingId(agent.name.clone()));
        }
        if !agent.is_alive() {
            return self.retire(agent).await;
        }

        let key = agent_key(&agent.id);
        let record = serde_json::to_value(agent)
            .map_err(|e| dialogue_types::error::SidecarError::Encode(e.to_string()))?;

        let mut keys = self.tracked_keys().await?;
        let newly_tracked = !keys.contains(&key);
        if newly_tracked {
            keys.push(key.clone());
        }

        let mut ops = vec![StateOperation::Upsert {
            key: key.clone(),
            value: record,
        }];
        if newly_tracked {
            ops.push(keys_operation(keys));
        }
        self.write(ops).await?;

        if newly_tracked {
            debug!(key = %key, "Added key to tracking list");
        }
        info!(agent = %agent.name, key = %key, tea_ml = agent.tea_amount_ml, "Agent saved to state");
        Ok(RegistryChange::Upserted)
    }

    /// Remove an agent whose tea has run out and untrack its key.
    ///
    /// A retire request for an agent that still has tea is ignored.
    pub async fn retire(&self, agent: &Agent) -> Result<RegistryChange, RegistryError> {
        if agent.id.is_empty() {
            return Err(RegistryError::MissingId(agent.name.clone()));
        }
        if agent.is_alive() {
            warn!(
                agent = %agent.name,
                tea_ml = agent.tea_amount_ml,
                "Ignoring retire request for agent with tea left"
            );
            return Ok(RegistryChange::Unchanged);
        }

        let key = agent_key(&agent.id);
        let mut keys = self.tracked_keys().await?;
        let was_tracked = keys.contains(&key);
        keys.retain(|k| k != &key);

        let mut ops = vec![StateOperation::Delete { key: key.clone() }];
        if was_tracked {
            ops.push(keys_operation(keys));
        }
        self.write(ops).await?;

        info!(agent = %agent.name, key = %key, "Agent removed from state due to zero tea amount");
        Ok(RegistryChange::Retired)
    }

    /// Every live agent behind the tracked keys.
    ///
    /// Missing records, records that fail to load or decode, and records
    /// without tea are skipped individually.
    pub async fn live_agents(&self) -> Result<Vec<Agent>, RegistryError> {
        let keys = self.tracked_keys().await?;
        let mut agents = Vec::with_capacity(keys.len());

        for key in &keys {
            let value = match self.store.get(key).await {
                Ok(Some(value)) => value,
                Ok(None) => {
                    debug!(key = %key, "Tracked agent record is missing");
                    continue;
                }
                Err(e) => {
                    warn!(key = %key, "Failed to load agent record: {e}");
                    continue;
                }
            };
            match decode_state::<Agent>(key, value) {
                Ok(agent) if agent.is_alive() => agents.push(agent),
                Ok(agent) => debug!(agent = %agent.name, "Skipping tracked agent without tea"),
                Err(e) => error!("Failed to decode agent data for key {key}: {e}"),
            }
        }

        Ok(agents)
    }

    /// Pick a random live agent not named `exclude`.
    ///
    /// Registry failures are logged and treated as an empty registry.
    pub async fn select_excluding(&self, exclude: &str) -> Option<Agent> {
        let agents = match self.live_agents().await {
            Ok(agents) => agents,
            Err(e) => {
                error!("Failed to load agent registry: {e}");
                return None;
            }
        };

        let chosen = choose_excluding(agents, exclude, &mut rand::rng());
        match &chosen {
            Some(agent) => info!(agent = %agent.name, "Selected agent for response"),
            None => info!(excluded = %exclude, "No valid agents available"),
        }
        chosen
    }

    async fn write(&self, ops: Vec<StateOperation>) -> Result<(), RegistryError> {
        if self.atomic_writes {
            self.store.transact(&ops).await?;
            return Ok(());
        }
        for op in &ops {
            match op {
                StateOperation::Upsert { key, value } => self.store.save(key, value).await?,
                StateOperation::Delete { key } => self.store.delete(key).await?,
            }
        }
        Ok(())
    }
}

fn keys_operation(keys: Vec<String>) -> StateOperation {
    StateOperation::Upsert {
        key: AGENT_KEYS.to_string(),
        value: serde_json::Value::Array(keys.into_iter().map(serde_json::Value::String).collect()),
    }
}

/// Uniformly pick one candidate whose name differs from `exclude`.
pub fn choose_excluding<R: Rng + ?Sized>(
    candidates: Vec<Agent>,
    exclude: &str,
    rng: &mut R,
) -> Option<Agent> {
    let mut eligible: Vec<Agent> = candidates
        .into_iter()
        .filter(|agent| agent.name != exclude)
        .collect();
    if eligible.is_empty() {
        return None;
    }
    let index = rng.random_range(0..eligible.len());
    Some(eligible.swap_remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sidecar::memory::InMemorySidecar;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn agent(id: &str, name: &str, tea: u32) -> Agent {
        Agent {
            id: id.to_string(),
            name: name.to_string(),
            description: format!("{name} likes tea"),
            tea_amount_ml: tea,
        }
    }

    fn registry(atomic: bool) -> (InMemorySidecar, AgentRegistry<InMemorySidecar>) {
        let sidecar = InMemorySidecar::new();
        (sidecar.clone(), AgentRegistry::new(sidecar, atomic))
    }

    #[tokio::test]
    async fn ensure_initialized_writes_empty_list_once() {
        let (sidecar, registry) = registry(true);
        assert!(registry.ensure_initialized().await.unwrap());
        assert_eq!(sidecar.value(AGENT_KEYS), Some(serde_json::json!([])));
        assert!(!registry.ensure_initialized().await.unwrap());
    }

    #[tokio::test]
    async fn upsert_writes_record_and_tracks_key() {
        let (sidecar, registry) = registry(true);
        let ada = agent("1", "Ada", 50);

        let change = registry.upsert(&ada).await.unwrap();
        assert_eq!(change, RegistryChange::Upserted);

        let stored = sidecar.value("dialogue-orchestrator:agent_1").unwrap();
        assert_eq!(stored["tea_amount_ml"], 50);
        assert_eq!(
            registry.tracked_keys().await.unwrap(),
            vec!["dialogue-orchestrator:agent_1"]
        );
        assert_eq!(sidecar.transaction_count(), 1);
    }

    #[tokio::test]
    async fn upsert_twice_tracks_key_once() {
        let (_sidecar, registry) = registry(true);
        registry.upsert(&agent("1", "Ada", 50)).await.unwrap();
        registry.upsert(&agent("1", "Ada", 40)).await.unwrap();
        assert_eq!(registry.tracked_keys().await.unwrap().len(), 1);
        let agents = registry.live_agents().await.unwrap();
        assert_eq!(agents[0].tea_amount_ml, 40);
    }

    #[tokio::test]
    async fn apply_with_zero_budget_retires() {
        let (sidecar, registry) = registry(true);
        registry.apply(&agent("1", "Ada", 50)).await.unwrap();
        registry.apply(&agent("2", "Bo", 50)).await.unwrap();

        let change = registry.apply(&agent("1", "Ada", 0)).await.unwrap();
        assert_eq!(change, RegistryChange::Retired);
        assert!(sidecar.value("dialogue-orchestrator:agent_1").is_none());
        assert_eq!(
            registry.tracked_keys().await.unwrap(),
            vec!["dialogue-orchestrator:agent_2"]
        );
    }

    #[tokio::test]
    async fn retire_with_tea_left_is_ignored() {
        let (_sidecar, registry) = registry(true);
        registry.upsert(&agent("1", "Ada", 50)).await.unwrap();
        let change = registry.retire(&agent("1", "Ada", 10)).await.unwrap();
        assert_eq!(change, RegistryChange::Unchanged);
        assert_eq!(registry.live_agents().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upsert_rejects_empty_id() {
        let (_sidecar, registry) = registry(true);
        let err = registry.upsert(&agent("", "Ghost", 5)).await.unwrap_err();
        assert!(matches!(err, RegistryError::MissingId(name) if name == "Ghost"));
    }

    #[tokio::test]
    async fn dual_write_mode_skips_transactions() {
        let (sidecar, registry) = registry(false);
        sidecar.disable_transactions(true);

        registry.upsert(&agent("1", "Ada", 5)).await.unwrap();
        registry.apply(&agent("1", "Ada", 0)).await.unwrap();

        assert_eq!(sidecar.transaction_count(), 0);
        assert!(registry.tracked_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn atomic_mode_surfaces_transaction_failure() {
        let (sidecar, registry) = registry(true);
        sidecar.disable_transactions(true);
        assert!(registry.upsert(&agent("1", "Ada", 5)).await.is_err());
        assert!(sidecar.value("dialogue-orchestrator:agent_1").is_none());
    }

    #[tokio::test]
    async fn live_agents_skips_malformed_and_missing_records() {
        let (sidecar, registry) = registry(true);
        registry.upsert(&agent("1", "Ada", 5)).await.unwrap();
        sidecar.put(
            AGENT_KEYS,
            serde_json::json!([
                "dialogue-orchestrator:agent_1",
                "dialogue-orchestrator:agent_bad",
                "dialogue-orchestrator:agent_gone"
            ]),
        );
        sidecar.put("dialogue-orchestrator:agent_bad", serde_json::json!({"name": 7}));

        let agents = registry.live_agents().await.unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].name, "Ada");
    }

    #[tokio::test]
    async fn live_agents_reads_string_encoded_state() {
        let (sidecar, registry) = registry(true);
        sidecar.put(
            AGENT_KEYS,
            serde_json::Value::String(r#"["dialogue-orchestrator:agent_9"]"#.to_string()),
        );
        sidecar.put(
            "dialogue-orchestrator:agent_9",
            serde_json::Value::String(
                r#"{"id":"9","name":"Py","description":"d","tea_amount_ml":3}"#.to_string(),
            ),
        );
        let agents = registry.live_agents().await.unwrap();
        assert_eq!(agents[0].name, "Py");
    }

    #[tokio::test]
    async fn select_excluding_never_returns_author() {
        let (_sidecar, registry) = registry(true);
        registry.upsert(&agent("1", "Ada", 5)).await.unwrap();
        registry.upsert(&agent("2", "Bo", 5)).await.unwrap();

        for _ in 0..50 {
            let chosen = registry.select_excluding("Ada").await.unwrap();
            assert_eq!(chosen.name, "Bo");
        }
    }

    #[tokio::test]
    async fn select_excluding_skips_drained_agents() {
        let (_sidecar, registry) = registry(true);
        registry.upsert(&agent("1", "Ada", 5)).await.unwrap();
        registry.upsert(&agent("2", "Bo", 5)).await.unwrap();
        registry.apply(&agent("2", "Bo", 0)).await.unwrap();

        for _ in 0..20 {
            assert_eq!(registry.select_excluding("God").await.unwrap().name, "Ada");
        }
        assert!(registry.select_excluding("Ada").await.is_none());
    }

    #[tokio::test]
    async fn select_excluding_treats_store_failure_as_empty() {
        let (sidecar, registry) = registry(true);
        registry.upsert(&agent("1", "Ada", 5)).await.unwrap();
        sidecar.fail_state(true);
        assert!(registry.select_excluding("God").await.is_none());
    }

    #[tokio::test]
    async fn select_excluding_on_empty_registry() {
        let (_sidecar, registry) = registry(true);
        assert!(registry.select_excluding("God").await.is_none());
    }

    #[test]
    fn choose_excluding_reaches_every_candidate() {
        let candidates = vec![
            agent("1", "Ada", 1),
            agent("2", "Bo", 1),
            agent("3", "Cy", 1),
            agent("4", "God", 1),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let chosen = choose_excluding(candidates.clone(), "God", &mut rng).unwrap();
            assert_ne!(chosen.name, "God");
            seen.insert(chosen.name);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn choose_excluding_only_author_left() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(choose_excluding(vec![agent("1", "Ada", 1)], "Ada", &mut rng).is_none());
        assert!(choose_excluding(Vec::new(), "Ada", &mut rng).is_none());
    }
}
