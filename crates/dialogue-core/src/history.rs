//! Shared conversation history.
//!
//! The history is a single JSON array stored under one state key and shared
//! by every agent. Only the generator writes it, appending the request it
//! has just answered; readers use a trailing window of it as prompt context.

use tracing::{debug, warn};

use dialogue_types::conversation::HistoryEntry;
use dialogue_types::error::SidecarError;

use crate::sidecar::{StateStore, decode_state};

/// State key of the shared history array.
pub const SHARED_HISTORY_KEY: &str = "shared_events_chat";

/// Number of trailing entries used as prompt context.
pub const DEFAULT_WINDOW: usize = 12;

/// Read/append access to the shared history array.
pub struct ConversationHistory<S: StateStore> {
    store: S,
}

impl<S: StateStore> ConversationHistory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Raw history elements. A missing key is an empty history.
    async fn raw(&self) -> Result<Vec<serde_json::Value>, SidecarError> {
        match self.store.get(SHARED_HISTORY_KEY).await? {
            Some(value) => decode_state(SHARED_HISTORY_KEY, value),
            None => Ok(Vec::new()),
        }
    }

    /// Every well-formed entry, oldest first.
    ///
    /// Elements that do not decode as an entry are skipped.
    pub async fn load(&self) -> Result<Vec<HistoryEntry>, SidecarError> {
        let raw = self.raw().await?;
        let total = raw.len();
        let entries: Vec<HistoryEntry> = raw
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect();
        if entries.len() < total {
            warn!(
                skipped = total - entries.len(),
                "Skipped malformed conversation history entries"
            );
        }
        Ok(entries)
    }

    /// The last `window` entries, oldest first.
    ///
    /// An unreadable history is logged and treated as empty so generation
    /// can still proceed without context.
    pub async fn recent(&self, window: usize) -> Vec<HistoryEntry> {
        match self.load().await {
            Ok(mut entries) => {
                let start = entries.len().saturating_sub(window);
                let recent = entries.split_off(start);
                debug!(entries = recent.len(), "Loaded conversation context");
                recent
            }
            Err(e) => {
                warn!("Failed to load conversation history: {e}");
                Vec::new()
            }
        }
    }

    /// Append one entry, leaving existing elements untouched.
    pub async fn append(&self, entry: &HistoryEntry) -> Result<(), SidecarError> {
        let mut raw = self.raw().await?;
        let value =
            serde_json::to_value(entry).map_err(|e| SidecarError::Encode(e.to_string()))?;
        raw.push(value);
        self.store
            .save(SHARED_HISTORY_KEY, &serde_json::Value::Array(raw))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sidecar::memory::InMemorySidecar;
    use serde_json::json;

    fn entry(message: &str) -> HistoryEntry {
        HistoryEntry {
            agent: None,
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn missing_history_is_empty() {
        let history = ConversationHistory::new(InMemorySidecar::new());
        assert!(history.load().await.unwrap().is_empty());
        assert!(history.recent(DEFAULT_WINDOW).await.is_empty());
    }

    #[tokio::test]
    async fn append_then_load_preserves_order() {
        let sidecar = InMemorySidecar::new();
        let history = ConversationHistory::new(sidecar.clone());
        history.append(&entry("first")).await.unwrap();
        history.append(&entry("second")).await.unwrap();

        let messages: Vec<String> = history
            .load()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(messages, vec!["first", "second"]);
        assert_eq!(sidecar.value(SHARED_HISTORY_KEY).unwrap().as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn recent_keeps_trailing_window() {
        let history = ConversationHistory::new(InMemorySidecar::new());
        for i in 0..30 {
            history.append(&entry(&format!("m{i}"))).await.unwrap();
        }
        let recent = history.recent(DEFAULT_WINDOW).await;
        assert_eq!(recent.len(), 12);
        assert_eq!(recent.first().unwrap().message, "m18");
        assert_eq!(recent.last().unwrap().message, "m29");
    }

    #[tokio::test]
    async fn recent_with_short_history_returns_all() {
        let history = ConversationHistory::new(InMemorySidecar::new());
        history.append(&entry("only")).await.unwrap();
        assert_eq!(history.recent(DEFAULT_WINDOW).await.len(), 1);
    }

    #[tokio::test]
    async fn malformed_entries_are_skipped_but_kept_on_append() {
        let sidecar = InMemorySidecar::new();
        sidecar.put(SHARED_HISTORY_KEY, json!([{"message": "ok"}, 42, {"nope": true}]));
        let history = ConversationHistory::new(sidecar.clone());

        assert_eq!(history.load().await.unwrap().len(), 1);

        history.append(&entry("next")).await.unwrap();
        let raw = sidecar.value(SHARED_HISTORY_KEY).unwrap();
        assert_eq!(raw.as_array().unwrap().len(), 4);
        assert_eq!(raw[1], json!(42));
    }

    #[tokio::test]
    async fn string_encoded_history_is_read() {
        let sidecar = InMemorySidecar::new();
        sidecar.put(
            SHARED_HISTORY_KEY,
            serde_json::Value::String(r#"[{"message":"hello"}]"#.to_string()),
        );
        let history = ConversationHistory::new(sidecar);
        assert_eq!(history.recent(DEFAULT_WINDOW).await[0].message, "hello");
    }

    #[tokio::test]
    async fn recent_swallows_store_failure() {
        let sidecar = InMemorySidecar::new();
        let history = ConversationHistory::new(sidecar.clone());
        history.append(&entry("x")).await.unwrap();
        sidecar.fail_state(true);
        assert!(history.recent(DEFAULT_WINDOW).await.is_empty());
        assert!(history.append(&entry("y")).await.is_err());
    }
}
