//! Sidecar runtime port traits.
//!
//! The distributed-application runtime provides three building blocks the
//! services rely on: a key-value state store, pub/sub publishing and service
//! invocation. Each is a trait here; the HTTP implementation lives in
//! dialogue-infra. Component names (store, pubsub) are bound by the
//! implementation, so callers only deal in keys and topics.

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

use std::future::Future;

use serde::de::DeserializeOwned;

use dialogue_types::error::SidecarError;

/// A single operation inside a state transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum StateOperation {
    Upsert {
        key: String,
        value: serde_json::Value,
    },
    Delete {
        key: String,
    },
}

/// Key-value state store.
///
/// Values are JSON. Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Writes are last-writer-wins; no concurrency tokens are used.
pub trait StateStore: Send + Sync {
    /// Get a value by key. Returns None if the key does not exist.
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<serde_json::Value>, SidecarError>> + Send;

    /// Set a value for a key (upsert).
    fn save(
        &self,
        key: &str,
        value: &serde_json::Value,
    ) -> impl Future<Output = Result<(), SidecarError>> + Send;

    /// Delete a key. No-op if the key does not exist.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), SidecarError>> + Send;

    /// Apply all operations atomically, or none of them.
    fn transact(
        &self,
        operations: &[StateOperation],
    ) -> impl Future<Output = Result<(), SidecarError>> + Send;
}

/// Pub/sub publisher bound to one pubsub component.
pub trait Publisher: Send + Sync {
    /// Publish a JSON payload to a topic.
    fn publish(
        &self,
        topic: &str,
        payload: &serde_json::Value,
    ) -> impl Future<Output = Result<(), SidecarError>> + Send;
}

/// Service-to-service invocation through the sidecar.
pub trait Invoker: Send + Sync {
    /// POST a JSON payload to `method` on the app `app_id`; returns the
    /// response body as text.
    fn invoke(
        &self,
        app_id: &str,
        method: &str,
        payload: &serde_json::Value,
    ) -> impl Future<Output = Result<String, SidecarError>> + Send;
}

/// Decode a stored state value into `T`.
///
/// Services that serialize before saving leave a JSON string holding JSON;
/// that form is unwrapped first. Decoding is plain serde; stored text is
/// never evaluated.
pub fn decode_state<T: DeserializeOwned>(
    key: &str,
    value: serde_json::Value,
) -> Result<T, SidecarError> {
    let result = match value {
        serde_json::Value::String(inner) => serde_json::from_str(&inner),
        other => serde_json::from_value(other),
    };
    result.map_err(|e| SidecarError::Decode {
        key: key.to_string(),
        message: e.to_string(),
    })
}
