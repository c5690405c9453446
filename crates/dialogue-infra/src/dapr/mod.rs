//! Sidecar HTTP client.
//!
//! [`DaprClient`] implements the `StateStore`, `Publisher` and `Invoker`
//! ports over the sidecar's v1.0 HTTP API. The state store and pubsub
//! component names are bound at construction from `RuntimeSettings`.
//!
//! The optional API token is held as a [`SecretString`] and only exposed
//! when building request headers.

pub mod types;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use dialogue_core::sidecar::{Invoker, Publisher, StateOperation, StateStore};
use dialogue_types::config::{RuntimeSettings, SidecarSettings};
use dialogue_types::error::SidecarError;

use self::types::{StateItem, TransactionRequest};

/// Header carrying the sidecar API token.
const API_TOKEN_HEADER: &str = "dapr-api-token";

/// HTTP client for the local sidecar.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct DaprClient {
    http: reqwest::Client,
    base_url: String,
    api_token: Option<Arc<SecretString>>,
    state_store: String,
    pubsub: String,
}

impl DaprClient {
    pub fn new(sidecar: &SidecarSettings, runtime: &RuntimeSettings) -> Result<Self, SidecarError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(sidecar.timeout_secs))
            .build()
            .map_err(|e| SidecarError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: sidecar.http_endpoint.trim_end_matches('/').to_string(),
            api_token: sidecar
                .api_token
                .as_ref()
                .map(|token| Arc::new(SecretString::from(token.clone()))),
            state_store: runtime.state_store.clone(),
            pubsub: runtime.pubsub.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the sidecar is up.
    pub async fn health(&self) -> Result<(), SidecarError> {
        let response = send(self.request(Method::GET, "/v1.0/healthz")).await?;
        check(response).await.map(|_| ())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match &self.api_token {
            Some(token) => builder.header(API_TOKEN_HEADER, token.expose_secret()),
            None => builder,
        }
    }

    fn state_path(&self, suffix: &str) -> String {
        format!("/v1.0/state/{}{}", self.state_store, suffix)
    }
}

async fn send(builder: RequestBuilder) -> Result<Response, SidecarError> {
    builder
        .send()
        .await
        .map_err(|e| SidecarError::Transport(e.to_string()))
}

/// Turn a non-success response into `SidecarError::Status`.
async fn check(response: Response) -> Result<Response, SidecarError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SidecarError::Status {
        status: status.as_u16(),
        body,
    })
}

impl StateStore for DaprClient {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, SidecarError> {
        let path = self.state_path(&format!("/{key}"));
        let response = send(self.request(Method::GET, &path)).await?;
        if matches!(response.status(), StatusCode::NO_CONTENT | StatusCode::NOT_FOUND) {
            debug!(key, "State key not found");
            return Ok(None);
        }
        let response = check(response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| SidecarError::Transport(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        // Values saved as raw bytes come back as text that may not be JSON.
        Ok(Some(
            serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body)),
        ))
    }

    async fn save(&self, key: &str, value: &serde_json::Value) -> Result<(), SidecarError> {
        let body = [StateItem { key, value }];
        let response = send(self.request(Method::POST, &self.state_path("")).json(&body)).await?;
        check(response).await?;
        debug!(key, store = %self.state_store, "Saved state");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SidecarError> {
        let path = self.state_path(&format!("/{key}"));
        let response = send(self.request(Method::DELETE, &path)).await?;
        check(response).await?;
        debug!(key, store = %self.state_store, "Deleted state");
        Ok(())
    }

    async fn transact(&self, operations: &[StateOperation]) -> Result<(), SidecarError> {
        let body = TransactionRequest::from_operations(operations);
        let path = self.state_path("/transaction");
        let response = send(self.request(Method::POST, &path).json(&body)).await?;
        check(response).await?;
        debug!(operations = operations.len(), store = %self.state_store, "Committed state transaction");
        Ok(())
    }
}

impl Publisher for DaprClient {
    async fn publish(&self, topic: &str, payload: &serde_json::Value) -> Result<(), SidecarError> {
        let path = format!("/v1.0/publish/{}/{topic}", self.pubsub);
        let response = send(self.request(Method::POST, &path).json(payload)).await?;
        check(response).await?;
        debug!(topic, pubsub = %self.pubsub, "Published event");
        Ok(())
    }
}

impl Invoker for DaprClient {
    async fn invoke(
        &self,
        app_id: &str,
        method: &str,
        payload: &serde_json::Value,
    ) -> Result<String, SidecarError> {
        let path = format!("/v1.0/invoke/{app_id}/method/{method}");
        let response = send(self.request(Method::POST, &path).json(payload)).await?;
        let response = check(response).await?;
        response
            .text()
            .await
            .map_err(|e| SidecarError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Bytes;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::{get, post};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct FakeSidecar {
        state: Arc<Mutex<HashMap<String, String>>>,
        published: Arc<Mutex<Vec<(String, String, serde_json::Value)>>>,
        tokens: Arc<Mutex<Vec<Option<String>>>>,
    }

    impl FakeSidecar {
        fn record_token(&self, headers: &HeaderMap) {
            let token = headers
                .get(API_TOKEN_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            self.tokens.lock().unwrap().push(token);
        }
    }

    async fn get_state(
        State(fake): State<FakeSidecar>,
        headers: HeaderMap,
        Path((store, key)): Path<(String, String)>,
    ) -> (AxumStatus, String) {
        fake.record_token(&headers);
        if store != "statestore" {
            return (AxumStatus::BAD_REQUEST, "unknown store".to_string());
        }
        match fake.state.lock().unwrap().get(&key) {
            Some(body) => (AxumStatus::OK, body.clone()),
            None => (AxumStatus::NO_CONTENT, String::new()),
        }
    }

    async fn delete_state(
        State(fake): State<FakeSidecar>,
        Path((_store, key)): Path<(String, String)>,
    ) -> AxumStatus {
        fake.state.lock().unwrap().remove(&key);
        AxumStatus::NO_CONTENT
    }

    async fn save_state(
        State(fake): State<FakeSidecar>,
        axum::Json(items): axum::Json<Vec<serde_json::Value>>,
    ) -> AxumStatus {
        let mut state = fake.state.lock().unwrap();
        for item in items {
            let key = item["key"].as_str().unwrap().to_string();
            state.insert(key, item["value"].to_string());
        }
        AxumStatus::NO_CONTENT
    }

    async fn transaction(
        State(fake): State<FakeSidecar>,
        axum::Json(body): axum::Json<serde_json::Value>,
    ) -> AxumStatus {
        let mut state = fake.state.lock().unwrap();
        for op in body["operations"].as_array().unwrap() {
            let key = op["request"]["key"].as_str().unwrap().to_string();
            match op["operation"].as_str().unwrap() {
                "upsert" => {
                    state.insert(key, op["request"]["value"].to_string());
                }
                "delete" => {
                    state.remove(&key);
                }
                other => panic!("unexpected operation {other}"),
            }
        }
        AxumStatus::NO_CONTENT
    }

    async fn publish(
        State(fake): State<FakeSidecar>,
        Path((pubsub, topic)): Path<(String, String)>,
        axum::Json(body): axum::Json<serde_json::Value>,
    ) -> AxumStatus {
        fake.published.lock().unwrap().push((pubsub, topic, body));
        AxumStatus::NO_CONTENT
    }

    async fn invoke(Path((app, method)): Path<(String, String)>, body: Bytes) -> String {
        format!("{app}/{method}:{}", String::from_utf8_lossy(&body))
    }

    async fn spawn_fake() -> (FakeSidecar, String) {
        let fake = FakeSidecar::default();
        let app = Router::new()
            .route("/v1.0/healthz", get(|| async { AxumStatus::NO_CONTENT }))
            .route("/v1.0/state/{store}", post(save_state))
            .route("/v1.0/state/{store}/transaction", post(transaction))
            .route(
                "/v1.0/state/{store}/{key}",
                get(get_state).delete(delete_state),
            )
            .route("/v1.0/publish/{pubsub}/{topic}", post(publish))
            .route("/v1.0/invoke/{app}/method/{method}", post(invoke))
            .with_state(fake.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (fake, format!("http://{addr}"))
    }

    fn client(endpoint: &str, token: Option<&str>) -> DaprClient {
        let sidecar = SidecarSettings {
            http_endpoint: format!("{endpoint}/"),
            api_token: token.map(str::to_string),
            timeout_secs: 5,
        };
        DaprClient::new(&sidecar, &RuntimeSettings::default()).unwrap()
    }

    #[tokio::test]
    async fn state_save_get_delete() {
        let (_fake, endpoint) = spawn_fake().await;
        let client = client(&endpoint, None);

        assert_eq!(client.get("agent_keys").await.unwrap(), None);

        client.save("agent_keys", &json!(["a"])).await.unwrap();
        assert_eq!(client.get("agent_keys").await.unwrap(), Some(json!(["a"])));

        client.delete("agent_keys").await.unwrap();
        assert_eq!(client.get("agent_keys").await.unwrap(), None);
    }

    #[tokio::test]
    async fn non_json_state_comes_back_as_string() {
        let (fake, endpoint) = spawn_fake().await;
        fake.state
            .lock()
            .unwrap()
            .insert("raw".to_string(), "not json".to_string());
        let client = client(&endpoint, None);
        assert_eq!(client.get("raw").await.unwrap(), Some(json!("not json")));
    }

    #[tokio::test]
    async fn transaction_applies_all_operations() {
        let (fake, endpoint) = spawn_fake().await;
        fake.state
            .lock()
            .unwrap()
            .insert("old".to_string(), "1".to_string());
        let client = client(&endpoint, None);

        client
            .transact(&[
                StateOperation::Upsert {
                    key: "new".to_string(),
                    value: json!({"tea": 3}),
                },
                StateOperation::Delete {
                    key: "old".to_string(),
                },
            ])
            .await
            .unwrap();

        let state = fake.state.lock().unwrap();
        assert!(!state.contains_key("old"));
        assert_eq!(state.get("new").unwrap(), r#"{"tea":3}"#);
    }

    #[tokio::test]
    async fn publish_uses_configured_pubsub() {
        let (fake, endpoint) = spawn_fake().await;
        let client = client(&endpoint, None);
        client
            .publish("conversations", &json!({"name": "God", "message": "Begin"}))
            .await
            .unwrap();

        let published = fake.published.lock().unwrap();
        assert_eq!(published[0].0, "pubsub");
        assert_eq!(published[0].1, "conversations");
        assert_eq!(published[0].2["name"], "God");
    }

    #[tokio::test]
    async fn invoke_returns_body_text() {
        let (_fake, endpoint) = spawn_fake().await;
        let client = client(&endpoint, None);
        let body = client
            .invoke("dialogue-generator", "generate", &json!({"x": 1}))
            .await
            .unwrap();
        assert_eq!(body, r#"dialogue-generator/generate:{"x":1}"#);
    }

    #[tokio::test]
    async fn api_token_header_is_sent() {
        let (fake, endpoint) = spawn_fake().await;
        client(&endpoint, Some("s3cret")).get("k").await.unwrap();
        client(&endpoint, None).get("k").await.unwrap();

        let tokens = fake.tokens.lock().unwrap();
        assert_eq!(tokens[0].as_deref(), Some("s3cret"));
        assert_eq!(tokens[1], None);
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let (_fake, endpoint) = spawn_fake().await;
        let sidecar = SidecarSettings {
            http_endpoint: endpoint,
            api_token: None,
            timeout_secs: 5,
        };
        let runtime = RuntimeSettings {
            state_store: "missing".to_string(),
            ..RuntimeSettings::default()
        };
        let client = DaprClient::new(&sidecar, &runtime).unwrap();
        let err = client.get("k").await.unwrap_err();
        assert!(matches!(err, SidecarError::Status { status: 400, .. }));
    }

    #[tokio::test]
    async fn unreachable_sidecar_is_transport_error() {
        let client = client("http://127.0.0.1:1", None);
        assert!(matches!(
            client.health().await,
            Err(SidecarError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn health_ok() {
        let (_fake, endpoint) = spawn_fake().await;
        client(&endpoint, None).health().await.unwrap();
    }
}
