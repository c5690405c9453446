//! OllamaProvider -- [`LlmProvider`] over Ollama's `/api/generate`.
//!
//! Requests are always streamed; the newline-delimited JSON body is mapped
//! to [`StreamEvent`]s by [`streaming::map_ndjson_stream`].

pub mod streaming;
pub mod types;

use std::time::Duration;

use reqwest::StatusCode;

use dialogue_core::llm::{LlmProvider, LlmStream};
use dialogue_types::config::LlmSettings;
use dialogue_types::llm::{CompletionRequest, LlmError, StreamEvent};

use self::streaming::map_ndjson_stream;
use self::types::{ErrorBody, GenerateRequest};

/// Ollama completion provider.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(settings: &LlmSettings) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Map a non-success response to an [`LlmError`].
fn status_error(status: StatusCode, body: &str, model: &str) -> LlmError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.to_string());
    match status {
        StatusCode::NOT_FOUND => LlmError::ModelNotFound(model.to_string()),
        StatusCode::BAD_REQUEST => LlmError::InvalidRequest(message),
        _ => LlmError::Provider {
            message: format!("HTTP {}: {message}", status.as_u16()),
        },
    }
}

impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn stream(&self, request: CompletionRequest) -> LlmStream {
        let client = self.client.clone();
        let url = self.url("/api/generate");
        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model
        };
        let prompt = request.prompt;

        Box::pin(async_stream::try_stream! {
            let body = GenerateRequest {
                model: &model,
                prompt: &prompt,
                stream: true,
            };
            tracing::debug!(model = %model, url = %url, "Sending Ollama generate request");

            let response = client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| LlmError::Provider {
                    message: format!("request to {url} failed: {e}"),
                })?;

            let status = response.status();
            if status.is_success() {
                let mut events = map_ndjson_stream(response.bytes_stream());
                while let Some(event) = futures_util::StreamExt::next(&mut events).await {
                    let event: StreamEvent = event?;
                    yield event;
                }
            } else {
                let text = response.text().await.unwrap_or_default();
                Err::<(), LlmError>(status_error(status, &text, &model))?;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;
    use axum::Router;
    use axum::http::{StatusCode as AxumStatus, header};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use futures_util::StreamExt;
    use std::sync::{Arc, Mutex};

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn provider(base_url: &str) -> OllamaProvider {
        OllamaProvider::new(&LlmSettings {
            model: "llama3".to_string(),
            base_url: base_url.to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    async fn text_of(stream: LlmStream) -> Result<String, LlmError> {
        let mut text = String::new();
        let mut stream = stream;
        while let Some(event) = stream.next().await {
            if let StreamEvent::TextDelta { text: delta } = event? {
                text.push_str(&delta);
            }
        }
        Ok(text)
    }

    #[tokio::test]
    async fn streams_generate_response() {
        let seen = Arc::new(Mutex::new(None::<serde_json::Value>));
        let recorder = seen.clone();
        let app = Router::new().route(
            "/api/generate",
            post(move |Json(body): Json<serde_json::Value>| {
                let recorder = recorder.clone();
                async move {
                    *recorder.lock().unwrap() = Some(body);
                    (
                        [(header::CONTENT_TYPE, "application/x-ndjson")],
                        "{\"response\":\"Ten\",\"done\":false}\n\
                         {\"response\":\" past six.\",\"done\":false}\n\
                         {\"response\":\"\",\"done\":true,\"eval_count\":4}\n",
                    )
                }
            }),
        );
        let base = spawn(app).await;

        let text = text_of(provider(&base).stream(CompletionRequest::with_prompt("What time?")))
            .await
            .unwrap();
        assert_eq!(text, "Ten past six.");

        let body = seen.lock().unwrap().clone().unwrap();
        assert_eq!(body["model"], "llama3");
        assert_eq!(body["prompt"], "What time?");
        assert_eq!(body["stream"], true);
    }

    #[tokio::test]
    async fn explicit_model_overrides_default() {
        let seen = Arc::new(Mutex::new(None::<serde_json::Value>));
        let recorder = seen.clone();
        let app = Router::new().route(
            "/api/generate",
            post(move |Json(body): Json<serde_json::Value>| {
                let recorder = recorder.clone();
                async move {
                    *recorder.lock().unwrap() = Some(body);
                    "{\"response\":\"ok\",\"done\":true}\n"
                }
            }),
        );
        let base = spawn(app).await;

        let request = CompletionRequest {
            model: "mistral".to_string(),
            prompt: "p".to_string(),
        };
        text_of(provider(&base).stream(request)).await.unwrap();

        let body = seen.lock().unwrap().clone().unwrap();
        assert_eq!(body["model"], "mistral");
    }

    #[tokio::test]
    async fn missing_model_maps_to_model_not_found() {
        let app = Router::new().route(
            "/api/generate",
            post(|| async {
                (
                    AxumStatus::NOT_FOUND,
                    r#"{"error":"model 'llama3' not found"}"#,
                )
                    .into_response()
            }),
        );
        let base = spawn(app).await;

        let err = text_of(provider(&base).stream(CompletionRequest::with_prompt("x")))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ModelNotFound(m) if m == "llama3"));
    }

    #[tokio::test]
    async fn unreachable_server_is_provider_error() {
        let err = text_of(provider("http://127.0.0.1:1").stream(CompletionRequest::with_prompt("x")))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Provider { .. }));
    }

    #[test]
    fn status_error_uses_error_body() {
        let err = status_error(AxumStatus::INTERNAL_SERVER_ERROR, r#"{"error":"oom"}"#, "m");
        assert_eq!(err.to_string(), "provider error: HTTP 500: oom");
        let err = status_error(AxumStatus::BAD_REQUEST, "plain", "m");
        assert!(matches!(err, LlmError::InvalidRequest(m) if m == "plain"));
    }
}
