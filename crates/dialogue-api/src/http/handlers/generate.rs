//! `POST /generate` on the generator service.

use axum::Json;
use axum::extract::State;
use tracing::{Instrument, field, info_span};

use dialogue_observe::genai_attrs::{
    GEN_AI_AGENT_ID, GEN_AI_AGENT_NAME, GEN_AI_OPERATION_NAME, GEN_AI_USAGE_OUTPUT_TOKENS,
    OP_GENERATE_REPLY,
};
use dialogue_types::conversation::{DialogueRequest, DialogueResponse};

use crate::http::error::AppError;
use crate::state::{GeneratorState, Sidecar};

/// Generate one agent reply.
///
/// Returns 502 when the language model fails; nothing is published then.
pub async fn generate<S: Sidecar>(
    State(state): State<GeneratorState<S>>,
    Json(request): Json<DialogueRequest>,
) -> Result<Json<DialogueResponse>, AppError> {
    if request.agent.name.trim().is_empty() {
        return Err(AppError::Validation("agent name must not be empty".to_string()));
    }

    // Provider and model are recorded on the nested completion span.
    let span = info_span!(
        "generate_reply",
        { GEN_AI_OPERATION_NAME } = OP_GENERATE_REPLY,
        { GEN_AI_AGENT_ID } = %request.agent.id,
        { GEN_AI_AGENT_NAME } = %request.agent.name,
        { GEN_AI_USAGE_OUTPUT_TOKENS } = field::Empty,
    );

    let outcome = state
        .generator
        .generate(request)
        .instrument(span.clone())
        .await?;
    span.record(GEN_AI_USAGE_OUTPUT_TOKENS, outcome.token_count);

    Ok(Json(outcome.response))
}
