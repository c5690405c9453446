//! OpenTelemetry GenAI semantic-convention attribute names.
//!
//! Usable as braced constant field names in span macros and with
//! `Span::record`. The completion span in dialogue-core names its provider
//! and model fields inline, since that crate does not depend on this one.

/// The operation performed (e.g. "generate_reply").
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// Output tokens counted for the response.
pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";

/// Agent identifier.
pub const GEN_AI_AGENT_ID: &str = "gen_ai.agent.id";

/// Agent display name.
pub const GEN_AI_AGENT_NAME: &str = "gen_ai.agent.name";

// --- Operation name values ---

/// One agent reply in the tea-party conversation.
pub const OP_GENERATE_REPLY: &str = "generate_reply";

/// Routing a conversation turn to an agent.
pub const OP_ROUTE_TURN: &str = "route_turn";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_share_genai_namespace() {
        for name in [
            GEN_AI_OPERATION_NAME,
            GEN_AI_USAGE_OUTPUT_TOKENS,
            GEN_AI_AGENT_ID,
            GEN_AI_AGENT_NAME,
        ] {
            assert!(name.starts_with("gen_ai."));
        }
    }
}
