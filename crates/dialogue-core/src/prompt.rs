//! Prompt rendering for agent replies.

use dialogue_types::conversation::HistoryEntry;

const SCENE: &str = "The conversation is light-hearted and humorous, unfolding over a cup of tea. \
It's brief but engaging, offering a glimpse into the character's quirky personality.";

/// Render the generation prompt for an agent.
///
/// `context` is the recent history window, oldest first. Its messages are
/// joined with newlines; the continuation lines keep their four-space indent.
pub fn render_prompt(description: &str, context: &[HistoryEntry]) -> String {
    let latest = context
        .iter()
        .map(|entry| entry.message.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Character Description: {description}\n\n    Latest Messages: {latest}\n\n    Context: {SCENE}\n\n    Response:"
    )
}
