//! Tea budget accounting.
//!
//! Output length is approximated by counting whitespace-separated words in
//! each streamed chunk. Every full hundred counted tokens costs one
//! millilitre of tea; the budget never drops below zero.

/// Counted tokens per millilitre of tea.
pub const TOKENS_PER_ML: u64 = 100;

/// Approximate token count of one streamed chunk.
pub fn count_words(chunk: &str) -> u64 {
    chunk.split_whitespace().count() as u64
}

/// Budget left after spending `token_count` tokens from `current`.
///
/// `max(current - floor(token_count / 100), 0)`; never exceeds `current`.
pub fn remaining_tea(current: u32, token_count: u64) -> u32 {
    let spent = u32::try_from(token_count / TOKENS_PER_ML).unwrap_or(u32::MAX);
    current.saturating_sub(spent)
}

/// Accumulates streamed text and its approximate token count.
#[derive(Debug, Default)]
pub struct TokenTally {
    text: String,
    tokens: u64,
}

impl TokenTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one streamed chunk.
    pub fn push(&mut self, chunk: &str) {
        self.tokens += count_words(chunk);
        self.text.push_str(chunk);
    }

    pub fn tokens(&self) -> u64 {
        self.tokens
    }

    /// The full generated text with surrounding whitespace removed.
    pub fn into_text(self) -> String {
        self.text.trim().to_string()
    }
}
