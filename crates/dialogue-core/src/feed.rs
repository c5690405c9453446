//! Broadcast feed of conversation turns for live observers.
//!
//! Built on `tokio::sync::broadcast`. Publishing with no subscribers drops
//! the event; a subscriber that falls behind skips what it missed.

use dialogue_types::conversation::FeedEvent;
use tokio::sync::broadcast;

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 256;

/// Multi-consumer feed of conversation events.
///
/// Cloning the feed clones the sender.
#[derive(Clone)]
pub struct ConversationFeed {
    sender: broadcast::Sender<FeedEvent>,
}

impl ConversationFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// A receiver for every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers; returns how many got it.
    pub fn publish(&self, event: FeedEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ConversationFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for ConversationFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationFeed")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}
