//! `GET /events`: live conversation feed over Server-Sent Events.
//!
//! Each conversation turn the orchestrator receives is sent as a `message`
//! event whose data is the JSON-encoded [`FeedEvent`]. Subscribers that fall
//! behind skip the turns they missed. Streams end when the service shuts down.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use dialogue_types::conversation::FeedEvent;

use crate::state::{OrchestratorState, Sidecar};

fn to_sse(item: Result<FeedEvent, BroadcastStreamRecvError>) -> Option<Event> {
    match item {
        Ok(event) => match Event::default().event("message").json_data(&event) {
            Ok(sse) => Some(sse),
            Err(e) => {
                tracing::warn!("Failed to encode feed event: {e}");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::debug!(skipped, "Feed subscriber lagged");
            None
        }
    }
}

pub async fn conversation_feed<S: Sidecar>(
    State(state): State<OrchestratorState<S>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.feed.subscribe();
    tracing::info!(subscribers = state.feed.subscriber_count(), "Feed subscriber connected");

    let stream = BroadcastStream::new(receiver)
        .filter_map(|item| std::future::ready(to_sse(item).map(Ok)))
        .take_until(state.shutdown.clone().cancelled_owned());

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
