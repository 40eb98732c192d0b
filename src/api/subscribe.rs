//! SSE subscription endpoint
//!
//! A new client gets a `connected` acknowledgment first; only when that
//! initial send succeeded does the connection join the live set. Everything
//! after that arrives through the registry: domain events from committed
//! imports and keep-alive comments from the heartbeat timer. Dropping the
//! response stream (client gone, timeout, error) removes the subscriber.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    response::sse::{Event, Sse},
    routing::get,
    Router,
};
use futures::stream::Stream;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::sse::{SseFrame, SubscriberRegistry, SUBSCRIBER_BUFFER};
use crate::AppState;

/// Removes the subscriber when the connection's stream is dropped,
/// whatever the reason — completion, error or timeout all end up here.
struct RemoveOnDrop {
    registry: Arc<SubscriberRegistry>,
    id: Uuid,
}

impl Drop for RemoveOnDrop {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

/// GET /api/sse/subscribe
pub async fn subscribe(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, mut rx) = mpsc::channel::<SseFrame>(SUBSCRIBER_BUFFER);

    // Acknowledge before joining the live set; a connection whose ack
    // cannot even be queued is never registered.
    let ack = SseFrame::event("connected", json!("Connection established"));
    let guard = match tx.try_send(ack) {
        Ok(()) => {
            let id = state.registry.register(tx);
            Some(RemoveOnDrop {
                registry: state.registry.clone(),
                id,
            })
        }
        Err(e) => {
            warn!(error = %e, "Initial SSE acknowledgment failed, not registering client");
            None
        }
    };

    let stream = async_stream::stream! {
        let _guard = guard;
        while let Some(frame) = rx.recv().await {
            match into_sse_event(frame) {
                Ok(event) => yield Ok(event),
                Err(e) => warn!(error = %e, "Failed to serialize SSE event, skipping"),
            }
        }
        info!("SSE stream closed");
    };

    Sse::new(stream)
}

fn into_sse_event(frame: SseFrame) -> Result<Event, axum::Error> {
    match frame {
        SseFrame::Event { name, data } => Event::default().event(name).json_data(data),
        SseFrame::Comment(text) => Ok(Event::default().comment(text)),
    }
}

/// Build SSE routes
pub fn sse_routes() -> Router<AppState> {
    Router::new().route("/api/sse/subscribe", get(subscribe))
}
