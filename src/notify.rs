//! Commit-gated notification bus
//!
//! Decouples business operations from the SSE fan-out. `publish` is
//! fire-and-forget: it performs at most one broadcast, passes name and
//! payload through unchanged, and never fails the caller — an empty live set
//! or a subscriber error is not a business failure.
//!
//! Commit gating is the *caller's* contract, made explicit instead of relying
//! on framework transaction listeners: an operation that produces an event
//! inside a transaction must call `publish` as the unconditional next
//! statement after its `commit()` returns Ok, and must not call it on any
//! rollback path. See `ImportOrchestrator::import_batch`.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::sse::SubscriberRegistry;

/// A fact produced by a committed business operation
#[derive(Debug, Clone)]
pub struct DomainEvent {
    pub name: String,
    pub data: serde_json::Value,
}

impl DomainEvent {
    pub fn new(name: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Emitted once per committed batch import.
    pub fn records_imported(count: usize) -> Self {
        Self::new("records-imported", json!({ "count": count }))
    }
}

#[derive(Clone)]
pub struct NotificationBus {
    registry: Arc<SubscriberRegistry>,
}

impl NotificationBus {
    pub fn new(registry: Arc<SubscriberRegistry>) -> Self {
        Self { registry }
    }

    /// Deliver `event` to every live subscriber. Infallible from the
    /// caller's point of view; per-subscriber failures are handled (and
    /// logged) inside the registry.
    pub fn publish(&self, event: DomainEvent) {
        debug!(event = %event.name, "Publishing domain event");
        self.registry.broadcast(&event.name, &event.data);
    }
}
