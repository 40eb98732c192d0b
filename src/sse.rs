//! Streaming subscriber registry
//!
//! Tracks every live SSE connection, fans committed-transaction events out to
//! all of them, and keeps idle connections alive with periodic comment
//! frames. One subscriber's failure is routine churn, never an error: a
//! connection whose channel is gone (or full) is removed and delivery
//! continues to the rest.
//!
//! Discipline for the shared live set: structural mutation is serialized by a
//! mutex, but sends always run on a snapshot taken under the lock and
//! released before any delivery, so removal during a fan-out never
//! invalidates an in-progress send. Sends are `try_send` only — the registry
//! never blocks on a slow subscriber.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Frames delivered to a subscriber's channel
#[derive(Debug, Clone)]
pub enum SseFrame {
    /// Named application event with JSON data
    Event {
        name: String,
        data: serde_json::Value,
    },
    /// Keep-alive comment, invisible to application-level consumers
    Comment(String),
}

impl SseFrame {
    pub fn event(name: impl Into<String>, data: serde_json::Value) -> Self {
        SseFrame::Event {
            name: name.into(),
            data,
        }
    }
}

/// Per-subscriber channel capacity. A subscriber that falls this many frames
/// behind is treated as dead.
pub const SUBSCRIBER_BUFFER: usize = 32;

struct Subscriber {
    tx: mpsc::Sender<SseFrame>,
    connected_at: Instant,
    last_activity: Instant,
}

/// Registry of live streaming connections
///
/// Construction spawns the process-lifetime heartbeat task; dropping the
/// last `Arc` stops it, so tests do not leak timers across registries.
pub struct SubscriberRegistry {
    live: Mutex<HashMap<Uuid, Subscriber>>,
    heartbeat_task: Mutex<Option<JoinHandle<()>>>,
}

impl SubscriberRegistry {
    /// Create a registry and start its heartbeat timer.
    pub fn new(heartbeat_period: Duration) -> Arc<Self> {
        let registry = Arc::new(Self {
            live: Mutex::new(HashMap::new()),
            heartbeat_task: Mutex::new(None),
        });

        // The task holds only a weak reference: it neither keeps the
        // registry alive nor outlives it.
        let weak = Arc::downgrade(&registry);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(heartbeat_period);
            ticker.tick().await; // first tick fires immediately, skip it
            loop {
                ticker.tick().await;
                let Some(registry) = weak.upgrade() else { break };
                registry.heartbeat();
            }
        });
        *lock(&registry.heartbeat_task) = Some(handle);

        registry
    }

    /// Add a connection to the live set and return its identity.
    ///
    /// The caller must already have delivered the initial `connected`
    /// acknowledgment into `tx`; a connection whose ack failed is never
    /// registered.
    pub fn register(&self, tx: mpsc::Sender<SseFrame>) -> Uuid {
        let id = Uuid::new_v4();
        let now = Instant::now();
        let total = {
            let mut live = lock(&self.live);
            live.insert(
                id,
                Subscriber {
                    tx,
                    connected_at: now,
                    last_activity: now,
                },
            );
            live.len()
        };
        info!(subscriber = %id, total, "SSE client connected");
        id
    }

    /// Remove a connection. Removing an already-removed id is a no-op.
    pub fn remove(&self, id: Uuid) -> bool {
        let (removed, total) = {
            let mut live = lock(&self.live);
            let removed = live.remove(&id);
            (removed, live.len())
        };
        match removed {
            Some(sub) => {
                info!(
                    subscriber = %id,
                    total,
                    connected_secs = sub.connected_at.elapsed().as_secs(),
                    "SSE client removed"
                );
                true
            }
            None => false,
        }
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        lock(&self.live).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.live).is_empty()
    }

    /// Deliver a named event to every live connection.
    pub fn broadcast(&self, name: &str, data: &serde_json::Value) {
        self.fan_out(SseFrame::event(name, data.clone()), name);
    }

    /// Send a keep-alive comment to every live connection. Idle streams are
    /// liable to be closed by intermediaries; this defeats that without
    /// being visible to consumers.
    pub fn heartbeat(&self) {
        self.fan_out(SseFrame::Comment("keep-alive".to_string()), "keep-alive");
    }

    fn fan_out(&self, frame: SseFrame, label: &str) {
        // snapshot under the lock, deliver outside it
        let snapshot: Vec<(Uuid, mpsc::Sender<SseFrame>)> = {
            let live = lock(&self.live);
            live.iter().map(|(id, sub)| (*id, sub.tx.clone())).collect()
        };

        if snapshot.is_empty() {
            debug!(event = label, "No SSE clients connected, nothing to send");
            return;
        }
        debug!(event = label, clients = snapshot.len(), "Sending to SSE clients");

        let mut delivered = Vec::new();
        let mut dead = Vec::new();
        for (id, tx) in snapshot {
            match tx.try_send(frame.clone()) {
                Ok(()) => delivered.push(id),
                Err(e) => {
                    warn!(
                        subscriber = %id,
                        event = label,
                        error = %e,
                        "Send to SSE client failed, removing it"
                    );
                    dead.push(id);
                }
            }
        }

        {
            let mut live = lock(&self.live);
            let now = Instant::now();
            for id in delivered {
                if let Some(sub) = live.get_mut(&id) {
                    sub.last_activity = now;
                }
            }
            for id in &dead {
                live.remove(id);
            }
        }
        for id in dead {
            info!(subscriber = %id, "SSE client pruned after failed send");
        }
    }
}

impl Drop for SubscriberRegistry {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.heartbeat_task).take() {
            handle.abort();
        }
    }
}

/// A poisoned registry lock only means another thread panicked mid-update of
/// bookkeeping data; the map itself stays usable.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
