//! Subscriber registry behavior under concurrent churn
//!
//! Connections come and go while broadcasts are in flight; the registry must
//! neither lose a live subscriber nor keep a dead one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use kinocat::notify::{DomainEvent, NotificationBus};
use kinocat::sse::{SseFrame, SubscriberRegistry, SUBSCRIBER_BUFFER};

fn quiet_registry() -> Arc<SubscriberRegistry> {
    // heartbeat period long enough that the timer never fires in a test
    SubscriberRegistry::new(Duration::from_secs(3600))
}

#[tokio::test(flavor = "multi_thread")]
async fn churning_subscribers_all_leave_cleanly() {
    let registry = quiet_registry();
    let stop = Arc::new(AtomicBool::new(false));

    // broadcasts running the whole time the churn is happening
    let broadcaster = tokio::spawn({
        let registry = registry.clone();
        let stop = stop.clone();
        async move {
            while !stop.load(Ordering::Relaxed) {
                registry.broadcast("records-imported", &json!({"count": 1}));
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        }
    });

    let mut churn = JoinSet::new();
    for _ in 0..24 {
        let registry = registry.clone();
        churn.spawn(async move {
            let (tx, mut rx) = mpsc::channel(SUBSCRIBER_BUFFER);
            let id = registry.register(tx);
            // stay subscribed long enough to see at least one event
            let frame = rx.recv().await;
            assert!(matches!(frame, Some(SseFrame::Event { .. })));
            registry.remove(id);
        });
    }
    while let Some(joined) = churn.join_next().await {
        joined.unwrap();
    }

    stop.store(true, Ordering::Relaxed);
    broadcaster.await.unwrap();

    assert!(registry.is_empty(), "live set must drain after churn");
}

#[tokio::test]
async fn abandoned_connections_do_not_starve_live_ones() {
    let registry = quiet_registry();

    let mut live = Vec::new();
    for _ in 0..8 {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        registry.register(tx);
        live.push(rx);
    }
    for _ in 0..8 {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        registry.register(tx);
        drop(rx); // client vanished without unsubscribing
    }
    assert_eq!(registry.len(), 16);

    registry.broadcast("records-imported", &json!({"count": 3}));

    assert_eq!(registry.len(), 8);
    for rx in &mut live {
        match rx.try_recv().unwrap() {
            SseFrame::Event { name, data } => {
                assert_eq!(name, "records-imported");
                assert_eq!(data["count"], 3);
            }
            other => panic!("expected event frame, got {other:?}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_publishers_deliver_every_event_once() {
    let registry = quiet_registry();
    let (tx, mut rx) = mpsc::channel(SUBSCRIBER_BUFFER);
    registry.register(tx);
    let bus = NotificationBus::new(registry.clone());

    // 4 publishers x 5 events fits the channel without draining
    let mut publishers = JoinSet::new();
    for _ in 0..4 {
        let bus = bus.clone();
        publishers.spawn(async move {
            for _ in 0..5 {
                bus.publish(DomainEvent::records_imported(1));
                tokio::task::yield_now().await;
            }
        });
    }
    while let Some(joined) = publishers.join_next().await {
        joined.unwrap();
    }

    let mut received = 0;
    while let Ok(frame) = rx.try_recv() {
        assert!(matches!(frame, SseFrame::Event { .. }));
        received += 1;
    }
    assert_eq!(received, 20);
    assert_eq!(registry.len(), 1, "a drained subscriber stays live");
}
