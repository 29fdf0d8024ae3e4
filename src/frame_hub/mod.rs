//! FrameHub - Per-Camera Subscriber Fan-Out
//!
//! ## Responsibilities
//!
//! - Track active subscriber channels per camera
//! - Fan out published FrameEvents to every subscriber of that camera
//! - Replay the last-known state to new subscribers atomically
//!
//! A `subscribe` call returns a `Subscription` guard; dropping it removes
//! the channel from the registry, so every exit path of a streaming
//! connection releases its slot. Registry mutations never suspend, so the
//! registry uses a synchronous lock and the guard can unregister from
//! `Drop`. Per-subscriber channels are unbounded FIFO; nothing bounds how
//! far a slow subscriber may fall behind.

use crate::frame_store::FrameStore;
use crate::models::FrameEvent;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use uuid::Uuid;

type SubscriberMap = HashMap<String, HashMap<Uuid, mpsc::UnboundedSender<Arc<FrameEvent>>>>;

/// Broadcast hub partitioned by camera id
pub struct FrameHub {
    store: Arc<FrameStore>,
    subscribers: Mutex<SubscriberMap>,
}

impl FrameHub {
    /// Create a hub backed by the given state store
    pub fn new(store: Arc<FrameStore>) -> Self {
        Self {
            store,
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new subscriber for a camera.
    ///
    /// The last-known state is read under the registry lock, and publish
    /// commits the store under that same lock, so relative to any publish
    /// the subscriber either sees the event as its replay or receives it
    /// live on the channel — never neither, never both.
    pub fn subscribe(self: Arc<Self>, camera_id: &str) -> (Subscription, Option<Arc<FrameEvent>>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        let replay = {
            let mut subscribers = self
                .subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            subscribers
                .entry(camera_id.to_string())
                .or_default()
                .insert(id, tx);
            self.store.get(camera_id)
        };

        tracing::info!(camera_id = %camera_id, subscriber_id = %id, "Subscriber registered");

        let subscription = Subscription {
            hub: self,
            camera_id: camera_id.to_string(),
            id,
            rx,
        };
        (subscription, replay)
    }

    /// Commit an event as the camera's last-known state and fan it out
    /// to every current subscriber.
    ///
    /// The store write and the sender-set snapshot happen under the same
    /// registry lock as `subscribe`'s registration-plus-replay, so any
    /// subscriber sees a given event exactly once: as its replay, or
    /// live on its channel, never both.
    ///
    /// Delivery is best-effort: a channel whose receiver is gone is
    /// skipped and removed on its guard's drop, never surfaced to the
    /// publisher.
    pub fn publish(&self, camera_id: &str, event: Arc<FrameEvent>) {
        let senders: Vec<(Uuid, mpsc::UnboundedSender<Arc<FrameEvent>>)> = {
            let subscribers = self
                .subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            self.store.set(event.clone());
            match subscribers.get(camera_id) {
                Some(channels) => channels
                    .iter()
                    .map(|(id, tx)| (*id, tx.clone()))
                    .collect(),
                None => Vec::new(),
            }
        };

        let mut delivered = 0usize;
        for (id, tx) in &senders {
            if tx.send(event.clone()).is_err() {
                tracing::debug!(
                    camera_id = %camera_id,
                    subscriber_id = %id,
                    "Skipping closed subscriber channel"
                );
            } else {
                delivered += 1;
            }
        }

        tracing::debug!(
            camera_id = %camera_id,
            subscribers = senders.len(),
            delivered = delivered,
            "Published frame event"
        );
    }

    /// Number of registered subscribers for a camera
    pub fn subscriber_count(&self, camera_id: &str) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(camera_id)
            .map(HashMap::len)
            .unwrap_or(0)
    }

    /// Remove one channel; unknown entries are a no-op.
    fn remove(&self, camera_id: &str, id: &Uuid) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(channels) = subscribers.get_mut(camera_id) {
            if channels.remove(id).is_some() {
                tracing::info!(camera_id = %camera_id, subscriber_id = %id, "Subscriber removed");
            }
            if channels.is_empty() {
                subscribers.remove(camera_id);
            }
        }
    }
}

/// One subscriber's delivery channel, scoped to a camera.
///
/// Owns the receiving end; the registry entry is released when this guard
/// drops, whichever way the streaming connection ends.
pub struct Subscription {
    hub: Arc<FrameHub>,
    camera_id: String,
    id: Uuid,
    rx: mpsc::UnboundedReceiver<Arc<FrameEvent>>,
}

impl Subscription {
    /// Camera this subscription is scoped to
    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    /// Wait for the next published event
    pub async fn recv(&mut self) -> Option<Arc<FrameEvent>> {
        self.rx.recv().await
    }

    /// Poll for the next published event (for Stream adapters)
    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<Arc<FrameEvent>>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.remove(&self.camera_id, &self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::time::Duration;

    fn hub() -> Arc<FrameHub> {
        Arc::new(FrameHub::new(Arc::new(FrameStore::new())))
    }

    fn event(camera_id: &str) -> Arc<FrameEvent> {
        Arc::new(FrameEvent::new(
            camera_id.to_string(),
            Utc::now(),
            vec![],
            vec![],
        ))
    }

    #[tokio::test]
    async fn test_no_replay_before_first_ingestion() {
        let hub = hub();
        let (mut sub, replay) = hub.clone().subscribe("9999");
        assert!(replay.is_none());

        let ev = event("9999");
        hub.publish("9999", ev.clone());

        let received = sub.recv().await.unwrap();
        assert!(Arc::ptr_eq(&received, &ev));

        // Exactly one event was delivered
        let pending = tokio::time::timeout(Duration::from_millis(20), sub.recv()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn test_replay_for_late_subscriber() {
        let hub = hub();
        let stored = event("42");
        hub.publish("42", stored.clone());

        let (mut sub, replay) = hub.clone().subscribe("42");
        let replay = replay.unwrap();
        assert!(Arc::ptr_eq(&replay, &stored));

        // Replay precedes anything published afterwards
        let live = event("42");
        hub.publish("42", live.clone());
        let received = sub.recv().await.unwrap();
        assert!(Arc::ptr_eq(&received, &live));
    }

    #[tokio::test]
    async fn test_replay_and_live_delivery_are_exclusive() {
        let hub = hub();
        let (mut early, early_replay) = hub.clone().subscribe("42");
        assert!(early_replay.is_none());

        let ev = event("42");
        hub.publish("42", ev.clone());

        // The event is now the stored state: a late subscriber gets it
        // as replay and nothing on its channel
        let (mut late, late_replay) = hub.clone().subscribe("42");
        assert!(Arc::ptr_eq(&late_replay.unwrap(), &ev));
        let pending = tokio::time::timeout(Duration::from_millis(50), late.recv()).await;
        assert!(pending.is_err());

        // The early subscriber gets it live, exactly once
        let received = early.recv().await.unwrap();
        assert!(Arc::ptr_eq(&received, &ev));
        let pending = tokio::time::timeout(Duration::from_millis(50), early.recv()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn test_fifo_order_per_subscriber() {
        let hub = hub();
        let (mut a, _) = hub.clone().subscribe("7");
        let (mut b, _) = hub.clone().subscribe("7");

        let e1 = event("7");
        let e2 = event("7");
        hub.publish("7", e1.clone());
        hub.publish("7", e2.clone());

        for sub in [&mut a, &mut b] {
            let first = sub.recv().await.unwrap();
            let second = sub.recv().await.unwrap();
            assert!(Arc::ptr_eq(&first, &e1));
            assert!(Arc::ptr_eq(&second, &e2));
        }
    }

    #[tokio::test]
    async fn test_publish_isolated_per_camera() {
        let hub = hub();
        let (mut sub, _) = hub.clone().subscribe("a");
        hub.publish("b", event("b"));

        let pending = tokio::time::timeout(Duration::from_millis(20), sub.recv()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn test_drop_unregisters_and_publish_does_not_fail() {
        let hub = hub();
        let (sub, _) = hub.clone().subscribe("42");
        let (mut kept, _) = hub.clone().subscribe("42");
        assert_eq!(hub.subscriber_count("42"), 2);

        drop(sub);
        assert_eq!(hub.subscriber_count("42"), 1);

        // Publishing after an unsubscribe delivers to the survivor only
        let ev = event("42");
        hub.publish("42", ev.clone());
        let received = kept.recv().await.unwrap();
        assert!(Arc::ptr_eq(&received, &ev));
    }

    #[tokio::test]
    async fn test_empty_camera_entry_pruned() {
        let hub = hub();
        let (sub, _) = hub.clone().subscribe("leak-check");
        assert_eq!(hub.subscriber_count("leak-check"), 1);
        drop(sub);
        assert_eq!(hub.subscriber_count("leak-check"), 0);
        // The registry holds no entry at all for a camera with no subscribers
        assert!(hub
            .subscribers
            .lock()
            .unwrap()
            .get("leak-check")
            .is_none());
    }

    #[tokio::test]
    async fn test_publish_with_no_subscribers_is_noop() {
        let hub = hub();
        hub.publish("nobody", event("nobody"));
    }
}
