//! The push notification fan-out.
//!
//! `PushBroadcaster` is the injected publish/subscribe seam between the order lifecycle events
//! and whatever transport carries notifications to merchant terminals. Observers register for a
//! receiver; delivery is best effort and an observer that has gone away is dropped on the next
//! broadcast.
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
        Mutex,
    },
};

use log::*;
use serde::{Deserialize, Serialize};
use takeout_engine::db_types::Order;
use tokio::sync::mpsc;

pub const MSG_TYPE_NEW_PAID_ORDER: i64 = 1;
pub const MSG_TYPE_REMINDER: i64 = 2;

/// The JSON payload pushed to merchant observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    #[serde(rename = "type")]
    pub msg_type: i64,
    #[serde(rename = "orderId")]
    pub order_id: i64,
    pub content: String,
}

impl PushMessage {
    pub fn new_paid_order(order: &Order) -> Self {
        Self { msg_type: MSG_TYPE_NEW_PAID_ORDER, order_id: order.id, content: format!("Order number: {}", order.number) }
    }

    pub fn reminder(order: &Order) -> Self {
        Self { msg_type: MSG_TYPE_REMINDER, order_id: order.id, content: format!("Order number: {}", order.number) }
    }
}

const OBSERVER_BUFFER: usize = 32;

#[derive(Clone, Default)]
pub struct PushBroadcaster {
    observers: Arc<Mutex<HashMap<u64, mpsc::Sender<PushMessage>>>>,
    next_id: Arc<AtomicU64>,
}

impl PushBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new observer and returns its id together with the message receiver.
    pub fn register(&self) -> (u64, mpsc::Receiver<PushMessage>) {
        let (sender, receiver) = mpsc::channel(OBSERVER_BUFFER);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, sender);
        debug!("📢️ Observer #{id} registered");
        (id, receiver)
    }

    pub fn unregister(&self, id: u64) {
        if self.lock().remove(&id).is_some() {
            debug!("📢️ Observer #{id} unregistered");
        }
    }

    pub fn observer_count(&self) -> usize {
        self.lock().len()
    }

    /// Delivers the message to every live observer. Observers whose channel is closed or full
    /// are silently dropped; push delivery is best effort.
    pub fn broadcast(&self, message: &PushMessage) {
        let mut observers = self.lock();
        observers.retain(|id, sender| match sender.try_send(message.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("📢️ Observer #{id} is not keeping up; dropping it");
                false
            },
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("📢️ Observer #{id} has gone away");
                false
            },
        });
        trace!("📢️ Broadcast type {} for order #{} to {} observers", message.msg_type, message.order_id, observers.len());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, mpsc::Sender<PushMessage>>> {
        match self.observers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn message() -> PushMessage {
        PushMessage { msg_type: MSG_TYPE_NEW_PAID_ORDER, order_id: 42, content: "Order number: 1700000000000001".into() }
    }

    #[test]
    fn wire_format_uses_the_legacy_field_names() {
        let json = serde_json::to_value(message()).unwrap();
        assert_eq!(json["type"], 1);
        assert_eq!(json["orderId"], 42);
        assert_eq!(json["content"], "Order number: 1700000000000001");
    }

    #[tokio::test]
    async fn live_observers_receive_dead_ones_are_dropped() {
        let broadcaster = PushBroadcaster::new();
        let (_alive_id, mut alive) = broadcaster.register();
        let (dead_id, dead) = broadcaster.register();
        drop(dead);
        assert_eq!(broadcaster.observer_count(), 2);

        broadcaster.broadcast(&message());
        assert_eq!(alive.recv().await.unwrap(), message());
        assert_eq!(broadcaster.observer_count(), 1);

        broadcaster.unregister(dead_id); // already gone; a no-op
        assert_eq!(broadcaster.observer_count(), 1);
    }

    #[tokio::test]
    async fn unregister_stops_delivery() {
        let broadcaster = PushBroadcaster::new();
        let (id, mut receiver) = broadcaster.register();
        broadcaster.unregister(id);
        broadcaster.broadcast(&message());
        assert!(receiver.recv().await.is_none());
    }
}
