//! Daemon wiring for the takeout ordering backend.
//!
//! The engine crate holds all the domain logic; this crate owns the process: configuration from
//! the environment, the background payment-timeout sweep, the push notification fan-out, and the
//! mock payment gateway that stands in for a real provider webhook.
pub mod broadcast;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod sweep_worker;

use log::warn;
use takeout_engine::events::EventHooks;

use crate::broadcast::{PushBroadcaster, PushMessage};

/// Wires the order lifecycle events to the push broadcaster: a confirmed payment becomes a
/// "new order" push, a customer reminder becomes a reminder push.
pub fn push_hooks(broadcaster: PushBroadcaster) -> EventHooks {
    let mut hooks = EventHooks::default();
    let paid_caster = broadcaster.clone();
    hooks.on_order_paid(move |ev| {
        let broadcaster = paid_caster.clone();
        Box::pin(async move {
            broadcaster.broadcast(&PushMessage::new_paid_order(&ev.order));
        })
    });
    let remind_caster = broadcaster;
    hooks.on_order_reminder(move |ev| {
        let broadcaster = remind_caster.clone();
        Box::pin(async move {
            broadcaster.broadcast(&PushMessage::reminder(&ev.order));
        })
    });
    hooks.on_order_cancelled(move |ev| {
        Box::pin(async move {
            if ev.refund_due {
                warn!("📢️ Order [{}] was cancelled after payment; refund has been flagged", ev.order.number);
            }
        })
    });
    hooks
}
