//! The refund seam.
//!
//! Cancelling or rejecting a paid order owes the customer a refund. The engine only records the
//! fact by flipping `pay_status` to [`crate::db_types::PayStatus::Refund`]; the actual movement
//! of money is delegated to a [`RefundProcessor`] so a real payment provider integration can be
//! dropped in without touching the lifecycle code.
use std::{future::Future, pin::Pin, sync::Arc};

use log::info;
use tko_common::Money;

use crate::db_types::Order;

pub trait RefundProcessor: Send + Sync {
    /// Initiates a refund of `amount` for the order. Implementations must be idempotent; the
    /// lifecycle guarantees at most one call per order, but retries after a crash are possible.
    fn process_refund(&self, order: &Order, amount: Money) -> Pin<Box<dyn Future<Output = ()> + Send>>;
}

pub type SharedRefundProcessor = Arc<dyn RefundProcessor>;

/// A [`RefundProcessor`] that records the refund in the log and does nothing else. The default
/// until a payment provider is wired up.
#[derive(Debug, Clone, Default)]
pub struct LogOnlyRefunds;

impl RefundProcessor for LogOnlyRefunds {
    fn process_refund(&self, order: &Order, amount: Money) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        let number = order.number.clone();
        Box::pin(async move {
            info!("🪛️ Refund of {amount} recorded for order [{number}]. No provider is configured; nothing was sent.");
        })
    }
}
