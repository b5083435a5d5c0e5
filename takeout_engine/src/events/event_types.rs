use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatus};

/// Fired when a payment confirmation lands and the order moves to `ToBeConfirmed`. Subscribers
/// typically push a "new order" notification to the merchant side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Fired when an order reaches `Cancelled`, whether by the customer, the business, or the timeout
/// sweep. `refund_due` is set when the order had already been paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    pub order: Order,
    pub status: OrderStatus,
    pub refund_due: bool,
}

impl OrderCancelledEvent {
    pub fn new(order: Order, refund_due: bool) -> Self {
        let status = order.status;
        Self { order, status, refund_due }
    }
}

/// Fired when a waiting customer nudges the merchant about an unconfirmed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReminderEvent {
    pub order: Order,
}

impl OrderReminderEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventType {
    OrderPaid(OrderPaidEvent),
    OrderCancelled(OrderCancelledEvent),
    OrderReminder(OrderReminderEvent),
}
