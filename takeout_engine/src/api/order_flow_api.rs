//! The primary order lifecycle API.
//!
//! `OrderFlowApi` wraps the storage backend and enforces the state machine:
//!
//! `PendingPayment → ToBeConfirmed → Confirmed → DeliveryInProgress → Completed`, with
//! `Cancelled` reachable from the first two states only. Every mutation is a guarded transition;
//! a stale precondition fails with [`OrderFlowError::IllegalTransition`] and writes nothing.
use blake2::{Blake2b512, Digest};
use chrono::{Duration, Utc};
use log::*;
use rand::{distributions::Alphanumeric, Rng};

use crate::{
    db_types::{Order, OrderStatus, PayStatus},
    events::{EventProducers, OrderCancelledEvent, OrderPaidEvent, OrderReminderEvent},
    helpers::next_order_number,
    order_objects::{
        OrderQueryFilter,
        OrderReceipt,
        OrderStatistics,
        OrderSubmission,
        OrderUpdate,
        OrderView,
        PaymentDescriptor,
        Paged,
    },
    refunds::SharedRefundProcessor,
    traits::{OrderFlowError, OrderGatewayDatabase},
};

/// The cancellation reason recorded by the timeout sweep.
pub const TIMEOUT_CANCEL_REASON: &str = "payment timeout, auto-cancelled";
/// The cancellation reason recorded when a customer cancels their own order.
pub const USER_CANCEL_REASON: &str = "cancelled by user";

pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
    refunds: SharedRefundProcessor,
}

impl<B> OrderFlowApi<B>
where B: OrderGatewayDatabase
{
    pub fn new(db: B, producers: EventProducers, refunds: SharedRefundProcessor) -> Self {
        Self { db, producers, refunds }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// Submits the user's cart as a new order. The order row, its detail rows and the cart clear
    /// commit atomically; the receipt carries the generated order number.
    pub async fn submit_order(
        &self,
        user_id: i64,
        submission: &OrderSubmission,
    ) -> Result<OrderReceipt, OrderFlowError> {
        let number = next_order_number();
        let order = self.db.submit_order(user_id, submission, &number).await?;
        info!("🔄️ Order [{}] submitted by user #{user_id} for {}", order.number, order.amount);
        Ok(OrderReceipt::from(&order))
    }

    /// Produces the descriptor the client hands to the payment provider and records the chosen
    /// payment method on the order. The status does not change until the provider calls back via
    /// [`Self::confirm_payment`].
    pub async fn request_payment(
        &self,
        user_id: i64,
        order_number: &str,
        pay_method: i64,
    ) -> Result<PaymentDescriptor, OrderFlowError> {
        let order = self
            .db
            .fetch_order_by_number(order_number, user_id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNumberNotFound(order_number.to_string()))?;
        if order.status != OrderStatus::PendingPayment {
            return Err(OrderFlowError::IllegalTransition {
                order_id: order.id,
                from: order.status,
                requested: OrderStatus::ToBeConfirmed,
            });
        }
        let update = OrderUpdate::default().with_pay_method(pay_method);
        self.db.transition_order(order.id, &[OrderStatus::PendingPayment], update).await?;
        let nonce_str: String = rand::thread_rng().sample_iter(&Alphanumeric).take(32).map(char::from).collect();
        let time_stamp = Utc::now().timestamp().to_string();
        let package_str = format!("prepay_id={order_number}");
        let digest = Blake2b512::digest(format!("{package_str}&{nonce_str}&{time_stamp}").as_bytes());
        let pay_sign = digest.iter().map(|b| format!("{b:02x}")).collect();
        debug!("🔄️ Payment descriptor issued for order [{order_number}]");
        Ok(PaymentDescriptor { nonce_str, pay_sign, sign_type: "RSA".to_string(), package_str, time_stamp })
    }

    /// The payment provider's callback path. Moves the order to `ToBeConfirmed`, marks it paid,
    /// stamps the checkout time and notifies the paid-order subscribers.
    pub async fn confirm_payment(&self, user_id: i64, order_number: &str) -> Result<Order, OrderFlowError> {
        let order = self
            .db
            .fetch_order_by_number(order_number, user_id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNumberNotFound(order_number.to_string()))?;
        let update = OrderUpdate::to_status(OrderStatus::ToBeConfirmed)
            .with_pay_status(PayStatus::Paid)
            .with_checkout_time(Utc::now());
        let order = self.db.transition_order(order.id, &[OrderStatus::PendingPayment], update).await?;
        info!("🔄️ Order [{}] paid; awaiting confirmation", order.number);
        for producer in &self.producers.order_paid_producer {
            producer.publish_event(OrderPaidEvent::new(order.clone())).await;
        }
        Ok(order)
    }

    /// Customer-initiated cancellation. Only pending or unconfirmed orders can be cancelled; a
    /// paid order additionally gets its payment flagged for refund.
    pub async fn cancel_order(&self, user_id: i64, order_id: i64) -> Result<Order, OrderFlowError> {
        let order = self.fetch_owned_order(user_id, order_id).await?;
        self.cancel_with_reason(order, USER_CANCEL_REASON, false).await
    }

    /// Back-office cancellation with an operator-supplied reason.
    pub async fn cancel_order_by_business(&self, order_id: i64, reason: &str) -> Result<Order, OrderFlowError> {
        let order =
            self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderIdNotFound(order_id))?;
        self.cancel_with_reason(order, reason, false).await
    }

    /// The merchant turns the order down before confirming it. Records the rejection reason
    /// rather than a cancellation reason, but otherwise follows the cancel path.
    pub async fn reject_order(&self, order_id: i64, reason: &str) -> Result<Order, OrderFlowError> {
        let order =
            self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderIdNotFound(order_id))?;
        if order.status != OrderStatus::ToBeConfirmed {
            return Err(OrderFlowError::IllegalTransition {
                order_id,
                from: order.status,
                requested: OrderStatus::Cancelled,
            });
        }
        self.cancel_with_reason(order, reason, true).await
    }

    async fn cancel_with_reason(
        &self,
        order: Order,
        reason: &str,
        rejection: bool,
    ) -> Result<Order, OrderFlowError> {
        let observed = order.status;
        if !matches!(observed, OrderStatus::PendingPayment | OrderStatus::ToBeConfirmed) {
            return Err(OrderFlowError::IllegalTransition {
                order_id: order.id,
                from: observed,
                requested: OrderStatus::Cancelled,
            });
        }
        let refund_due = order.pay_status == PayStatus::Paid;
        let mut update = OrderUpdate::to_status(OrderStatus::Cancelled).with_cancel_time(Utc::now());
        update = if rejection { update.with_rejection_reason(reason) } else { update.with_cancel_reason(reason) };
        if refund_due {
            update = update.with_pay_status(PayStatus::Refund);
        }
        // The guard pins the status the refund decision was made against. If the payment lands
        // between the fetch and this transition, the guard fails and the caller retries against
        // the fresh row instead of cancelling a paid order as unpaid.
        let order = self.db.transition_order(order.id, &[observed], update).await?;
        info!("🔄️ Order [{}] cancelled: {reason}", order.number);
        if refund_due {
            self.refunds.process_refund(&order, order.amount).await;
        }
        for producer in &self.producers.order_cancelled_producer {
            producer.publish_event(OrderCancelledEvent::new(order.clone(), refund_due)).await;
        }
        Ok(order)
    }

    /// ToBeConfirmed → Confirmed. The kitchen has accepted the order.
    pub async fn confirm_order(&self, order_id: i64) -> Result<Order, OrderFlowError> {
        let update = OrderUpdate::to_status(OrderStatus::Confirmed);
        let order = self.db.transition_order(order_id, &[OrderStatus::ToBeConfirmed], update).await?;
        info!("🔄️ Order [{}] confirmed", order.number);
        Ok(order)
    }

    /// Confirmed → DeliveryInProgress.
    pub async fn deliver_order(&self, order_id: i64) -> Result<Order, OrderFlowError> {
        let update = OrderUpdate::to_status(OrderStatus::DeliveryInProgress);
        let order = self.db.transition_order(order_id, &[OrderStatus::Confirmed], update).await?;
        info!("🔄️ Order [{}] is out for delivery", order.number);
        Ok(order)
    }

    /// DeliveryInProgress → Completed, stamping the delivery time.
    pub async fn complete_order(&self, order_id: i64) -> Result<Order, OrderFlowError> {
        let update = OrderUpdate::to_status(OrderStatus::Completed).with_delivery_time(Utc::now());
        let order = self.db.transition_order(order_id, &[OrderStatus::DeliveryInProgress], update).await?;
        info!("🔄️ Order [{}] completed", order.number);
        Ok(order)
    }

    /// Cancels every pending-payment order older than `threshold`. Best effort: an order that
    /// fails to cancel (e.g. it was paid in the meantime) is logged and skipped, and the sweep
    /// carries on. Returns the orders that were cancelled.
    pub async fn sweep_timed_out_orders(&self, threshold: Duration) -> Result<Vec<Order>, OrderFlowError> {
        let cutoff = Utc::now() - threshold;
        let overdue = self.db.fetch_overdue_pending_orders(cutoff).await?;
        if overdue.is_empty() {
            return Ok(Vec::new());
        }
        debug!("🕰️ {} orders are past the payment deadline", overdue.len());
        let mut cancelled = Vec::with_capacity(overdue.len());
        for order in overdue {
            let update = OrderUpdate::to_status(OrderStatus::Cancelled)
                .with_cancel_reason(TIMEOUT_CANCEL_REASON)
                .with_cancel_time(Utc::now());
            match self.db.transition_order(order.id, &[OrderStatus::PendingPayment], update).await {
                Ok(order) => {
                    info!("🕰️ Order [{}] auto-cancelled after payment timeout", order.number);
                    for producer in &self.producers.order_cancelled_producer {
                        producer.publish_event(OrderCancelledEvent::new(order.clone(), false)).await;
                    }
                    cancelled.push(order);
                },
                Err(e) => {
                    warn!("🕰️ Could not auto-cancel order [{}]: {e}", order.number);
                },
            }
        }
        Ok(cancelled)
    }

    /// The order with its line items and the `name*qty;` summary string.
    pub async fn order_detail(&self, order_id: i64) -> Result<OrderView, OrderFlowError> {
        let order =
            self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderIdNotFound(order_id))?;
        let details = self.db.fetch_order_details(order_id).await?;
        Ok(OrderView::new(order, details))
    }

    /// The user's own order history, newest first.
    pub async fn history_orders(
        &self,
        user_id: i64,
        status: Option<OrderStatus>,
        page: i64,
        page_size: i64,
    ) -> Result<Paged<OrderView>, OrderFlowError> {
        let mut filter = OrderQueryFilter::default().with_user_id(user_id).paged(page, page_size);
        filter.status = status;
        self.search_orders(&filter).await
    }

    /// Admin search over all orders, with line items attached to every hit.
    pub async fn search_orders(&self, filter: &OrderQueryFilter) -> Result<Paged<OrderView>, OrderFlowError> {
        let (total, orders) = self.db.search_orders(filter).await?;
        let mut records = Vec::with_capacity(orders.len());
        for order in orders {
            let details = self.db.fetch_order_details(order.id).await?;
            records.push(OrderView::new(order, details));
        }
        Ok(Paged { total, records })
    }

    /// The kitchen dashboard counters.
    pub async fn order_statistics(&self) -> Result<OrderStatistics, OrderFlowError> {
        let to_be_confirmed = self.db.count_orders_in_status(OrderStatus::ToBeConfirmed).await?;
        let confirmed = self.db.count_orders_in_status(OrderStatus::Confirmed).await?;
        let delivery_in_progress = self.db.count_orders_in_status(OrderStatus::DeliveryInProgress).await?;
        Ok(OrderStatistics { to_be_confirmed, confirmed, delivery_in_progress })
    }

    /// "Order again": restages the order's line items as fresh cart rows. Returns the number of
    /// cart rows created.
    pub async fn repeat_order(&self, user_id: i64, order_id: i64) -> Result<usize, OrderFlowError> {
        let count = self.db.repeat_order_to_cart(order_id, user_id).await?;
        info!("🔄️ User #{user_id} re-ordered {count} lines from order #{order_id}");
        Ok(count)
    }

    /// A waiting customer nudges the merchant. No state change; subscribers get a reminder event.
    pub async fn remind_order(&self, order_id: i64) -> Result<(), OrderFlowError> {
        let order =
            self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderIdNotFound(order_id))?;
        debug!("📬️ Reminder requested for order [{}]", order.number);
        for producer in &self.producers.order_reminder_producer {
            producer.publish_event(OrderReminderEvent::new(order.clone())).await;
        }
        Ok(())
    }

    async fn fetch_owned_order(&self, user_id: i64, order_id: i64) -> Result<Order, OrderFlowError> {
        let order =
            self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderIdNotFound(order_id))?;
        if order.user_id != user_id {
            return Err(OrderFlowError::OrderIdNotFound(order_id));
        }
        Ok(order)
    }
}
