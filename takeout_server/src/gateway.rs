//! A stand-in for the payment provider.
//!
//! Production deployments receive a webhook from the real provider, which lands on
//! [`OrderFlowApi::confirm_payment`]. Until one is wired up, `MockPaymentGateway` plays that
//! role: it waits a configurable delay after a payment request and then invokes the same
//! confirmation path the webhook would.
use std::sync::Arc;

use log::*;
use takeout_engine::{api::OrderFlowApi, events::EventProducers, refunds::LogOnlyRefunds, SqliteDatabase};
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct MockPaymentGateway {
    db: SqliteDatabase,
    producers: EventProducers,
    delay_ms: u64,
}

impl MockPaymentGateway {
    pub fn new(db: SqliteDatabase, producers: EventProducers, delay_ms: u64) -> Self {
        Self { db, producers, delay_ms }
    }

    /// Schedules a simulated payment confirmation for the order. Returns the task handle; tests
    /// await it, the daemon lets it run free.
    pub fn simulate_payment(&self, user_id: i64, order_number: &str) -> JoinHandle<()> {
        let db = self.db.clone();
        let producers = self.producers.clone();
        let delay_ms = self.delay_ms;
        let order_number = order_number.to_string();
        info!("💳️ Mock gateway will confirm order [{order_number}] in {delay_ms}ms");
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
            let api = OrderFlowApi::new(db, producers, Arc::new(LogOnlyRefunds));
            match api.confirm_payment(user_id, &order_number).await {
                Ok(order) => info!("💳️ Mock gateway confirmed payment for order [{}]", order.number),
                Err(e) => warn!("💳️ Mock gateway could not confirm order [{order_number}]: {e}"),
            }
        })
    }
}
