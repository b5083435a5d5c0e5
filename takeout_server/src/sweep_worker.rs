use std::sync::Arc;

use chrono::Duration;
use log::*;
use takeout_engine::{
    api::OrderFlowApi,
    db_types::Order,
    events::EventProducers,
    refunds::LogOnlyRefunds,
    SqliteDatabase,
};
use tokio::task::JoinHandle;

/// Starts the payment timeout sweep. Do not await the returned JoinHandle, as it will run
/// indefinitely. Each tick cancels the pending-payment orders older than `payment_timeout`;
/// errors are logged and the next tick starts from scratch.
pub fn start_sweep_worker(
    db: SqliteDatabase,
    producers: EventProducers,
    interval_secs: u64,
    payment_timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        let api = OrderFlowApi::new(db, producers, Arc::new(LogOnlyRefunds));
        info!("🕰️ Payment timeout sweep started (every {interval_secs}s, timeout {}m)", payment_timeout.num_minutes());
        loop {
            timer.tick().await;
            debug!("🕰️ Running payment timeout sweep");
            match api.sweep_timed_out_orders(payment_timeout).await {
                Ok(cancelled) if cancelled.is_empty() => {
                    trace!("🕰️ No orders past the payment deadline");
                },
                Ok(cancelled) => {
                    info!("🕰️ {} orders auto-cancelled: {}", cancelled.len(), order_list(&cancelled));
                },
                Err(e) => {
                    error!("🕰️ Error running payment timeout sweep: {e}");
                },
            }
        }
    })
}

fn order_list(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format!("[{}] user_id: {} amount: {}", o.number, o.user_id, o.amount))
        .collect::<Vec<String>>()
        .join(", ")
}
