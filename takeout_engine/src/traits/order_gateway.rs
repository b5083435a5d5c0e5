use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{Order, OrderDetail, OrderStatus},
    order_objects::{OrderQueryFilter, OrderSubmission, OrderUpdate},
};

/// The storage contract for the order lifecycle.
///
/// Implementations must guarantee two things above all:
/// * `submit_order` is atomic: the order row, its detail rows and the cart clear commit together
///   or not at all.
/// * `transition_order` re-reads the current status inside the same transaction as the mutation
///   and fails without writing anything when the status is not in `expected`.
#[allow(async_fn_in_trait)]
pub trait OrderGatewayDatabase: Clone {
    /// The URL of the database.
    fn url(&self) -> &str;

    /// Creates the order and its detail rows from the user's shopping cart, then clears the cart,
    /// all in a single transaction.
    ///
    /// Fails with [`OrderFlowError::EmptyCart`] if the user has nothing staged, and with
    /// [`OrderFlowError::AddressNotFound`] if the submission references a nonexistent address.
    /// The consignee/phone/address fields are snapshotted from the address book row.
    async fn submit_order(
        &self,
        user_id: i64,
        submission: &OrderSubmission,
        number: &str,
    ) -> Result<Order, OrderFlowError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;

    /// Looks an order up by its human-readable number, scoped to its owner.
    async fn fetch_order_by_number(&self, number: &str, user_id: i64) -> Result<Option<Order>, OrderFlowError>;

    async fn fetch_order_details(&self, order_id: i64) -> Result<Vec<OrderDetail>, OrderFlowError>;

    /// Applies `update` to the order if and only if its current status is one of `expected`.
    /// Returns the updated row, or [`OrderFlowError::IllegalTransition`] without any change.
    async fn transition_order(
        &self,
        order_id: i64,
        expected: &[OrderStatus],
        update: OrderUpdate,
    ) -> Result<Order, OrderFlowError>;

    /// Fetches one page of orders matching the filter, newest first, along with the total count
    /// of matching rows.
    async fn search_orders(&self, filter: &OrderQueryFilter) -> Result<(i64, Vec<Order>), OrderFlowError>;

    async fn count_orders_in_status(&self, status: OrderStatus) -> Result<i64, OrderFlowError>;

    /// The timeout sweep's candidate query: pending-payment orders placed before `cutoff`.
    async fn fetch_overdue_pending_orders(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, OrderFlowError>;

    /// Re-materializes the order's detail rows as fresh cart rows for `user_id`, preserving
    /// quantities and flavors. Returns the number of cart rows created.
    async fn repeat_order_to_cart(&self, order_id: i64, user_id: i64) -> Result<usize, OrderFlowError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), OrderFlowError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("No order with number {0} exists for this user")]
    OrderNumberNotFound(String),
    #[error("Address book entry {0} does not exist")]
    AddressNotFound(i64),
    #[error("The shopping cart is empty; there is nothing to order")]
    EmptyCart,
    #[error("Order {order_id} is {from}; the requested change to {requested} is not allowed")]
    IllegalTransition { order_id: i64, from: OrderStatus, requested: OrderStatus },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}
