use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{db_types::OrderStatus, report_objects::ItemSales};
use tko_common::Money;

/// The aggregate queries behind the back-office reports. All ranges are half-open:
/// `from <= t < until`.
#[allow(async_fn_in_trait)]
pub trait SalesReporting: Clone {
    /// The summed amount of completed orders placed in the range.
    async fn turnover_between(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> Result<Money, ReportError>;

    /// The number of orders placed in the range, optionally restricted to one status.
    async fn count_orders_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        status: Option<OrderStatus>,
    ) -> Result<i64, ReportError>;

    /// The number of users registered before `until`, or within `[from, until)` when `from` is
    /// given.
    async fn count_users_between(
        &self,
        from: Option<DateTime<Utc>>,
        until: DateTime<Utc>,
    ) -> Result<i64, ReportError>;

    /// The best-selling items across completed orders in the range, quantity-descending.
    async fn top_selling_items(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ItemSales>, ReportError>;
}

#[derive(Debug, Clone, Error)]
pub enum ReportError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),
}

impl From<sqlx::Error> for ReportError {
    fn from(e: sqlx::Error) -> Self {
        ReportError::DatabaseError(e.to_string())
    }
}
