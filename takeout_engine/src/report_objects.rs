//! Aggregates served by the back-office reporting screens. All of these are computed at read
//! time from the order and user tables; nothing here is stored.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tko_common::Money;

/// One day of revenue. Only completed orders count towards turnover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTurnover {
    pub date: NaiveDate,
    pub turnover: Money,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnoverReport {
    pub days: Vec<DailyTurnover>,
}

/// One day of user growth: the running total of registered users alongside the sign-ups on the
/// day itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUserCount {
    pub date: NaiveDate,
    pub total_users: i64,
    pub new_users: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserReport {
    pub days: Vec<DailyUserCount>,
}

/// One day of order volume. `completed` counts the orders that reached the terminal Completed
/// state; everything else (cancelled included) only shows up in `orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyOrderCount {
    pub date: NaiveDate,
    pub orders: i64,
    pub completed: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderReport {
    pub days: Vec<DailyOrderCount>,
    pub total_orders: i64,
    pub completed_orders: i64,
    /// `completed_orders / total_orders`, or zero when no orders were placed in the range.
    pub completion_rate: f64,
}

/// A row of the sales ranking: an item name with the total quantity sold across completed orders.
/// Grouped by the name snapshotted into the order details, so a renamed dish starts a new row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ItemSales {
    pub name: String,
    pub number: i64,
}
