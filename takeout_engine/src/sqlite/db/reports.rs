use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tko_common::Money;

use crate::{db_types::OrderStatus, report_objects::ItemSales};

/// Revenue from completed orders placed in `[from, until)`.
pub async fn turnover_between(
    from: DateTime<Utc>,
    until: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Money, sqlx::Error> {
    let (cents,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(amount), 0) FROM orders WHERE status = $1 AND order_time >= $2 AND order_time < $3",
    )
    .bind(OrderStatus::Completed)
    .bind(from)
    .bind(until)
    .fetch_one(conn)
    .await?;
    Ok(Money::from_cents(cents))
}

/// Orders placed in `[from, until)`, optionally restricted to one status.
pub async fn count_orders_between(
    from: DateTime<Utc>,
    until: DateTime<Utc>,
    status: Option<OrderStatus>,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = match status {
        Some(status) => {
            sqlx::query_as(
                "SELECT COUNT(*) FROM orders WHERE status = $1 AND order_time >= $2 AND order_time < $3",
            )
            .bind(status)
            .bind(from)
            .bind(until)
            .fetch_one(conn)
            .await?
        },
        None => {
            sqlx::query_as("SELECT COUNT(*) FROM orders WHERE order_time >= $1 AND order_time < $2")
                .bind(from)
                .bind(until)
                .fetch_one(conn)
                .await?
        },
    };
    Ok(count)
}

/// Users registered before `until`, or within `[from, until)` when `from` is given.
pub async fn count_users_between(
    from: Option<DateTime<Utc>>,
    until: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = match from {
        Some(from) => {
            sqlx::query_as("SELECT COUNT(*) FROM user WHERE create_time >= $1 AND create_time < $2")
                .bind(from)
                .bind(until)
                .fetch_one(conn)
                .await?
        },
        None => {
            sqlx::query_as("SELECT COUNT(*) FROM user WHERE create_time < $1").bind(until).fetch_one(conn).await?
        },
    };
    Ok(count)
}

/// The best sellers across completed orders in `[from, until)`. Grouped by the name snapshot in
/// the detail rows, quantity-descending.
pub async fn top_selling_items(
    from: DateTime<Utc>,
    until: DateTime<Utc>,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<ItemSales>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT order_detail.name AS name, SUM(order_detail.number) AS number
        FROM order_detail
        JOIN orders ON order_detail.order_id = orders.id
        WHERE orders.status = $1 AND orders.order_time >= $2 AND orders.order_time < $3
        GROUP BY order_detail.name
        ORDER BY number DESC
        LIMIT $4
    "#,
    )
    .bind(OrderStatus::Completed)
    .bind(from)
    .bind(until)
    .bind(limit)
    .fetch_all(conn)
    .await
}
