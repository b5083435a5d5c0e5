use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderDetail, OrderStatus, PayStatus, ShoppingCart},
    order_objects::{OrderQueryFilter, OrderUpdate},
    traits::OrderFlowError,
};

/// Inserts a new order row. Not atomic by itself; embed the call in a transaction together with
/// the detail insertion and the cart clear.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderFlowError> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                number,
                status,
                user_id,
                address_book_id,
                order_time,
                estimated_delivery_time,
                pay_method,
                pay_status,
                amount,
                pack_amount,
                remark,
                user_name,
                phone,
                address,
                consignee,
                delivery_status,
                tableware_number,
                tableware_status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING *;
        "#,
    )
    .bind(order.number)
    .bind(OrderStatus::PendingPayment)
    .bind(order.user_id)
    .bind(order.address_book_id)
    .bind(Utc::now())
    .bind(order.estimated_delivery_time)
    .bind(order.pay_method)
    .bind(PayStatus::Unpaid)
    .bind(order.amount)
    .bind(order.pack_amount)
    .bind(order.remark)
    .bind(order.user_name)
    .bind(order.phone)
    .bind(order.address)
    .bind(order.consignee)
    .bind(order.delivery_status)
    .bind(order.tableware_number)
    .bind(order.tableware_status)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order [{}] inserted with id {}", order.number, order.id);
    Ok(order)
}

/// Creates one detail row per cart line for the given order.
pub async fn insert_details_from_cart(
    order_id: i64,
    cart: &[ShoppingCart],
    conn: &mut SqliteConnection,
) -> Result<(), OrderFlowError> {
    for line in cart {
        sqlx::query(
            r#"
            INSERT INTO order_detail (name, image, order_id, dish_id, setmeal_id, dish_flavor, number, amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8);
        "#,
        )
        .bind(&line.name)
        .bind(&line.image)
        .bind(order_id)
        .bind(line.dish_id)
        .bind(line.setmeal_id)
        .bind(&line.dish_flavor)
        .bind(line.number)
        .bind(line.amount)
        .execute(&mut *conn)
        .await?;
    }
    trace!("📝️ {} detail rows written for order #{order_id}", cart.len());
    Ok(())
}

pub async fn fetch_order_by_id(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await
}

pub async fn fetch_order_by_number(
    number: &str,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE number = $1 AND user_id = $2")
        .bind(number)
        .bind(user_id)
        .fetch_optional(conn)
        .await
}

pub async fn fetch_details_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderDetail>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_detail WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await
}

/// The guarded transition at the heart of the lifecycle. Re-reads the current status and applies
/// the update only when it is one of `expected`; otherwise nothing is written and
/// [`OrderFlowError::IllegalTransition`] is returned. Run inside a transaction so the check and
/// the write are a single atomic step.
pub async fn transition_order(
    order_id: i64,
    expected: &[OrderStatus],
    update: OrderUpdate,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderFlowError> {
    let current = fetch_order_by_id(order_id, &mut *conn)
        .await?
        .ok_or(OrderFlowError::OrderIdNotFound(order_id))?;
    if !expected.contains(&current.status) {
        let requested = update.status.unwrap_or(current.status);
        return Err(OrderFlowError::IllegalTransition { order_id, from: current.status, requested });
    }
    if update.is_empty() {
        return Ok(current);
    }
    let mut builder = QueryBuilder::new("UPDATE orders SET ");
    let mut set_clause = builder.separated(", ");
    if let Some(status) = update.status {
        set_clause.push("status = ");
        set_clause.push_bind_unseparated(status);
    }
    if let Some(pay_status) = update.pay_status {
        set_clause.push("pay_status = ");
        set_clause.push_bind_unseparated(pay_status);
    }
    if let Some(pay_method) = update.pay_method {
        set_clause.push("pay_method = ");
        set_clause.push_bind_unseparated(pay_method);
    }
    if let Some(t) = update.checkout_time {
        set_clause.push("checkout_time = ");
        set_clause.push_bind_unseparated(t);
    }
    if let Some(t) = update.cancel_time {
        set_clause.push("cancel_time = ");
        set_clause.push_bind_unseparated(t);
    }
    if let Some(t) = update.delivery_time {
        set_clause.push("delivery_time = ");
        set_clause.push_bind_unseparated(t);
    }
    if let Some(reason) = update.cancel_reason {
        set_clause.push("cancel_reason = ");
        set_clause.push_bind_unseparated(reason);
    }
    if let Some(reason) = update.rejection_reason {
        set_clause.push("rejection_reason = ");
        set_clause.push_bind_unseparated(reason);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(order_id);
    builder.push(" RETURNING *");
    trace!("📝️ Executing query: {}", builder.sql());
    let order = builder.build_query_as::<Order>().fetch_one(conn).await?;
    Ok(order)
}

fn push_filter_clauses<'a>(builder: &mut QueryBuilder<'a, sqlx::Sqlite>, filter: &'a OrderQueryFilter) {
    if !filter.has_criteria() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(number) = &filter.number {
        where_clause.push("number LIKE ");
        where_clause.push_bind_unseparated(format!("%{number}%"));
    }
    if let Some(phone) = &filter.phone {
        where_clause.push("phone LIKE ");
        where_clause.push_bind_unseparated(format!("%{phone}%"));
    }
    if let Some(status) = filter.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status);
    }
    if let Some(user_id) = filter.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(since) = filter.since {
        where_clause.push("order_time >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = filter.until {
        where_clause.push("order_time <= ");
        where_clause.push_bind_unseparated(until);
    }
}

/// Fetches one page of orders matching the filter, newest first.
pub async fn search_orders(
    filter: &OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders");
    push_filter_clauses(&mut builder, filter);
    builder.push(" ORDER BY order_time DESC LIMIT ");
    builder.push_bind(filter.page_size);
    builder.push(" OFFSET ");
    builder.push_bind(filter.offset());
    trace!("📝️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("📝️ Result of search_orders: {:?}", orders.len());
    Ok(orders)
}

pub async fn count_orders(filter: &OrderQueryFilter, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM orders");
    push_filter_clauses(&mut builder, filter);
    let (count,): (i64,) = builder.build_query_as().fetch_one(conn).await?;
    Ok(count)
}

pub async fn count_orders_in_status(
    status: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM orders WHERE status = $1").bind(status).fetch_one(conn).await?;
    Ok(count)
}

/// Candidates for the timeout sweep: pending-payment orders placed before `cutoff`.
pub async fn fetch_overdue_pending_orders(
    cutoff: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE status = $1 AND order_time < $2")
        .bind(OrderStatus::PendingPayment)
        .bind(cutoff)
        .fetch_all(conn)
        .await
}
