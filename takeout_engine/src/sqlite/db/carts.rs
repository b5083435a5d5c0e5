use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;
use tko_common::Money;

use crate::{db_types::ShoppingCart, storefront_objects::NewCartItem};

/// Finds the cart line matching the (item, flavor) combination for the user, if any.
pub async fn find_cart_line(
    user_id: i64,
    item: &NewCartItem,
    conn: &mut SqliteConnection,
) -> Result<Option<ShoppingCart>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT * FROM shopping_cart
        WHERE user_id = $1
          AND dish_id IS $2
          AND setmeal_id IS $3
          AND dish_flavor = $4
        LIMIT 1
    "#,
    )
    .bind(user_id)
    .bind(item.dish_id)
    .bind(item.setmeal_id)
    .bind(&item.dish_flavor)
    .fetch_optional(conn)
    .await
}

/// Inserts a fresh cart line with quantity 1 and the given display snapshot.
pub async fn insert_cart_line(
    user_id: i64,
    item: &NewCartItem,
    name: &str,
    image: &str,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<ShoppingCart, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO shopping_cart (name, image, user_id, dish_id, setmeal_id, dish_flavor, number, amount, create_time)
        VALUES ($1, $2, $3, $4, $5, $6, 1, $7, $8)
        RETURNING *;
    "#,
    )
    .bind(name)
    .bind(image)
    .bind(user_id)
    .bind(item.dish_id)
    .bind(item.setmeal_id)
    .bind(&item.dish_flavor)
    .bind(amount)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
}

/// Adjusts the quantity of an existing line by `delta`, returning the updated line.
pub async fn bump_cart_line(
    line_id: i64,
    delta: i64,
    conn: &mut SqliteConnection,
) -> Result<ShoppingCart, sqlx::Error> {
    sqlx::query_as("UPDATE shopping_cart SET number = number + $1 WHERE id = $2 RETURNING *")
        .bind(delta)
        .bind(line_id)
        .fetch_one(conn)
        .await
}

pub async fn delete_cart_line(line_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM shopping_cart WHERE id = $1").bind(line_id).execute(conn).await?;
    Ok(())
}

/// The user's cart, newest line first.
pub async fn list_cart(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<ShoppingCart>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM shopping_cart WHERE user_id = $1 ORDER BY create_time DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await
}

pub async fn clear_cart(user_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM shopping_cart WHERE user_id = $1").bind(user_id).execute(conn).await?;
    trace!("📝️ Cleared {} cart lines for user #{user_id}", result.rows_affected());
    Ok(result.rows_affected())
}

/// Re-stages previously ordered line items as cart rows with fresh ids. Used by "order again".
pub async fn insert_cart_lines_from_details(
    user_id: i64,
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<usize, sqlx::Error> {
    let details: Vec<(String, String, Option<i64>, Option<i64>, String, i64, Money)> = sqlx::query_as(
        "SELECT name, image, dish_id, setmeal_id, dish_flavor, number, amount FROM order_detail WHERE order_id = $1",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    let count = details.len();
    for (name, image, dish_id, setmeal_id, dish_flavor, number, amount) in details {
        sqlx::query(
            r#"
            INSERT INTO shopping_cart (name, image, user_id, dish_id, setmeal_id, dish_flavor, number, amount, create_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9);
        "#,
        )
        .bind(name)
        .bind(image)
        .bind(user_id)
        .bind(dish_id)
        .bind(setmeal_id)
        .bind(dish_flavor)
        .bind(number)
        .bind(amount)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;
    }
    Ok(count)
}
