use chrono::Utc;
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Category, Dish, DishFlavor, SetMeal, SetMealDish},
    storefront_objects::{NewCategory, NewDish, NewDishFlavor, NewSetMeal, NewSetMealDish},
};

//--------------------------------------     Categories      ---------------------------------------------------------

pub async fn insert_category(category: &NewCategory, conn: &mut SqliteConnection) -> Result<Category, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as(
        r#"
        INSERT INTO category (category_type, name, sort, status, create_time, update_time)
        VALUES ($1, $2, $3, 1, $4, $4)
        RETURNING *;
    "#,
    )
    .bind(category.category_type)
    .bind(&category.name)
    .bind(category.sort)
    .bind(now)
    .fetch_one(conn)
    .await
}

pub async fn list_categories(
    category_type: Option<i64>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Category>, sqlx::Error> {
    match category_type {
        Some(t) => {
            sqlx::query_as("SELECT * FROM category WHERE category_type = $1 ORDER BY sort, id")
                .bind(t)
                .fetch_all(conn)
                .await
        },
        None => sqlx::query_as("SELECT * FROM category ORDER BY sort, id").fetch_all(conn).await,
    }
}

pub async fn set_category_status(id: i64, status: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE category SET status = $1, update_time = $2 WHERE id = $3")
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn delete_category(id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM category WHERE id = $1").bind(id).execute(conn).await?;
    Ok(())
}

//--------------------------------------       Dishes        ---------------------------------------------------------

/// Inserts the dish row only. Flavor rows are written by [`insert_dish_flavors`]; run both inside
/// one transaction so the dish and its flavors commit together.
pub async fn insert_dish(dish: &NewDish, conn: &mut SqliteConnection) -> Result<Dish, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as(
        r#"
        INSERT INTO dish (name, category_id, price, image, description, status, create_time, update_time)
        VALUES ($1, $2, $3, $4, $5, 1, $6, $6)
        RETURNING *;
    "#,
    )
    .bind(&dish.name)
    .bind(dish.category_id)
    .bind(dish.price)
    .bind(&dish.image)
    .bind(&dish.description)
    .bind(now)
    .fetch_one(conn)
    .await
}

pub async fn update_dish_row(
    id: i64,
    name: &str,
    category_id: i64,
    price: tko_common::Money,
    image: &str,
    description: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Dish>, sqlx::Error> {
    sqlx::query_as(
        r#"
        UPDATE dish SET name = $1, category_id = $2, price = $3, image = $4, description = $5, update_time = $6
        WHERE id = $7
        RETURNING *;
    "#,
    )
    .bind(name)
    .bind(category_id)
    .bind(price)
    .bind(image)
    .bind(description)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn insert_dish_flavors(
    dish_id: i64,
    flavors: &[NewDishFlavor],
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    for flavor in flavors {
        sqlx::query("INSERT INTO dish_flavor (dish_id, name, value) VALUES ($1, $2, $3)")
            .bind(dish_id)
            .bind(&flavor.name)
            .bind(&flavor.value)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub async fn delete_dish_flavors(dish_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM dish_flavor WHERE dish_id = $1").bind(dish_id).execute(conn).await?;
    Ok(())
}

pub async fn fetch_dish_flavors(dish_id: i64, conn: &mut SqliteConnection) -> Result<Vec<DishFlavor>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM dish_flavor WHERE dish_id = $1 ORDER BY id").bind(dish_id).fetch_all(conn).await
}

pub async fn delete_dishes(ids: &[i64], conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    if ids.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::new("DELETE FROM dish WHERE id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    builder.push(")");
    trace!("📝️ Executing query: {}", builder.sql());
    builder.build().execute(conn).await?;
    Ok(())
}

pub async fn set_dish_status(id: i64, status: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE dish SET status = $1, update_time = $2 WHERE id = $3")
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_dish_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Dish>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM dish WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn list_enabled_dishes(category_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Dish>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM dish WHERE category_id = $1 AND status = 1 ORDER BY id")
        .bind(category_id)
        .fetch_all(conn)
        .await
}

//--------------------------------------      Set-meals      ---------------------------------------------------------

pub async fn insert_setmeal(setmeal: &NewSetMeal, conn: &mut SqliteConnection) -> Result<SetMeal, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as(
        r#"
        INSERT INTO setmeal (name, category_id, price, image, description, status, create_time, update_time)
        VALUES ($1, $2, $3, $4, $5, 1, $6, $6)
        RETURNING *;
    "#,
    )
    .bind(&setmeal.name)
    .bind(setmeal.category_id)
    .bind(setmeal.price)
    .bind(&setmeal.image)
    .bind(&setmeal.description)
    .bind(now)
    .fetch_one(conn)
    .await
}

pub async fn update_setmeal_row(
    id: i64,
    name: &str,
    category_id: i64,
    price: tko_common::Money,
    image: &str,
    description: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<SetMeal>, sqlx::Error> {
    sqlx::query_as(
        r#"
        UPDATE setmeal SET name = $1, category_id = $2, price = $3, image = $4, description = $5, update_time = $6
        WHERE id = $7
        RETURNING *;
    "#,
    )
    .bind(name)
    .bind(category_id)
    .bind(price)
    .bind(image)
    .bind(description)
    .bind(Utc::now())
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn insert_setmeal_dishes(
    setmeal_id: i64,
    dishes: &[NewSetMealDish],
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    for dish in dishes {
        sqlx::query("INSERT INTO setmeal_dish (setmeal_id, dish_id, name, price, copies) VALUES ($1, $2, $3, $4, $5)")
            .bind(setmeal_id)
            .bind(dish.dish_id)
            .bind(&dish.name)
            .bind(dish.price)
            .bind(dish.copies)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub async fn delete_setmeal_dishes(setmeal_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM setmeal_dish WHERE setmeal_id = $1").bind(setmeal_id).execute(conn).await?;
    Ok(())
}

pub async fn fetch_setmeal_dishes(
    setmeal_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<SetMealDish>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM setmeal_dish WHERE setmeal_id = $1 ORDER BY id")
        .bind(setmeal_id)
        .fetch_all(conn)
        .await
}

pub async fn delete_setmeals(ids: &[i64], conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    if ids.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::new("DELETE FROM setmeal WHERE id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    builder.push(")");
    builder.build().execute(conn).await?;
    Ok(())
}

pub async fn set_setmeal_status(id: i64, status: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE setmeal SET status = $1, update_time = $2 WHERE id = $3")
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_setmeal_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<SetMeal>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM setmeal WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn list_enabled_setmeals(
    category_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<SetMeal>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM setmeal WHERE category_id = $1 AND status = 1 ORDER BY id")
        .bind(category_id)
        .fetch_all(conn)
        .await
}
