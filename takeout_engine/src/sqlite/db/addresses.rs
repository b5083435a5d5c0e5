use sqlx::SqliteConnection;

use crate::{db_types::AddressBook, storefront_objects::NewAddress};

pub async fn insert_address(address: &NewAddress, conn: &mut SqliteConnection) -> Result<AddressBook, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO address_book (
            user_id, consignee, sex, phone,
            province_code, province_name, city_code, city_name, district_code, district_name,
            detail, label, is_default
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 0)
        RETURNING *;
    "#,
    )
    .bind(address.user_id)
    .bind(&address.consignee)
    .bind(&address.sex)
    .bind(&address.phone)
    .bind(&address.province_code)
    .bind(&address.province_name)
    .bind(&address.city_code)
    .bind(&address.city_name)
    .bind(&address.district_code)
    .bind(&address.district_name)
    .bind(&address.detail)
    .bind(&address.label)
    .fetch_one(conn)
    .await
}

pub async fn update_address(address: &AddressBook, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE address_book SET
            consignee = $1, sex = $2, phone = $3,
            province_code = $4, province_name = $5, city_code = $6, city_name = $7,
            district_code = $8, district_name = $9, detail = $10, label = $11
        WHERE id = $12;
    "#,
    )
    .bind(&address.consignee)
    .bind(&address.sex)
    .bind(&address.phone)
    .bind(&address.province_code)
    .bind(&address.province_name)
    .bind(&address.city_code)
    .bind(&address.city_name)
    .bind(&address.district_code)
    .bind(&address.district_name)
    .bind(&address.detail)
    .bind(&address.label)
    .bind(address.id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete_address(id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM address_book WHERE id = $1").bind(id).execute(conn).await?;
    Ok(())
}

pub async fn fetch_address_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<AddressBook>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM address_book WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn list_addresses_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<AddressBook>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM address_book WHERE user_id = $1 ORDER BY id").bind(user_id).fetch_all(conn).await
}

/// Clears the default flag on every address the user owns. Paired with [`mark_default`]; the
/// clear-then-set ordering is what keeps "at most one default per user" true.
pub async fn clear_defaults(user_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE address_book SET is_default = 0 WHERE user_id = $1").bind(user_id).execute(conn).await?;
    Ok(())
}

pub async fn mark_default(id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE address_book SET is_default = 1 WHERE id = $1").bind(id).execute(conn).await?;
    Ok(())
}

pub async fn fetch_default_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<AddressBook>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM address_book WHERE user_id = $1 AND is_default = 1 LIMIT 1")
        .bind(user_id)
        .fetch_optional(conn)
        .await
}
