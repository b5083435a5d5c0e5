use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Employee, User},
    storefront_objects::{NewEmployee, NewUser},
};

/// Inserts an employee row. The password is stored verbatim; callers hash it first.
pub async fn insert_employee(employee: &NewEmployee, conn: &mut SqliteConnection) -> Result<Employee, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as(
        r#"
        INSERT INTO employee (name, username, password, phone, sex, id_number, status, create_time, update_time)
        VALUES ($1, $2, $3, $4, $5, $6, 1, $7, $7)
        RETURNING *;
    "#,
    )
    .bind(&employee.name)
    .bind(&employee.username)
    .bind(&employee.password)
    .bind(&employee.phone)
    .bind(&employee.sex)
    .bind(&employee.id_number)
    .bind(now)
    .fetch_one(conn)
    .await
}

pub async fn update_employee(employee: &Employee, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE employee SET name = $1, username = $2, password = $3, phone = $4, sex = $5, id_number = $6,
            status = $7, update_time = $8
        WHERE id = $9;
    "#,
    )
    .bind(&employee.name)
    .bind(&employee.username)
    .bind(&employee.password)
    .bind(&employee.phone)
    .bind(&employee.sex)
    .bind(&employee.id_number)
    .bind(employee.status)
    .bind(Utc::now())
    .bind(employee.id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_employee_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Employee>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM employee WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_employee_by_username(
    username: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Employee>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM employee WHERE username = $1").bind(username).fetch_optional(conn).await
}

pub async fn set_employee_status(id: i64, status: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE employee SET status = $1, update_time = $2 WHERE id = $3")
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn insert_user(user: &NewUser, conn: &mut SqliteConnection) -> Result<User, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO user (openid, name, phone, avatar, create_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *;
    "#,
    )
    .bind(&user.openid)
    .bind(&user.name)
    .bind(&user.phone)
    .bind(&user.avatar)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
}

pub async fn fetch_user_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM user WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_user_by_openid(openid: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM user WHERE openid = $1").bind(openid).fetch_optional(conn).await
}
