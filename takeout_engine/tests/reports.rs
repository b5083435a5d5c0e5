//! Integration tests for the back-office reports, run against a throwaway SQLite database.
mod support;

use chrono::{Duration, NaiveDate, Utc};
use sqlx::{migrate::MigrateDatabase, Sqlite};
use support::prepare_env::{prepare_test_env, random_db_path};
use takeout_engine::{
    api::{OrderFlowApi, ReportApi},
    order_objects::OrderSubmission,
    storefront_objects::{NewAddress, NewCartItem, NewCategory, NewDish, NewUser},
    traits::{
        AddressManagement,
        CartManagement,
        CatalogManagement,
        OrderGatewayDatabase,
        ReportError,
        StaffManagement,
    },
    SqliteDatabase,
};
use tko_common::Money;

async fn setup() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

async fn tear_down(db: SqliteDatabase) {
    Sqlite::drop_database(db.url()).await.unwrap();
}

/// Seeds a user, an address and a ¥5.00 dish, and returns their ids.
async fn seed_storefront(db: &SqliteDatabase) -> (i64, i64, i64) {
    let user = db
        .create_user(&NewUser { openid: "openid-1".into(), name: "Alice".into(), ..Default::default() })
        .await
        .unwrap();
    let address = db
        .create_address(&NewAddress {
            user_id: user.id,
            consignee: "Alice".into(),
            phone: "13800000000".into(),
            detail: "1 Main St".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    let category = db.create_category(&NewCategory { category_type: 1, name: "Mains".into(), sort: 1 }).await.unwrap();
    let dish = db
        .create_dish(&NewDish {
            name: "Kung Pao Chicken".into(),
            category_id: category.id,
            price: Money::from_cents(500),
            image: String::new(),
            description: String::new(),
            flavors: vec![],
        })
        .await
        .unwrap();
    (user.id, address.id, dish.id)
}

/// Places an order for `qty` dishes and returns its id.
async fn place_order(
    db: &SqliteDatabase,
    api: &OrderFlowApi<SqliteDatabase>,
    user_id: i64,
    address_id: i64,
    dish_id: i64,
    qty: i64,
) -> i64 {
    for _ in 0..qty {
        db.add_cart_item(user_id, &NewCartItem::dish(dish_id, "")).await.unwrap();
    }
    let receipt = api.submit_order(user_id, &OrderSubmission::new(address_id, 1)).await.unwrap();
    receipt.order_id
}

/// Walks an order through the full happy path to Completed.
async fn complete_order(api: &OrderFlowApi<SqliteDatabase>, user_id: i64, order_id: i64) {
    let number = api.order_detail(order_id).await.unwrap().order.number;
    api.confirm_payment(user_id, &number).await.unwrap();
    api.confirm_order(order_id).await.unwrap();
    api.deliver_order(order_id).await.unwrap();
    api.complete_order(order_id).await.unwrap();
}

async fn rewind_order_days(db: &SqliteDatabase, order_id: i64, days: i64) {
    sqlx::query("UPDATE orders SET order_time = $1 WHERE id = $2")
        .bind(Utc::now() - Duration::days(days))
        .bind(order_id)
        .execute(db.pool())
        .await
        .unwrap();
}

async fn rewind_user_days(db: &SqliteDatabase, user_id: i64, days: i64) {
    sqlx::query("UPDATE user SET create_time = $1 WHERE id = $2")
        .bind(Utc::now() - Duration::days(days))
        .bind(user_id)
        .execute(db.pool())
        .await
        .unwrap();
}

fn day(offset_from_today: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(offset_from_today)
}

#[tokio::test]
async fn turnover_and_order_counts_track_completed_orders_per_day() {
    let db = setup().await;
    let (user_id, address_id, dish_id) = seed_storefront(&db).await;
    let api = support::order_api(db.clone());
    let reports = ReportApi::new(db.clone());

    // yesterday: one completed order for 2 dishes (¥10.00)
    let old_id = place_order(&db, &api, user_id, address_id, dish_id, 2).await;
    complete_order(&api, user_id, old_id).await;
    rewind_order_days(&db, old_id, 1).await;

    // today: one completed order for 3 dishes (¥15.00) and one cancelled order
    let done_id = place_order(&db, &api, user_id, address_id, dish_id, 3).await;
    complete_order(&api, user_id, done_id).await;
    let dropped_id = place_order(&db, &api, user_id, address_id, dish_id, 1).await;
    api.cancel_order(user_id, dropped_id).await.unwrap();

    let turnover = reports.turnover_report(day(1), day(0)).await.unwrap();
    assert_eq!(turnover.days.len(), 2);
    assert_eq!(turnover.days[0].date, day(1));
    assert_eq!(turnover.days[0].turnover, Money::from_cents(1000));
    assert_eq!(turnover.days[1].turnover, Money::from_cents(1500));

    let orders = reports.order_report(day(1), day(0)).await.unwrap();
    assert_eq!(orders.days[0].orders, 1);
    assert_eq!(orders.days[0].completed, 1);
    assert_eq!(orders.days[1].orders, 2);
    assert_eq!(orders.days[1].completed, 1);
    assert_eq!(orders.total_orders, 3);
    assert_eq!(orders.completed_orders, 2);
    assert!((orders.completion_rate - 2.0 / 3.0).abs() < 1e-9);
    tear_down(db).await;
}

#[tokio::test]
async fn top_sales_rank_completed_quantities_only() {
    let db = setup().await;
    let (user_id, address_id, dish_id) = seed_storefront(&db).await;
    let category = db.list_categories(None).await.unwrap().remove(0);
    let rice = db
        .create_dish(&NewDish {
            name: "Rice".into(),
            category_id: category.id,
            price: Money::from_cents(100),
            image: String::new(),
            description: String::new(),
            flavors: vec![],
        })
        .await
        .unwrap();
    let api = support::order_api(db.clone());
    let reports = ReportApi::new(db.clone());

    // completed: 3 chicken + 1 rice
    db.add_cart_item(user_id, &NewCartItem::dish(rice.id, "")).await.unwrap();
    for _ in 0..3 {
        db.add_cart_item(user_id, &NewCartItem::dish(dish_id, "")).await.unwrap();
    }
    let done_id = api.submit_order(user_id, &OrderSubmission::new(address_id, 1)).await.unwrap().order_id;
    complete_order(&api, user_id, done_id).await;

    // cancelled: 5 rice, which must not move the ranking
    let dropped_id = place_order(&db, &api, user_id, address_id, rice.id, 5).await;
    api.cancel_order(user_id, dropped_id).await.unwrap();

    let ranking = reports.top_sales(day(0), day(0)).await.unwrap();
    assert_eq!(ranking.len(), 2);
    assert_eq!(ranking[0].name, "Kung Pao Chicken");
    assert_eq!(ranking[0].number, 3);
    assert_eq!(ranking[1].name, "Rice");
    assert_eq!(ranking[1].number, 1);
    tear_down(db).await;
}

#[tokio::test]
async fn user_growth_is_cumulative() {
    let db = setup().await;
    let (first_user, _address_id, _dish_id) = seed_storefront(&db).await;
    rewind_user_days(&db, first_user, 1).await;
    for i in 0..2 {
        db.create_user(&NewUser { openid: format!("openid-{}", i + 2), ..Default::default() }).await.unwrap();
    }
    let reports = ReportApi::new(db.clone());

    let report = reports.user_report(day(1), day(0)).await.unwrap();
    assert_eq!(report.days.len(), 2);
    assert_eq!(report.days[0].total_users, 1);
    assert_eq!(report.days[0].new_users, 1);
    assert_eq!(report.days[1].total_users, 3);
    assert_eq!(report.days[1].new_users, 2);
    tear_down(db).await;
}

#[tokio::test]
async fn inverted_and_oversized_ranges_are_rejected() {
    let db = setup().await;
    let reports = ReportApi::new(db.clone());
    let err = reports.turnover_report(day(0), day(1)).await.unwrap_err();
    assert!(matches!(err, ReportError::InvalidDateRange(_)));
    let err = reports.order_report(day(400), day(0)).await.unwrap_err();
    assert!(matches!(err, ReportError::InvalidDateRange(_)));
    tear_down(db).await;
}
