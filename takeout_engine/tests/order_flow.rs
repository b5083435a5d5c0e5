//! Integration tests for the order lifecycle, run against a throwaway SQLite database.
mod support;

use std::sync::{
    atomic::{AtomicI32, Ordering},
    Arc,
};

use chrono::{Duration, Utc};
use sqlx::{migrate::MigrateDatabase, Sqlite};
use support::prepare_env::{prepare_test_env, random_db_path};
use takeout_engine::{
    api::{OrderFlowApi, TIMEOUT_CANCEL_REASON, USER_CANCEL_REASON},
    db_types::{OrderStatus, PayStatus},
    events::{EventHandlers, EventHooks},
    order_objects::{OrderQueryFilter, OrderSubmission, OrderUpdate},
    storefront_objects::{NewAddress, NewCartItem, NewCategory, NewDish, NewUser},
    traits::{
        AddressManagement,
        CartManagement,
        CatalogManagement,
        OrderFlowError,
        OrderGatewayDatabase,
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

/// Seeds a user, an address and an enabled dish, and returns their ids.
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
            province_name: "Province".into(),
            city_name: "City".into(),
            district_name: "District".into(),
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

async fn stage_cart(db: &SqliteDatabase, user_id: i64, dish_id: i64, qty: i64) {
    for _ in 0..qty {
        db.add_cart_item(user_id, &NewCartItem::dish(dish_id, "")).await.unwrap();
    }
}

async fn submit(api: &OrderFlowApi<SqliteDatabase>, user_id: i64, address_id: i64) -> i64 {
    let submission = OrderSubmission::new(address_id, 1).with_pack_amount(Money::from_cents(200));
    let receipt = api.submit_order(user_id, &submission).await.unwrap();
    receipt.order_id
}

fn backdate_minutes(minutes: i64) -> chrono::DateTime<Utc> {
    Utc::now() - Duration::minutes(minutes)
}

async fn rewind_order_time(db: &SqliteDatabase, order_id: i64, minutes: i64) {
    sqlx::query("UPDATE orders SET order_time = $1 WHERE id = $2")
        .bind(backdate_minutes(minutes))
        .bind(order_id)
        .execute(db.pool())
        .await
        .unwrap();
}

#[tokio::test]
async fn submission_snapshots_cart_and_address() {
    let db = setup().await;
    let (user_id, address_id, dish_id) = seed_storefront(&db).await;
    stage_cart(&db, user_id, dish_id, 2).await;
    let api = support::order_api(db.clone());

    let submission = OrderSubmission::new(address_id, 1)
        .with_pack_amount(Money::from_cents(200))
        .with_remark("no peanuts");
    let receipt = api.submit_order(user_id, &submission).await.unwrap();
    // 2 × ¥5.00 + ¥2.00 packaging
    assert_eq!(receipt.order_amount, Money::from_cents(1200));

    let view = api.order_detail(receipt.order_id).await.unwrap();
    assert_eq!(view.order.status, OrderStatus::PendingPayment);
    assert_eq!(view.order.pay_status, PayStatus::Unpaid);
    assert_eq!(view.order.consignee, "Alice");
    assert_eq!(view.order.phone, "13800000000");
    assert_eq!(view.order.address, "ProvinceCityDistrict1 Main St");
    assert_eq!(view.order.remark, "no peanuts");
    assert_eq!(view.order_detail_list.len(), 1);
    assert_eq!(view.order_detail_list[0].number, 2);
    assert_eq!(view.order_dishes, "Kung Pao Chicken*2;");
    // the cart was cleared in the same transaction
    assert!(db.list_cart(user_id).await.unwrap().is_empty());
    tear_down(db).await;
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let db = setup().await;
    let (user_id, address_id, _dish_id) = seed_storefront(&db).await;
    let api = support::order_api(db.clone());
    let err = api.submit_order(user_id, &OrderSubmission::new(address_id, 1)).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::EmptyCart));
    tear_down(db).await;
}

#[tokio::test]
async fn failed_submission_leaves_cart_intact() {
    let db = setup().await;
    let (user_id, _address_id, dish_id) = seed_storefront(&db).await;
    stage_cart(&db, user_id, dish_id, 3).await;
    let api = support::order_api(db.clone());
    let err = api.submit_order(user_id, &OrderSubmission::new(9999, 1)).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::AddressNotFound(9999)));
    // nothing was written and the cart still holds the staged line
    let cart = db.list_cart(user_id).await.unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].number, 3);
    let page = api.search_orders(&OrderQueryFilter::default()).await.unwrap();
    assert_eq!(page.total, 0);
    tear_down(db).await;
}

#[tokio::test]
async fn payment_confirmation_fires_paid_hook() {
    let db = setup().await;
    let (user_id, address_id, dish_id) = seed_storefront(&db).await;
    stage_cart(&db, user_id, dish_id, 1).await;

    let paid_count = Arc::new(AtomicI32::new(0));
    let counter = paid_count.clone();
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(move |ev| {
        let counter = counter.clone();
        Box::pin(async move {
            assert_eq!(ev.order.status, OrderStatus::ToBeConfirmed);
            counter.fetch_add(1, Ordering::SeqCst);
        })
    });
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let api = support::order_api_with_producers(db.clone(), producers);
    let order_id = submit(&api, user_id, address_id).await;
    let order = api.order_detail(order_id).await.unwrap().order;

    let paid = api.confirm_payment(user_id, &order.number).await.unwrap();
    assert_eq!(paid.status, OrderStatus::ToBeConfirmed);
    assert_eq!(paid.pay_status, PayStatus::Paid);
    assert!(paid.checkout_time.is_some());

    // a second confirmation must fail without touching the order
    let err = api.confirm_payment(user_id, &order.number).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::IllegalTransition { .. }));

    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;
    assert_eq!(paid_count.load(Ordering::SeqCst), 1);
    tear_down(db).await;
}

#[tokio::test]
async fn user_cancel_before_payment() {
    let db = setup().await;
    let (user_id, address_id, dish_id) = seed_storefront(&db).await;
    stage_cart(&db, user_id, dish_id, 1).await;
    let api = support::order_api(db.clone());
    let order_id = submit(&api, user_id, address_id).await;

    let cancelled = api.cancel_order(user_id, order_id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.pay_status, PayStatus::Unpaid);
    assert_eq!(cancelled.cancel_reason.as_deref(), Some(USER_CANCEL_REASON));
    assert!(cancelled.cancel_time.is_some());
    tear_down(db).await;
}

#[tokio::test]
async fn cancelling_a_paid_order_flags_a_refund() {
    let db = setup().await;
    let (user_id, address_id, dish_id) = seed_storefront(&db).await;
    stage_cart(&db, user_id, dish_id, 1).await;
    let api = support::order_api(db.clone());
    let order_id = submit(&api, user_id, address_id).await;
    let number = api.order_detail(order_id).await.unwrap().order.number;
    api.confirm_payment(user_id, &number).await.unwrap();

    let cancelled = api.cancel_order(user_id, order_id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.pay_status, PayStatus::Refund);
    tear_down(db).await;
}

#[tokio::test]
async fn requesting_payment_records_the_method_without_a_state_change() {
    let db = setup().await;
    let (user_id, address_id, dish_id) = seed_storefront(&db).await;
    stage_cart(&db, user_id, dish_id, 1).await;
    let api = support::order_api(db.clone());
    let order_id = submit(&api, user_id, address_id).await;
    let number = api.order_detail(order_id).await.unwrap().order.number;

    let descriptor = api.request_payment(user_id, &number, 2).await.unwrap();
    assert_eq!(descriptor.sign_type, "RSA");
    assert!(!descriptor.nonce_str.is_empty());
    let order = api.order_detail(order_id).await.unwrap().order;
    assert_eq!(order.status, OrderStatus::PendingPayment);
    assert_eq!(order.pay_status, PayStatus::Unpaid);
    assert_eq!(order.pay_method, 2);

    // only a pending order may request payment
    api.confirm_payment(user_id, &number).await.unwrap();
    let err = api.request_payment(user_id, &number, 2).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::IllegalTransition { .. }));
    tear_down(db).await;
}

#[tokio::test]
async fn a_cancel_decided_on_a_stale_row_cannot_discard_a_payment() {
    let db = setup().await;
    let (user_id, address_id, dish_id) = seed_storefront(&db).await;
    stage_cart(&db, user_id, dish_id, 1).await;
    let api = support::order_api(db.clone());
    let order_id = submit(&api, user_id, address_id).await;
    let number = api.order_detail(order_id).await.unwrap().order.number;

    // the cancel path observed the order as (PendingPayment, Unpaid), then the payment lands
    api.confirm_payment(user_id, &number).await.unwrap();

    // a cancel still pinned to the stale status must fail without writing anything
    let stale = OrderUpdate::to_status(OrderStatus::Cancelled).with_cancel_reason(USER_CANCEL_REASON);
    let err = db.transition_order(order_id, &[OrderStatus::PendingPayment], stale).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::IllegalTransition { .. }));
    let order = api.order_detail(order_id).await.unwrap().order;
    assert_eq!(order.status, OrderStatus::ToBeConfirmed);
    assert_eq!(order.pay_status, PayStatus::Paid);

    // retrying against the fresh row sees the payment and flags the refund
    let cancelled = api.cancel_order(user_id, order_id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.pay_status, PayStatus::Refund);
    tear_down(db).await;
}

#[tokio::test]
async fn rejection_is_only_possible_before_confirmation() {
    let db = setup().await;
    let (user_id, address_id, dish_id) = seed_storefront(&db).await;
    stage_cart(&db, user_id, dish_id, 1).await;
    let api = support::order_api(db.clone());
    let order_id = submit(&api, user_id, address_id).await;
    let number = api.order_detail(order_id).await.unwrap().order.number;
    api.confirm_payment(user_id, &number).await.unwrap();
    api.confirm_order(order_id).await.unwrap();

    let err = api.reject_order(order_id, "out of stock").await.unwrap_err();
    assert!(matches!(err, OrderFlowError::IllegalTransition { .. }));
    // the failed rejection wrote nothing
    let order = api.order_detail(order_id).await.unwrap().order;
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert!(order.rejection_reason.is_none());
    tear_down(db).await;
}

#[tokio::test]
async fn rejecting_a_paid_order_records_reason_and_refund() {
    let db = setup().await;
    let (user_id, address_id, dish_id) = seed_storefront(&db).await;
    stage_cart(&db, user_id, dish_id, 1).await;
    let api = support::order_api(db.clone());
    let order_id = submit(&api, user_id, address_id).await;
    let number = api.order_detail(order_id).await.unwrap().order.number;
    api.confirm_payment(user_id, &number).await.unwrap();

    let rejected = api.reject_order(order_id, "kitchen closed").await.unwrap();
    assert_eq!(rejected.status, OrderStatus::Cancelled);
    assert_eq!(rejected.pay_status, PayStatus::Refund);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("kitchen closed"));
    tear_down(db).await;
}

#[tokio::test]
async fn delivery_walk_is_strictly_ordered() {
    let db = setup().await;
    let (user_id, address_id, dish_id) = seed_storefront(&db).await;
    stage_cart(&db, user_id, dish_id, 1).await;
    let api = support::order_api(db.clone());
    let order_id = submit(&api, user_id, address_id).await;
    let number = api.order_detail(order_id).await.unwrap().order.number;

    // cannot deliver an order that is not confirmed yet
    assert!(matches!(api.deliver_order(order_id).await.unwrap_err(), OrderFlowError::IllegalTransition { .. }));
    api.confirm_payment(user_id, &number).await.unwrap();
    assert!(matches!(api.complete_order(order_id).await.unwrap_err(), OrderFlowError::IllegalTransition { .. }));
    api.confirm_order(order_id).await.unwrap();
    api.deliver_order(order_id).await.unwrap();
    let done = api.complete_order(order_id).await.unwrap();
    assert_eq!(done.status, OrderStatus::Completed);
    assert!(done.delivery_time.is_some());
    // terminal: no further transitions
    assert!(matches!(api.cancel_order(user_id, order_id).await.unwrap_err(), OrderFlowError::IllegalTransition { .. }));
    tear_down(db).await;
}

#[tokio::test]
async fn sweep_cancels_only_overdue_unpaid_orders() {
    let db = setup().await;
    let (user_id, address_id, dish_id) = seed_storefront(&db).await;
    let api = support::order_api(db.clone());

    // an overdue unpaid order (20 minutes old)
    stage_cart(&db, user_id, dish_id, 1).await;
    let overdue_id = submit(&api, user_id, address_id).await;
    rewind_order_time(&db, overdue_id, 20).await;

    // an overdue but paid order
    stage_cart(&db, user_id, dish_id, 1).await;
    let paid_id = submit(&api, user_id, address_id).await;
    let number = api.order_detail(paid_id).await.unwrap().order.number;
    api.confirm_payment(user_id, &number).await.unwrap();
    rewind_order_time(&db, paid_id, 25).await;

    // a fresh unpaid order
    stage_cart(&db, user_id, dish_id, 1).await;
    let fresh_id = submit(&api, user_id, address_id).await;

    let cancelled = api.sweep_timed_out_orders(Duration::minutes(15)).await.unwrap();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].id, overdue_id);
    assert_eq!(cancelled[0].cancel_reason.as_deref(), Some(TIMEOUT_CANCEL_REASON));

    assert_eq!(api.order_detail(paid_id).await.unwrap().order.status, OrderStatus::ToBeConfirmed);
    assert_eq!(api.order_detail(fresh_id).await.unwrap().order.status, OrderStatus::PendingPayment);

    // the sweep is idempotent
    assert!(api.sweep_timed_out_orders(Duration::minutes(15)).await.unwrap().is_empty());
    tear_down(db).await;
}

#[tokio::test]
async fn repeat_order_restages_the_cart() {
    let db = setup().await;
    let (user_id, address_id, dish_id) = seed_storefront(&db).await;
    stage_cart(&db, user_id, dish_id, 3).await;
    let api = support::order_api(db.clone());
    let order_id = submit(&api, user_id, address_id).await;
    assert!(db.list_cart(user_id).await.unwrap().is_empty());

    let restaged = api.repeat_order(user_id, order_id).await.unwrap();
    assert_eq!(restaged, 1);
    let cart = db.list_cart(user_id).await.unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].number, 3);
    assert_eq!(cart[0].dish_id, Some(dish_id));
    tear_down(db).await;
}

#[tokio::test]
async fn statistics_count_the_active_states() {
    let db = setup().await;
    let (user_id, address_id, dish_id) = seed_storefront(&db).await;
    let api = support::order_api(db.clone());

    let mut ids = Vec::new();
    for _ in 0..3 {
        stage_cart(&db, user_id, dish_id, 1).await;
        ids.push(submit(&api, user_id, address_id).await);
    }
    for id in &ids {
        let number = api.order_detail(*id).await.unwrap().order.number;
        api.confirm_payment(user_id, &number).await.unwrap();
    }
    api.confirm_order(ids[0]).await.unwrap();
    api.confirm_order(ids[1]).await.unwrap();
    api.deliver_order(ids[1]).await.unwrap();

    let stats = api.order_statistics().await.unwrap();
    assert_eq!(stats.to_be_confirmed, 1);
    assert_eq!(stats.confirmed, 1);
    assert_eq!(stats.delivery_in_progress, 1);
    tear_down(db).await;
}

#[tokio::test]
async fn reminder_reaches_subscribers_without_state_change() {
    let db = setup().await;
    let (user_id, address_id, dish_id) = seed_storefront(&db).await;
    stage_cart(&db, user_id, dish_id, 1).await;

    let reminders = Arc::new(AtomicI32::new(0));
    let counter = reminders.clone();
    let mut hooks = EventHooks::default();
    hooks.on_order_reminder(move |_ev| {
        let counter = counter.clone();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    });
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let api = support::order_api_with_producers(db.clone(), producers);
    let order_id = submit(&api, user_id, address_id).await;
    let before = api.order_detail(order_id).await.unwrap().order;
    api.remind_order(order_id).await.unwrap();
    let after = api.order_detail(order_id).await.unwrap().order;
    assert_eq!(before, after);

    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;
    assert_eq!(reminders.load(Ordering::SeqCst), 1);

    assert!(matches!(api.remind_order(424242).await.unwrap_err(), OrderFlowError::OrderIdNotFound(_)));
    tear_down(db).await;
}

#[tokio::test]
async fn history_and_search_are_scoped_and_paged() {
    let db = setup().await;
    let (user_id, address_id, dish_id) = seed_storefront(&db).await;
    let api = support::order_api(db.clone());
    for _ in 0..5 {
        stage_cart(&db, user_id, dish_id, 1).await;
        submit(&api, user_id, address_id).await;
    }

    let page = api.history_orders(user_id, None, 1, 2).await.unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.records.len(), 2);
    // newest first
    assert!(page.records[0].order.order_time >= page.records[1].order.order_time);

    let filtered = api
        .search_orders(&OrderQueryFilter::default().with_status(OrderStatus::PendingPayment).with_phone("1380"))
        .await
        .unwrap();
    assert_eq!(filtered.total, 5);
    assert_eq!(filtered.records[0].order_dishes, "Kung Pao Chicken*1;");

    let none = api.search_orders(&OrderQueryFilter::default().with_phone("9999")).await.unwrap();
    assert_eq!(none.total, 0);
    tear_down(db).await;
}
