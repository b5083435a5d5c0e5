//! Integration tests for the cache-aside catalog read paths.
mod support;

use sqlx::{migrate::MigrateDatabase, Sqlite};
use support::prepare_env::{prepare_test_env, random_db_path};
use takeout_engine::{
    api::CatalogApi,
    cache::{dish_cache_key, CacheStore, KeyFilter, MemoryCache},
    storefront_objects::{DishUpdate, NewCategory, NewDish, NewDishFlavor, NewSetMeal, NewSetMealDish},
    traits::OrderGatewayDatabase,
    SqliteDatabase,
};
use tko_common::Money;

async fn setup() -> (SqliteDatabase, CatalogApi<SqliteDatabase, MemoryCache>, MemoryCache) {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let cache = MemoryCache::new();
    let api = CatalogApi::new(db.clone(), cache.clone(), KeyFilter::with_capacity(1024));
    (db, api, cache)
}

async fn tear_down(db: SqliteDatabase) {
    Sqlite::drop_database(db.url()).await.unwrap();
}

fn new_dish(name: &str, category_id: i64, cents: i64) -> NewDish {
    NewDish {
        name: name.into(),
        category_id,
        price: Money::from_cents(cents),
        image: String::new(),
        description: String::new(),
        flavors: vec![],
    }
}

#[tokio::test]
async fn listing_reads_through_and_then_serves_from_cache() {
    let (db, api, cache) = setup().await;
    let category = api.create_category(&NewCategory { category_type: 1, name: "Mains".into(), sort: 1 }).await.unwrap();
    api.create_dish(&new_dish("Mapo Tofu", category.id, 1800)).await.unwrap();

    assert!(cache.is_empty().await);
    let first = api.list_dishes(category.id).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(cache.len().await, 1);

    // delete the row behind the API's back; the cached listing keeps serving until a write evicts
    sqlx::query("DELETE FROM dish").execute(db.pool()).await.unwrap();
    let second = api.list_dishes(category.id).await.unwrap();
    assert_eq!(second, first);
    tear_down(db).await;
}

#[tokio::test]
async fn catalog_writes_evict_their_namespace() {
    let (db, api, _cache) = setup().await;
    let category = api.create_category(&NewCategory { category_type: 1, name: "Mains".into(), sort: 1 }).await.unwrap();
    api.create_dish(&new_dish("Mapo Tofu", category.id, 1800)).await.unwrap();
    assert_eq!(api.list_dishes(category.id).await.unwrap().len(), 1);

    // a second create invalidates, so the next read sees both dishes
    api.create_dish(&new_dish("Twice Cooked Pork", category.id, 2200)).await.unwrap();
    assert_eq!(api.list_dishes(category.id).await.unwrap().len(), 2);

    // disabling a dish evicts too, and the listing only returns enabled rows
    let dishes = api.list_dishes(category.id).await.unwrap();
    api.set_dish_status(dishes[0].id, 0).await.unwrap();
    assert_eq!(api.list_dishes(category.id).await.unwrap().len(), 1);
    tear_down(db).await;
}

#[tokio::test]
async fn dish_writes_leave_the_setmeal_namespace_alone() {
    let (db, api, _cache) = setup().await;
    let dishes = api.create_category(&NewCategory { category_type: 1, name: "Mains".into(), sort: 1 }).await.unwrap();
    let meals = api.create_category(&NewCategory { category_type: 2, name: "Combos".into(), sort: 2 }).await.unwrap();
    let dish = api.create_dish(&new_dish("Rice", dishes.id, 300)).await.unwrap();
    api.create_setmeal(&NewSetMeal {
        name: "Lunch Combo".into(),
        category_id: meals.id,
        price: Money::from_cents(2500),
        image: String::new(),
        description: String::new(),
        dishes: vec![NewSetMealDish { dish_id: dish.id, name: "Rice".into(), price: Money::from_cents(300), copies: 1 }],
    })
    .await
    .unwrap();
    let cached = api.list_setmeals(meals.id).await.unwrap();
    assert_eq!(cached.len(), 1);

    // remove the set-meal row directly, then perform a dish write
    sqlx::query("DELETE FROM setmeal").execute(db.pool()).await.unwrap();
    api.create_dish(&new_dish("Noodles", dishes.id, 1200)).await.unwrap();

    // the set-meal cache entry survived the dish-namespace eviction
    assert_eq!(api.list_setmeals(meals.id).await.unwrap(), cached);
    tear_down(db).await;
}

#[tokio::test]
async fn filter_swallows_probes_for_unknown_keys() {
    let (db, api, cache) = setup().await;
    // rows written without going through the API never seed the filter
    sqlx::query(
        "INSERT INTO dish (name, category_id, price, image, description, status, create_time, update_time)
         VALUES ('Ghost Dish', 77, 100, '', '', 1, datetime('now'), datetime('now'))",
    )
    .execute(db.pool())
    .await
    .unwrap();

    assert!(api.list_dishes(77).await.unwrap().is_empty());
    // the rejected probe never touched the cache either
    assert!(cache.get(&dish_cache_key(77)).await.is_none());
    tear_down(db).await;
}

#[tokio::test]
async fn created_categories_pass_the_filter_before_any_dish_exists() {
    let (db, api, _cache) = setup().await;
    let category = api.create_category(&NewCategory { category_type: 1, name: "Empty".into(), sort: 9 }).await.unwrap();
    // seeded by create_category, so the read goes to the database and caches an empty listing
    assert!(api.list_dishes(category.id).await.unwrap().is_empty());
    assert!(api.list_setmeals(category.id).await.unwrap().is_empty());
    tear_down(db).await;
}

#[tokio::test]
async fn dish_update_replaces_the_flavor_set() {
    let (db, api, _cache) = setup().await;
    let category = api.create_category(&NewCategory { category_type: 1, name: "Mains".into(), sort: 1 }).await.unwrap();
    let mut dish = new_dish("Dan Dan Noodles", category.id, 1500);
    dish.flavors = vec![NewDishFlavor { name: "spiciness".into(), value: r#"["mild","hot"]"#.into() }];
    let dish = api.create_dish(&dish).await.unwrap();
    assert_eq!(api.dish_flavors(dish.id).await.unwrap().len(), 1);

    let update = DishUpdate {
        id: dish.id,
        name: "Dan Dan Noodles".into(),
        category_id: category.id,
        price: Money::from_cents(1600),
        image: String::new(),
        description: String::new(),
        flavors: vec![
            NewDishFlavor { name: "spiciness".into(), value: r#"["mild","hot","extra hot"]"#.into() },
            NewDishFlavor { name: "portion".into(), value: r#"["regular","large"]"#.into() },
        ],
    };
    let updated = api.update_dish(&update).await.unwrap();
    assert_eq!(updated.price, Money::from_cents(1600));
    let flavors = api.dish_flavors(dish.id).await.unwrap();
    assert_eq!(flavors.len(), 2);
    tear_down(db).await;
}
