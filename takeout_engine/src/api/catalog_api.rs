//! Catalog CRUD with cache-aside reads.
//!
//! The consumer listing paths (`list_dishes`, `list_setmeals`) are the hot spots: they read
//! through a [`CacheStore`] keyed per category, with a [`KeyFilter`] in front so probes for
//! categories that were never cached return empty without a database round trip. Writes go to
//! the database first and then evict the whole namespace for the entity type, so the next read
//! repopulates fresh.
use log::*;

use crate::{
    cache::{dish_cache_key, setmeal_cache_key, CacheStore, KeyFilter, DISH_CACHE_PREFIX, SETMEAL_CACHE_PREFIX},
    db_types::{Category, Dish, DishFlavor, SetMeal, SetMealDish},
    storefront_objects::{DishUpdate, NewCategory, NewDish, NewSetMeal, SetMealUpdate},
    traits::{CatalogManagement, StorefrontError},
};

pub struct CatalogApi<B, C> {
    db: B,
    cache: C,
    filter: KeyFilter,
}

impl<B, C> CatalogApi<B, C>
where
    B: CatalogManagement,
    C: CacheStore,
{
    pub fn new(db: B, cache: C, filter: KeyFilter) -> Self {
        Self { db, cache, filter }
    }

    //------------------------------------    Categories      -----------------------------------------------------

    pub async fn create_category(&self, category: &NewCategory) -> Result<Category, StorefrontError> {
        let category = self.db.create_category(category).await?;
        // A new category invalidates nothing yet, but its listing keys must pass the filter.
        self.filter.insert(&dish_cache_key(category.id));
        self.filter.insert(&setmeal_cache_key(category.id));
        Ok(category)
    }

    pub async fn list_categories(&self, category_type: Option<i64>) -> Result<Vec<Category>, StorefrontError> {
        self.db.list_categories(category_type).await
    }

    pub async fn set_category_status(&self, id: i64, status: i64) -> Result<(), StorefrontError> {
        self.db.set_category_status(id, status).await?;
        self.invalidate(DISH_CACHE_PREFIX).await;
        self.invalidate(SETMEAL_CACHE_PREFIX).await;
        Ok(())
    }

    pub async fn delete_category(&self, id: i64) -> Result<(), StorefrontError> {
        self.db.delete_category(id).await?;
        self.invalidate(DISH_CACHE_PREFIX).await;
        self.invalidate(SETMEAL_CACHE_PREFIX).await;
        Ok(())
    }

    //------------------------------------       Dishes       -----------------------------------------------------

    pub async fn create_dish(&self, dish: &NewDish) -> Result<Dish, StorefrontError> {
        let dish = self.db.create_dish(dish).await?;
        self.filter.insert(&dish_cache_key(dish.category_id));
        self.invalidate(DISH_CACHE_PREFIX).await;
        Ok(dish)
    }

    pub async fn update_dish(&self, update: &DishUpdate) -> Result<Dish, StorefrontError> {
        let dish = self.db.update_dish(update).await?;
        self.filter.insert(&dish_cache_key(dish.category_id));
        self.invalidate(DISH_CACHE_PREFIX).await;
        Ok(dish)
    }

    pub async fn delete_dishes(&self, ids: &[i64]) -> Result<(), StorefrontError> {
        self.db.delete_dishes(ids).await?;
        self.invalidate(DISH_CACHE_PREFIX).await;
        Ok(())
    }

    pub async fn set_dish_status(&self, id: i64, status: i64) -> Result<(), StorefrontError> {
        self.db.set_dish_status(id, status).await?;
        self.invalidate(DISH_CACHE_PREFIX).await;
        Ok(())
    }

    pub async fn dish(&self, id: i64) -> Result<Option<Dish>, StorefrontError> {
        self.db.fetch_dish(id).await
    }

    pub async fn dish_flavors(&self, dish_id: i64) -> Result<Vec<DishFlavor>, StorefrontError> {
        self.db.fetch_dish_flavors(dish_id).await
    }

    /// The consumer-facing dish listing for a category, served cache-aside.
    pub async fn list_dishes(&self, category_id: i64) -> Result<Vec<Dish>, StorefrontError> {
        let key = dish_cache_key(category_id);
        if !self.filter.contains(&key) {
            trace!("🗃️ Filter rejected '{key}'; returning empty without a lookup");
            return Ok(Vec::new());
        }
        if let Some(dishes) = self.cached::<Vec<Dish>>(&key).await {
            return Ok(dishes);
        }
        let dishes = self.db.list_enabled_dishes(category_id).await?;
        self.store(&key, &dishes).await;
        Ok(dishes)
    }

    //------------------------------------     Set-meals      -----------------------------------------------------

    pub async fn create_setmeal(&self, setmeal: &NewSetMeal) -> Result<SetMeal, StorefrontError> {
        let setmeal = self.db.create_setmeal(setmeal).await?;
        self.filter.insert(&setmeal_cache_key(setmeal.category_id));
        self.invalidate(SETMEAL_CACHE_PREFIX).await;
        Ok(setmeal)
    }

    pub async fn update_setmeal(&self, update: &SetMealUpdate) -> Result<SetMeal, StorefrontError> {
        let setmeal = self.db.update_setmeal(update).await?;
        self.filter.insert(&setmeal_cache_key(setmeal.category_id));
        self.invalidate(SETMEAL_CACHE_PREFIX).await;
        Ok(setmeal)
    }

    pub async fn delete_setmeals(&self, ids: &[i64]) -> Result<(), StorefrontError> {
        self.db.delete_setmeals(ids).await?;
        self.invalidate(SETMEAL_CACHE_PREFIX).await;
        Ok(())
    }

    pub async fn set_setmeal_status(&self, id: i64, status: i64) -> Result<(), StorefrontError> {
        self.db.set_setmeal_status(id, status).await?;
        self.invalidate(SETMEAL_CACHE_PREFIX).await;
        Ok(())
    }

    pub async fn setmeal(&self, id: i64) -> Result<Option<SetMeal>, StorefrontError> {
        self.db.fetch_setmeal(id).await
    }

    pub async fn setmeal_dishes(&self, setmeal_id: i64) -> Result<Vec<SetMealDish>, StorefrontError> {
        self.db.fetch_setmeal_dishes(setmeal_id).await
    }

    /// The consumer-facing set-meal listing for a category, served cache-aside.
    pub async fn list_setmeals(&self, category_id: i64) -> Result<Vec<SetMeal>, StorefrontError> {
        let key = setmeal_cache_key(category_id);
        if !self.filter.contains(&key) {
            trace!("🗃️ Filter rejected '{key}'; returning empty without a lookup");
            return Ok(Vec::new());
        }
        if let Some(setmeals) = self.cached::<Vec<SetMeal>>(&key).await {
            return Ok(setmeals);
        }
        let setmeals = self.db.list_enabled_setmeals(category_id).await?;
        self.store(&key, &setmeals).await;
        Ok(setmeals)
    }

    //------------------------------------   Cache plumbing   -----------------------------------------------------

    /// Cache reads are best effort: a corrupt entry is logged and treated as a miss.
    async fn cached<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.cache.get(key).await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                trace!("🗃️ Cache hit for '{key}'");
                Some(value)
            },
            Err(e) => {
                warn!("🗃️ Discarding corrupt cache entry for '{key}': {e}");
                None
            },
        }
    }

    /// Cache writes are best effort too; a serialization failure costs a re-query, nothing more.
    async fn store<T: serde::Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.cache.put(key, bytes).await;
                self.filter.insert(key);
                trace!("🗃️ Cached '{key}'");
            },
            Err(e) => warn!("🗃️ Could not serialize value for '{key}': {e}"),
        }
    }

    async fn invalidate(&self, prefix: &str) {
        let removed = self.cache.delete_prefix(prefix).await;
        trace!("🗃️ Invalidated {removed} entries under '{prefix}'");
    }
}
