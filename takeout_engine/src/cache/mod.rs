//! Cache-aside support for the consumer-facing catalog reads.
//!
//! [`CacheStore`] is the cache itself; [`KeyFilter`] sits in front of it and swallows lookups for
//! keys that were never cached, so junk category ids cannot stampede the database.
mod filter;
mod store;

pub use filter::KeyFilter;
pub use store::{CacheStore, MemoryCache};

/// Key namespace for cached dish listings, one entry per category.
pub const DISH_CACHE_PREFIX: &str = "dishCache::";
/// Key namespace for cached set-meal listings, one entry per category.
pub const SETMEAL_CACHE_PREFIX: &str = "setmealCache::";

pub fn dish_cache_key(category_id: i64) -> String {
    format!("{DISH_CACHE_PREFIX}{category_id}")
}

pub fn setmeal_cache_key(category_id: i64) -> String {
    format!("{SETMEAL_CACHE_PREFIX}{category_id}")
}
