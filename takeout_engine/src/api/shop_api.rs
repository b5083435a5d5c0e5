//! The storefront open/closed flag.
//!
//! A runtime toggle rather than a database column: the flag lives in the shared [`CacheStore`]
//! under its own key, out of reach of the catalog namespaces and their prefix eviction. An unset
//! flag reads as open, so a fresh process serves customers until an operator closes the shop.
use log::*;

use crate::cache::CacheStore;

const SHOP_STATUS_KEY: &str = "shop::status";

pub struct ShopApi<C> {
    cache: C,
}

impl<C> ShopApi<C>
where C: CacheStore
{
    pub fn new(cache: C) -> Self {
        Self { cache }
    }

    pub async fn set_open(&self, open: bool) {
        self.cache.put(SHOP_STATUS_KEY, vec![u8::from(open)]).await;
        info!("🏪️ The shop is now {}", if open { "open" } else { "closed" });
    }

    pub async fn is_open(&self) -> bool {
        match self.cache.get(SHOP_STATUS_KEY).await {
            Some(bytes) => bytes.first() == Some(&1),
            None => true,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cache::MemoryCache;

    #[tokio::test]
    async fn open_until_told_otherwise() {
        let shop = ShopApi::new(MemoryCache::new());
        assert!(shop.is_open().await);
        shop.set_open(false).await;
        assert!(!shop.is_open().await);
        shop.set_open(true).await;
        assert!(shop.is_open().await);
    }

    #[tokio::test]
    async fn catalog_eviction_leaves_the_flag_alone() {
        let cache = MemoryCache::new();
        let shop = ShopApi::new(cache.clone());
        shop.set_open(false).await;
        cache.delete_prefix("dishCache::").await;
        cache.delete_prefix("setmealCache::").await;
        assert!(!shop.is_open().await);
    }
}
