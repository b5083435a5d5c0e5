use log::debug;

use crate::{
    db_types::ShoppingCart,
    storefront_objects::NewCartItem,
    traits::{CartManagement, StorefrontError},
};

/// The shopping cart operations. Staging only; nothing here touches orders.
pub struct CartApi<B> {
    db: B,
}

impl<B> CartApi<B>
where B: CartManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Adds one unit of the item to the user's cart: an existing (item, flavor) line is
    /// incremented, otherwise a new line is created with a snapshot of the catalog entry.
    pub async fn add_item(&self, user_id: i64, item: &NewCartItem) -> Result<ShoppingCart, StorefrontError> {
        let line = self.db.add_cart_item(user_id, item).await?;
        debug!("🛒️ Cart line [{}] for user #{user_id} now has {} units", line.name, line.number);
        Ok(line)
    }

    /// Removes one unit; the line disappears when the last unit goes. Returns the surviving line,
    /// if any.
    pub async fn subtract_item(
        &self,
        user_id: i64,
        item: &NewCartItem,
    ) -> Result<Option<ShoppingCart>, StorefrontError> {
        self.db.subtract_cart_item(user_id, item).await
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<ShoppingCart>, StorefrontError> {
        self.db.list_cart(user_id).await
    }

    pub async fn clear(&self, user_id: i64) -> Result<(), StorefrontError> {
        self.db.clear_cart(user_id).await
    }
}
