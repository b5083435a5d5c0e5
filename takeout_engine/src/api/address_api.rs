use crate::{
    db_types::AddressBook,
    storefront_objects::NewAddress,
    traits::{AddressManagement, StorefrontError},
};

/// The user's saved delivery addresses.
pub struct AddressApi<B> {
    db: B,
}

impl<B> AddressApi<B>
where B: AddressManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn create(&self, address: &NewAddress) -> Result<AddressBook, StorefrontError> {
        self.db.create_address(address).await
    }

    pub async fn update(&self, address: &AddressBook) -> Result<(), StorefrontError> {
        self.db.update_address(address).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), StorefrontError> {
        self.db.delete_address(id).await
    }

    pub async fn get(&self, id: i64) -> Result<Option<AddressBook>, StorefrontError> {
        self.db.fetch_address(id).await
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<AddressBook>, StorefrontError> {
        self.db.list_addresses(user_id).await
    }

    /// Makes `id` the user's single default address.
    pub async fn set_default(&self, user_id: i64, id: i64) -> Result<(), StorefrontError> {
        self.db.set_default_address(user_id, id).await
    }

    pub async fn default_address(&self, user_id: i64) -> Result<Option<AddressBook>, StorefrontError> {
        self.db.fetch_default_address(user_id).await
    }
}
