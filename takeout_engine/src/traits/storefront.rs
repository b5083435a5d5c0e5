use thiserror::Error;

use crate::{
    db_types::{
        AddressBook,
        Category,
        Dish,
        DishFlavor,
        Employee,
        SetMeal,
        SetMealDish,
        ShoppingCart,
        User,
    },
    storefront_objects::{
        DishUpdate,
        NewAddress,
        NewCartItem,
        NewCategory,
        NewDish,
        NewEmployee,
        NewSetMeal,
        NewUser,
        SetMealUpdate,
    },
};

/// Shopping cart storage. One row per distinct (item, flavor) per user.
#[allow(async_fn_in_trait)]
pub trait CartManagement: Clone {
    /// Increments the matching cart line, or inserts a new line with a name/image/price snapshot
    /// read from the referenced dish or set-meal.
    async fn add_cart_item(&self, user_id: i64, item: &NewCartItem) -> Result<ShoppingCart, StorefrontError>;

    /// Decrements the matching cart line, removing it when the quantity reaches one. Returns the
    /// updated line, or `None` if the line was removed or never existed.
    async fn subtract_cart_item(
        &self,
        user_id: i64,
        item: &NewCartItem,
    ) -> Result<Option<ShoppingCart>, StorefrontError>;

    /// The user's cart, newest line first.
    async fn list_cart(&self, user_id: i64) -> Result<Vec<ShoppingCart>, StorefrontError>;

    async fn clear_cart(&self, user_id: i64) -> Result<(), StorefrontError>;
}

/// Saved delivery addresses. At most one row per user carries `is_default = 1`, maintained by
/// the clear-then-set ordering in `set_default_address`.
#[allow(async_fn_in_trait)]
pub trait AddressManagement: Clone {
    async fn create_address(&self, address: &NewAddress) -> Result<AddressBook, StorefrontError>;

    async fn update_address(&self, address: &AddressBook) -> Result<(), StorefrontError>;

    async fn delete_address(&self, id: i64) -> Result<(), StorefrontError>;

    async fn fetch_address(&self, id: i64) -> Result<Option<AddressBook>, StorefrontError>;

    async fn list_addresses(&self, user_id: i64) -> Result<Vec<AddressBook>, StorefrontError>;

    /// Clears every default flag for the user, then sets the one on `id`.
    async fn set_default_address(&self, user_id: i64, id: i64) -> Result<(), StorefrontError>;

    async fn fetch_default_address(&self, user_id: i64) -> Result<Option<AddressBook>, StorefrontError>;
}

/// Categories, dishes and set-meals. Create/update operations that touch child rows (dish
/// flavors, set-meal dishes) are transactional: parent and children commit together.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement: Clone {
    async fn create_category(&self, category: &NewCategory) -> Result<Category, StorefrontError>;

    async fn list_categories(&self, category_type: Option<i64>) -> Result<Vec<Category>, StorefrontError>;

    async fn set_category_status(&self, id: i64, status: i64) -> Result<(), StorefrontError>;

    async fn delete_category(&self, id: i64) -> Result<(), StorefrontError>;

    async fn create_dish(&self, dish: &NewDish) -> Result<Dish, StorefrontError>;

    /// Replaces the dish row and its entire flavor set in one transaction.
    async fn update_dish(&self, update: &DishUpdate) -> Result<Dish, StorefrontError>;

    async fn delete_dishes(&self, ids: &[i64]) -> Result<(), StorefrontError>;

    async fn set_dish_status(&self, id: i64, status: i64) -> Result<(), StorefrontError>;

    async fn fetch_dish(&self, id: i64) -> Result<Option<Dish>, StorefrontError>;

    async fn fetch_dish_flavors(&self, dish_id: i64) -> Result<Vec<DishFlavor>, StorefrontError>;

    /// Enabled dishes in the category, for the consumer-facing listing.
    async fn list_enabled_dishes(&self, category_id: i64) -> Result<Vec<Dish>, StorefrontError>;

    async fn create_setmeal(&self, setmeal: &NewSetMeal) -> Result<SetMeal, StorefrontError>;

    async fn update_setmeal(&self, update: &SetMealUpdate) -> Result<SetMeal, StorefrontError>;

    async fn delete_setmeals(&self, ids: &[i64]) -> Result<(), StorefrontError>;

    async fn set_setmeal_status(&self, id: i64, status: i64) -> Result<(), StorefrontError>;

    async fn fetch_setmeal(&self, id: i64) -> Result<Option<SetMeal>, StorefrontError>;

    async fn fetch_setmeal_dishes(&self, setmeal_id: i64) -> Result<Vec<SetMealDish>, StorefrontError>;

    async fn list_enabled_setmeals(&self, category_id: i64) -> Result<Vec<SetMeal>, StorefrontError>;
}

/// Back-office employees and consumer users.
#[allow(async_fn_in_trait)]
pub trait StaffManagement: Clone {
    /// `password` must already be hashed by the caller.
    async fn create_employee(&self, employee: &NewEmployee) -> Result<Employee, StorefrontError>;

    async fn update_employee(&self, employee: &Employee) -> Result<(), StorefrontError>;

    async fn fetch_employee(&self, id: i64) -> Result<Option<Employee>, StorefrontError>;

    async fn fetch_employee_by_username(&self, username: &str) -> Result<Option<Employee>, StorefrontError>;

    async fn set_employee_status(&self, id: i64, status: i64) -> Result<(), StorefrontError>;

    async fn create_user(&self, user: &NewUser) -> Result<User, StorefrontError>;

    async fn fetch_user(&self, id: i64) -> Result<Option<User>, StorefrontError>;

    async fn fetch_user_by_openid(&self, openid: &str) -> Result<Option<User>, StorefrontError>;
}

#[derive(Debug, Clone, Error)]
pub enum StorefrontError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Address book entry {0} does not exist")]
    AddressNotFound(i64),
    #[error("Dish {0} does not exist")]
    DishNotFound(i64),
    #[error("Set-meal {0} does not exist")]
    SetMealNotFound(i64),
    #[error("Category {0} does not exist")]
    CategoryNotFound(i64),
    #[error("Employee {0} does not exist")]
    EmployeeNotFound(i64),
    #[error("Invalid cart item: {0}")]
    InvalidCartItem(String),
}

impl From<sqlx::Error> for StorefrontError {
    fn from(e: sqlx::Error) -> Self {
        StorefrontError::DatabaseError(e.to_string())
    }
}
