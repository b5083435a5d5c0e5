//! `SqliteDatabase` is a concrete implementation of the takeout storage backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;
use tko_common::Money;

use super::db::{addresses, carts, catalog, db_url, new_pool, orders, reports, staff};
use crate::{
    db_types::{
        AddressBook,
        Category,
        Dish,
        DishFlavor,
        Employee,
        NewOrder,
        Order,
        OrderDetail,
        OrderStatus,
        SetMeal,
        SetMealDish,
        ShoppingCart,
        User,
    },
    order_objects::{OrderQueryFilter, OrderSubmission, OrderUpdate},
    report_objects::ItemSales,
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
    traits::{
        AddressManagement,
        CartManagement,
        CatalogManagement,
        OrderFlowError,
        OrderGatewayDatabase,
        ReportError,
        SalesReporting,
        StaffManagement,
        StorefrontError,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the url from the environment.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl OrderGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Creates the order and its detail rows from the user's cart in a single transaction.
    ///
    /// The order total is the sum of the cart line totals plus the packaging fee. Consignee,
    /// phone and address are snapshotted from the address book entry so that later address edits
    /// leave the order untouched. The cart is cleared before the transaction commits.
    async fn submit_order(
        &self,
        user_id: i64,
        submission: &OrderSubmission,
        number: &str,
    ) -> Result<Order, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let address = addresses::fetch_address_by_id(submission.address_book_id, &mut tx)
            .await?
            .ok_or(OrderFlowError::AddressNotFound(submission.address_book_id))?;
        let cart = carts::list_cart(user_id, &mut tx).await?;
        if cart.is_empty() {
            return Err(OrderFlowError::EmptyCart);
        }
        let amount = cart.iter().map(ShoppingCart::line_total).sum::<Money>() + submission.pack_amount;
        let user_name = staff::fetch_user_by_id(user_id, &mut tx).await?.map(|u| u.name).unwrap_or_default();
        let full_address = format!(
            "{}{}{}{}",
            address.province_name, address.city_name, address.district_name, address.detail
        );
        let new_order = NewOrder {
            number: number.to_string(),
            user_id,
            address_book_id: address.id,
            pay_method: submission.pay_method,
            amount,
            pack_amount: submission.pack_amount,
            remark: submission.remark.clone(),
            user_name,
            phone: address.phone.clone(),
            address: full_address,
            consignee: address.consignee.clone(),
            estimated_delivery_time: submission.estimated_delivery_time,
            delivery_status: submission.delivery_status,
            tableware_number: submission.tableware_number,
            tableware_status: submission.tableware_status,
        };
        let order = orders::insert_order(new_order, &mut tx).await?;
        orders::insert_details_from_cart(order.id, &cart, &mut tx).await?;
        carts::clear_cart(user_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order [{}] submitted by user #{user_id} for {}", order.number, order.amount);
        Ok(order)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_number(&self, number: &str, user_id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(number, user_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_details(&self, order_id: i64) -> Result<Vec<OrderDetail>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let details = orders::fetch_details_for_order(order_id, &mut conn).await?;
        Ok(details)
    }

    /// The status check and the update run in the same transaction, so two racing transitions
    /// cannot both succeed.
    async fn transition_order(
        &self,
        order_id: i64,
        expected: &[OrderStatus],
        update: OrderUpdate,
    ) -> Result<Order, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::transition_order(order_id, expected, update, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order [{}] is now {}", order.number, order.status);
        Ok(order)
    }

    async fn search_orders(&self, filter: &OrderQueryFilter) -> Result<(i64, Vec<Order>), OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let total = orders::count_orders(filter, &mut conn).await?;
        let records = orders::search_orders(filter, &mut conn).await?;
        Ok((total, records))
    }

    async fn count_orders_in_status(&self, status: OrderStatus) -> Result<i64, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let count = orders::count_orders_in_status(status, &mut conn).await?;
        Ok(count)
    }

    async fn fetch_overdue_pending_orders(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let overdue = orders::fetch_overdue_pending_orders(cutoff, &mut conn).await?;
        Ok(overdue)
    }

    async fn repeat_order_to_cart(&self, order_id: i64, user_id: i64) -> Result<usize, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let order =
            orders::fetch_order_by_id(order_id, &mut tx).await?.ok_or(OrderFlowError::OrderIdNotFound(order_id))?;
        if order.user_id != user_id {
            return Err(OrderFlowError::OrderIdNotFound(order_id));
        }
        let count = carts::insert_cart_lines_from_details(user_id, order_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Re-staged {count} lines from order [{}] into user #{user_id}'s cart", order.number);
        Ok(count)
    }

    async fn close(&mut self) -> Result<(), OrderFlowError> {
        self.pool.close().await;
        Ok(())
    }
}

impl CartManagement for SqliteDatabase {
    async fn add_cart_item(&self, user_id: i64, item: &NewCartItem) -> Result<ShoppingCart, StorefrontError> {
        item.validate().map_err(StorefrontError::InvalidCartItem)?;
        let mut tx = self.pool.begin().await?;
        let line = match carts::find_cart_line(user_id, item, &mut tx).await? {
            Some(existing) => carts::bump_cart_line(existing.id, 1, &mut tx).await?,
            None => {
                // Snapshot the display fields from the catalog at staging time.
                let (name, image, amount) = match (item.dish_id, item.setmeal_id) {
                    (Some(dish_id), _) => {
                        let dish = catalog::fetch_dish_by_id(dish_id, &mut tx)
                            .await?
                            .ok_or(StorefrontError::DishNotFound(dish_id))?;
                        (dish.name, dish.image, dish.price)
                    },
                    (None, Some(setmeal_id)) => {
                        let setmeal = catalog::fetch_setmeal_by_id(setmeal_id, &mut tx)
                            .await?
                            .ok_or(StorefrontError::SetMealNotFound(setmeal_id))?;
                        (setmeal.name, setmeal.image, setmeal.price)
                    },
                    (None, None) => unreachable!("validate() rejects items with no reference"),
                };
                carts::insert_cart_line(user_id, item, &name, &image, amount, &mut tx).await?
            },
        };
        tx.commit().await?;
        Ok(line)
    }

    async fn subtract_cart_item(
        &self,
        user_id: i64,
        item: &NewCartItem,
    ) -> Result<Option<ShoppingCart>, StorefrontError> {
        item.validate().map_err(StorefrontError::InvalidCartItem)?;
        let mut tx = self.pool.begin().await?;
        let result = match carts::find_cart_line(user_id, item, &mut tx).await? {
            Some(line) if line.number > 1 => Some(carts::bump_cart_line(line.id, -1, &mut tx).await?),
            Some(line) => {
                carts::delete_cart_line(line.id, &mut tx).await?;
                None
            },
            None => None,
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn list_cart(&self, user_id: i64) -> Result<Vec<ShoppingCart>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let cart = carts::list_cart(user_id, &mut conn).await?;
        Ok(cart)
    }

    async fn clear_cart(&self, user_id: i64) -> Result<(), StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        carts::clear_cart(user_id, &mut conn).await?;
        Ok(())
    }
}

impl AddressManagement for SqliteDatabase {
    async fn create_address(&self, address: &NewAddress) -> Result<AddressBook, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let address = addresses::insert_address(address, &mut conn).await?;
        Ok(address)
    }

    async fn update_address(&self, address: &AddressBook) -> Result<(), StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        addresses::update_address(address, &mut conn).await?;
        Ok(())
    }

    async fn delete_address(&self, id: i64) -> Result<(), StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        addresses::delete_address(id, &mut conn).await?;
        Ok(())
    }

    async fn fetch_address(&self, id: i64) -> Result<Option<AddressBook>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let address = addresses::fetch_address_by_id(id, &mut conn).await?;
        Ok(address)
    }

    async fn list_addresses(&self, user_id: i64) -> Result<Vec<AddressBook>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let list = addresses::list_addresses_for_user(user_id, &mut conn).await?;
        Ok(list)
    }

    /// Clear-then-set inside one transaction, so "at most one default per user" holds even when
    /// two of these race.
    async fn set_default_address(&self, user_id: i64, id: i64) -> Result<(), StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let address =
            addresses::fetch_address_by_id(id, &mut tx).await?.ok_or(StorefrontError::AddressNotFound(id))?;
        if address.user_id != user_id {
            return Err(StorefrontError::AddressNotFound(id));
        }
        addresses::clear_defaults(user_id, &mut tx).await?;
        addresses::mark_default(id, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn fetch_default_address(&self, user_id: i64) -> Result<Option<AddressBook>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let address = addresses::fetch_default_for_user(user_id, &mut conn).await?;
        Ok(address)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn create_category(&self, category: &NewCategory) -> Result<Category, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let category = catalog::insert_category(category, &mut conn).await?;
        Ok(category)
    }

    async fn list_categories(&self, category_type: Option<i64>) -> Result<Vec<Category>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let list = catalog::list_categories(category_type, &mut conn).await?;
        Ok(list)
    }

    async fn set_category_status(&self, id: i64, status: i64) -> Result<(), StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        catalog::set_category_status(id, status, &mut conn).await?;
        Ok(())
    }

    async fn delete_category(&self, id: i64) -> Result<(), StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        catalog::delete_category(id, &mut conn).await?;
        Ok(())
    }

    async fn create_dish(&self, dish: &NewDish) -> Result<Dish, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let row = catalog::insert_dish(dish, &mut tx).await?;
        catalog::insert_dish_flavors(row.id, &dish.flavors, &mut tx).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn update_dish(&self, update: &DishUpdate) -> Result<Dish, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let row = catalog::update_dish_row(
            update.id,
            &update.name,
            update.category_id,
            update.price,
            &update.image,
            &update.description,
            &mut tx,
        )
        .await?
        .ok_or(StorefrontError::DishNotFound(update.id))?;
        catalog::delete_dish_flavors(update.id, &mut tx).await?;
        catalog::insert_dish_flavors(update.id, &update.flavors, &mut tx).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn delete_dishes(&self, ids: &[i64]) -> Result<(), StorefrontError> {
        let mut tx = self.pool.begin().await?;
        for id in ids {
            catalog::delete_dish_flavors(*id, &mut tx).await?;
        }
        catalog::delete_dishes(ids, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn set_dish_status(&self, id: i64, status: i64) -> Result<(), StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        catalog::set_dish_status(id, status, &mut conn).await?;
        Ok(())
    }

    async fn fetch_dish(&self, id: i64) -> Result<Option<Dish>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let dish = catalog::fetch_dish_by_id(id, &mut conn).await?;
        Ok(dish)
    }

    async fn fetch_dish_flavors(&self, dish_id: i64) -> Result<Vec<DishFlavor>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let flavors = catalog::fetch_dish_flavors(dish_id, &mut conn).await?;
        Ok(flavors)
    }

    async fn list_enabled_dishes(&self, category_id: i64) -> Result<Vec<Dish>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let dishes = catalog::list_enabled_dishes(category_id, &mut conn).await?;
        Ok(dishes)
    }

    async fn create_setmeal(&self, setmeal: &NewSetMeal) -> Result<SetMeal, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let row = catalog::insert_setmeal(setmeal, &mut tx).await?;
        catalog::insert_setmeal_dishes(row.id, &setmeal.dishes, &mut tx).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn update_setmeal(&self, update: &SetMealUpdate) -> Result<SetMeal, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let row = catalog::update_setmeal_row(
            update.id,
            &update.name,
            update.category_id,
            update.price,
            &update.image,
            &update.description,
            &mut tx,
        )
        .await?
        .ok_or(StorefrontError::SetMealNotFound(update.id))?;
        catalog::delete_setmeal_dishes(update.id, &mut tx).await?;
        catalog::insert_setmeal_dishes(update.id, &update.dishes, &mut tx).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn delete_setmeals(&self, ids: &[i64]) -> Result<(), StorefrontError> {
        let mut tx = self.pool.begin().await?;
        for id in ids {
            catalog::delete_setmeal_dishes(*id, &mut tx).await?;
        }
        catalog::delete_setmeals(ids, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn set_setmeal_status(&self, id: i64, status: i64) -> Result<(), StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        catalog::set_setmeal_status(id, status, &mut conn).await?;
        Ok(())
    }

    async fn fetch_setmeal(&self, id: i64) -> Result<Option<SetMeal>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let setmeal = catalog::fetch_setmeal_by_id(id, &mut conn).await?;
        Ok(setmeal)
    }

    async fn fetch_setmeal_dishes(&self, setmeal_id: i64) -> Result<Vec<SetMealDish>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let dishes = catalog::fetch_setmeal_dishes(setmeal_id, &mut conn).await?;
        Ok(dishes)
    }

    async fn list_enabled_setmeals(&self, category_id: i64) -> Result<Vec<SetMeal>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let setmeals = catalog::list_enabled_setmeals(category_id, &mut conn).await?;
        Ok(setmeals)
    }
}

impl SalesReporting for SqliteDatabase {
    async fn turnover_between(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> Result<Money, ReportError> {
        let mut conn = self.pool.acquire().await?;
        let turnover = reports::turnover_between(from, until, &mut conn).await?;
        Ok(turnover)
    }

    async fn count_orders_between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        status: Option<OrderStatus>,
    ) -> Result<i64, ReportError> {
        let mut conn = self.pool.acquire().await?;
        let count = reports::count_orders_between(from, until, status, &mut conn).await?;
        Ok(count)
    }

    async fn count_users_between(
        &self,
        from: Option<DateTime<Utc>>,
        until: DateTime<Utc>,
    ) -> Result<i64, ReportError> {
        let mut conn = self.pool.acquire().await?;
        let count = reports::count_users_between(from, until, &mut conn).await?;
        Ok(count)
    }

    async fn top_selling_items(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<ItemSales>, ReportError> {
        let mut conn = self.pool.acquire().await?;
        let items = reports::top_selling_items(from, until, limit, &mut conn).await?;
        Ok(items)
    }
}

impl StaffManagement for SqliteDatabase {
    async fn create_employee(&self, employee: &NewEmployee) -> Result<Employee, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let employee = staff::insert_employee(employee, &mut conn).await?;
        Ok(employee)
    }

    async fn update_employee(&self, employee: &Employee) -> Result<(), StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        staff::update_employee(employee, &mut conn).await?;
        Ok(())
    }

    async fn fetch_employee(&self, id: i64) -> Result<Option<Employee>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let employee = staff::fetch_employee_by_id(id, &mut conn).await?;
        Ok(employee)
    }

    async fn fetch_employee_by_username(&self, username: &str) -> Result<Option<Employee>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let employee = staff::fetch_employee_by_username(username, &mut conn).await?;
        Ok(employee)
    }

    async fn set_employee_status(&self, id: i64, status: i64) -> Result<(), StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        staff::set_employee_status(id, status, &mut conn).await?;
        Ok(())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let user = staff::insert_user(user, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_user(&self, id: i64) -> Result<Option<User>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let user = staff::fetch_user_by_id(id, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_user_by_openid(&self, openid: &str) -> Result<Option<User>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let user = staff::fetch_user_by_openid(openid, &mut conn).await?;
        Ok(user)
    }
}
