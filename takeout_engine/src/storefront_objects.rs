use serde::{Deserialize, Serialize};
use tko_common::Money;

//--------------------------------------     NewCartItem     ---------------------------------------------------------
/// Identifies the item a cart operation applies to. Exactly one of `dish_id` / `setmeal_id` must
/// be set; `validate` enforces this before any storage is touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCartItem {
    pub dish_id: Option<i64>,
    pub setmeal_id: Option<i64>,
    pub dish_flavor: String,
}

impl NewCartItem {
    pub fn dish(dish_id: i64, flavor: &str) -> Self {
        Self { dish_id: Some(dish_id), setmeal_id: None, dish_flavor: flavor.to_string() }
    }

    pub fn setmeal(setmeal_id: i64) -> Self {
        Self { dish_id: None, setmeal_id: Some(setmeal_id), dish_flavor: String::new() }
    }

    pub fn validate(&self) -> Result<(), String> {
        match (self.dish_id, self.setmeal_id) {
            (Some(_), Some(_)) => Err("a cart item cannot reference both a dish and a set-meal".to_string()),
            (None, None) => Err("a cart item must reference a dish or a set-meal".to_string()),
            _ => Ok(()),
        }
    }
}

//--------------------------------------     NewAddress      ---------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAddress {
    pub user_id: i64,
    pub consignee: String,
    pub sex: String,
    pub phone: String,
    pub province_code: String,
    pub province_name: String,
    pub city_code: String,
    pub city_name: String,
    pub district_code: String,
    pub district_name: String,
    pub detail: String,
    pub label: String,
}

//--------------------------------------      Catalog        ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub category_type: i64,
    pub name: String,
    pub sort: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDishFlavor {
    pub name: String,
    pub value: String,
}

/// A dish together with its flavor options. The dish row and the flavor rows are written in a
/// single transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDish {
    pub name: String,
    pub category_id: i64,
    pub price: Money,
    pub image: String,
    pub description: String,
    pub flavors: Vec<NewDishFlavor>,
}

/// Full replacement of a dish and its flavor set: the old flavor rows are deleted and the given
/// ones inserted, in the same transaction as the dish update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishUpdate {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub price: Money,
    pub image: String,
    pub description: String,
    pub flavors: Vec<NewDishFlavor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSetMealDish {
    pub dish_id: i64,
    pub name: String,
    pub price: Money,
    pub copies: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSetMeal {
    pub name: String,
    pub category_id: i64,
    pub price: Money,
    pub image: String,
    pub description: String,
    pub dishes: Vec<NewSetMealDish>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetMealUpdate {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub price: Money,
    pub image: String,
    pub description: String,
    pub dishes: Vec<NewSetMealDish>,
}

//--------------------------------------       Staff         ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEmployee {
    pub name: String,
    pub username: String,
    /// Plaintext at this boundary; hashed before it reaches storage.
    pub password: String,
    pub phone: String,
    pub sex: String,
    pub id_number: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub openid: String,
    pub name: String,
    pub phone: String,
    pub avatar: String,
}
