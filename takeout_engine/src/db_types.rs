use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use tko_common::Money;

//--------------------------------------    OrderStatus      ---------------------------------------------------------
/// The order lifecycle states. The numeric values are fixed and stored as-is in the database.
///
/// Legal forward transitions:
/// `PendingPayment → ToBeConfirmed → Confirmed → DeliveryInProgress → Completed`, with
/// `Cancelled` reachable from `PendingPayment` or `ToBeConfirmed` only. `Completed` and
/// `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[repr(i64)]
pub enum OrderStatus {
    PendingPayment = 1,
    ToBeConfirmed = 2,
    Confirmed = 3,
    DeliveryInProgress = 4,
    Completed = 5,
    Cancelled = 6,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::PendingPayment => write!(f, "PendingPayment"),
            OrderStatus::ToBeConfirmed => write!(f, "ToBeConfirmed"),
            OrderStatus::Confirmed => write!(f, "Confirmed"),
            OrderStatus::DeliveryInProgress => write!(f, "DeliveryInProgress"),
            OrderStatus::Completed => write!(f, "Completed"),
            OrderStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct StatusConversionError(String);

impl TryFrom<i64> for OrderStatus {
    type Error = StatusConversionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::PendingPayment),
            2 => Ok(Self::ToBeConfirmed),
            3 => Ok(Self::Confirmed),
            4 => Ok(Self::DeliveryInProgress),
            5 => Ok(Self::Completed),
            6 => Ok(Self::Cancelled),
            v => Err(StatusConversionError(format!("{v} is not an order status"))),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PendingPayment" => Ok(Self::PendingPayment),
            "ToBeConfirmed" => Ok(Self::ToBeConfirmed),
            "Confirmed" => Ok(Self::Confirmed),
            "DeliveryInProgress" => Ok(Self::DeliveryInProgress),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

//--------------------------------------     PayStatus       ---------------------------------------------------------
/// Payment state of an order. `Refund` marks orders whose payment was reversed after a
/// cancellation or rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[repr(i64)]
pub enum PayStatus {
    Unpaid = 0,
    Paid = 1,
    Refund = 2,
}

impl Display for PayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayStatus::Unpaid => write!(f, "Unpaid"),
            PayStatus::Paid => write!(f, "Paid"),
            PayStatus::Refund => write!(f, "Refund"),
        }
    }
}

//--------------------------------------       Order         ---------------------------------------------------------
/// A customer order. The consignee fields are a snapshot of the address book entry at submission
/// time; subsequent address edits do not affect existing orders. Orders are never deleted.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub number: String,
    pub status: OrderStatus,
    pub user_id: i64,
    pub address_book_id: i64,
    pub order_time: DateTime<Utc>,
    pub checkout_time: Option<DateTime<Utc>>,
    pub cancel_time: Option<DateTime<Utc>>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub pay_method: i64,
    pub pay_status: PayStatus,
    pub amount: Money,
    pub pack_amount: Money,
    pub remark: String,
    pub user_name: String,
    pub phone: String,
    pub address: String,
    pub consignee: String,
    pub cancel_reason: Option<String>,
    pub rejection_reason: Option<String>,
    pub delivery_status: i64,
    pub tableware_number: i64,
    pub tableware_status: i64,
}

//--------------------------------------      NewOrder       ---------------------------------------------------------
/// The fields written when an order row is first created. Everything else starts at its default.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub number: String,
    pub user_id: i64,
    pub address_book_id: i64,
    pub pay_method: i64,
    pub amount: Money,
    pub pack_amount: Money,
    pub remark: String,
    pub user_name: String,
    pub phone: String,
    pub address: String,
    pub consignee: String,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub delivery_status: i64,
    pub tableware_number: i64,
    pub tableware_status: i64,
}

//--------------------------------------    OrderDetail      ---------------------------------------------------------
/// A line item of an order. Exactly one of `dish_id` and `setmeal_id` is set. Detail rows are
/// created in bulk from the shopping cart at submission time and are immutable afterwards.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub order_id: i64,
    pub dish_id: Option<i64>,
    pub setmeal_id: Option<i64>,
    pub dish_flavor: String,
    pub number: i64,
    pub amount: Money,
}

//--------------------------------------    ShoppingCart     ---------------------------------------------------------
/// One staged line in a user's cart: a distinct (dish-or-setmeal, flavor) combination with a
/// quantity counter.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ShoppingCart {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub user_id: i64,
    pub dish_id: Option<i64>,
    pub setmeal_id: Option<i64>,
    pub dish_flavor: String,
    pub number: i64,
    pub amount: Money,
    pub create_time: DateTime<Utc>,
}

impl ShoppingCart {
    /// The total for the line: unit price times quantity.
    pub fn line_total(&self) -> Money {
        self.amount * self.number
    }
}

//--------------------------------------    AddressBook      ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AddressBook {
    pub id: i64,
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
    pub is_default: i64,
}

//--------------------------------------      Catalog        ---------------------------------------------------------
/// Enabled/disabled flag shared by catalog entities and employees.
pub const STATUS_ENABLED: i64 = 1;
pub const STATUS_DISABLED: i64 = 0;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    /// 1 = dish category, 2 = set-meal category
    pub category_type: i64,
    pub name: String,
    pub sort: i64,
    pub status: i64,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Dish {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub price: Money,
    pub image: String,
    pub description: String,
    pub status: i64,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// A flavor option attached to a dish, e.g. name = "spiciness", value = `["mild","hot"]`.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct DishFlavor {
    pub id: i64,
    pub dish_id: i64,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct SetMeal {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub price: Money,
    pub image: String,
    pub description: String,
    pub status: i64,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// A dish included in a set-meal, with a denormalized name/price snapshot.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct SetMealDish {
    pub id: i64,
    pub setmeal_id: i64,
    pub dish_id: i64,
    pub name: String,
    pub price: Money,
    pub copies: i64,
}

//--------------------------------------       Staff         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub phone: String,
    pub sex: String,
    pub id_number: String,
    pub status: i64,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub openid: String,
    pub name: String,
    pub phone: String,
    pub avatar: String,
    pub create_time: DateTime<Utc>,
}
