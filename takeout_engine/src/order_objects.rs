use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tko_common::Money;

use crate::db_types::{Order, OrderDetail, OrderStatus, PayStatus};

//--------------------------------------   OrderSubmission   ---------------------------------------------------------
/// The caller-supplied fields of a checkout request. The consignee snapshot and the order amount
/// are filled in server-side from the address book and the shopping cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSubmission {
    pub address_book_id: i64,
    pub pay_method: i64,
    pub remark: String,
    pub pack_amount: Money,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub delivery_status: i64,
    pub tableware_number: i64,
    pub tableware_status: i64,
}

impl OrderSubmission {
    pub fn new(address_book_id: i64, pay_method: i64) -> Self {
        Self {
            address_book_id,
            pay_method,
            remark: String::new(),
            pack_amount: Money::default(),
            estimated_delivery_time: None,
            delivery_status: 0,
            tableware_number: 0,
            tableware_status: 0,
        }
    }

    pub fn with_remark(mut self, remark: &str) -> Self {
        self.remark = remark.to_string();
        self
    }

    pub fn with_pack_amount(mut self, pack_amount: Money) -> Self {
        self.pack_amount = pack_amount;
        self
    }
}

//--------------------------------------    OrderReceipt     ---------------------------------------------------------
/// The summary returned to the customer after a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: i64,
    pub order_number: String,
    pub order_amount: Money,
    pub order_time: DateTime<Utc>,
}

impl From<&Order> for OrderReceipt {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id,
            order_number: order.number.clone(),
            order_amount: order.amount,
            order_time: order.order_time,
        }
    }
}

//-------------------------------------- PaymentDescriptor   ---------------------------------------------------------
/// The pre-payment descriptor handed to the client so it can invoke the payment provider.
/// Requesting one does not change any order state; the state change happens when the provider
/// (or the mock gateway) calls back with a payment confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDescriptor {
    pub nonce_str: String,
    pub pay_sign: String,
    pub sign_type: String,
    pub package_str: String,
    pub time_stamp: String,
}

//--------------------------------------     OrderUpdate     ---------------------------------------------------------
/// A partial update applied to an order row as part of a guarded status transition. Only the
/// populated fields are written.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub pay_status: Option<PayStatus>,
    pub pay_method: Option<i64>,
    pub checkout_time: Option<DateTime<Utc>>,
    pub cancel_time: Option<DateTime<Utc>>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub rejection_reason: Option<String>,
}

impl OrderUpdate {
    pub fn to_status(status: OrderStatus) -> Self {
        Self { status: Some(status), ..Default::default() }
    }

    pub fn with_pay_status(mut self, pay_status: PayStatus) -> Self {
        self.pay_status = Some(pay_status);
        self
    }

    pub fn with_pay_method(mut self, pay_method: i64) -> Self {
        self.pay_method = Some(pay_method);
        self
    }

    pub fn with_checkout_time(mut self, t: DateTime<Utc>) -> Self {
        self.checkout_time = Some(t);
        self
    }

    pub fn with_cancel_time(mut self, t: DateTime<Utc>) -> Self {
        self.cancel_time = Some(t);
        self
    }

    pub fn with_delivery_time(mut self, t: DateTime<Utc>) -> Self {
        self.delivery_time = Some(t);
        self
    }

    pub fn with_cancel_reason(mut self, reason: &str) -> Self {
        self.cancel_reason = Some(reason.to_string());
        self
    }

    pub fn with_rejection_reason(mut self, reason: &str) -> Self {
        self.rejection_reason = Some(reason.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.pay_status.is_none()
            && self.pay_method.is_none()
            && self.checkout_time.is_none()
            && self.cancel_time.is_none()
            && self.delivery_time.is_none()
            && self.cancel_reason.is_none()
            && self.rejection_reason.is_none()
    }
}

//--------------------------------------  OrderQueryFilter   ---------------------------------------------------------
/// Search criteria for the admin order screens and the user's order history. `number` and `phone`
/// are substring matches; the rest are exact. Results are newest-first and paged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub number: Option<String>,
    pub phone: Option<String>,
    pub status: Option<OrderStatus>,
    pub user_id: Option<i64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub page: i64,
    pub page_size: i64,
}

impl Default for OrderQueryFilter {
    fn default() -> Self {
        Self {
            number: None,
            phone: None,
            status: None,
            user_id: None,
            since: None,
            until: None,
            page: 1,
            page_size: 10,
        }
    }
}

impl OrderQueryFilter {
    pub fn with_number(mut self, number: &str) -> Self {
        self.number = Some(number.to_string());
        self
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        self.phone = Some(phone.to_string());
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn paged(mut self, page: i64, page_size: i64) -> Self {
        self.page = page.max(1);
        self.page_size = page_size.clamp(1, 100);
        self
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    pub fn has_criteria(&self) -> bool {
        self.number.is_some()
            || self.phone.is_some()
            || self.status.is_some()
            || self.user_id.is_some()
            || self.since.is_some()
            || self.until.is_some()
    }
}

//--------------------------------------      OrderView      ---------------------------------------------------------
/// An order merged with its line items for display, plus the lossy `name*qty;` summary string
/// used by the listing screens. Built at read time, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub order_detail_list: Vec<OrderDetail>,
    pub order_dishes: String,
}

impl OrderView {
    pub fn new(order: Order, details: Vec<OrderDetail>) -> Self {
        let order_dishes = dish_summary(&details);
        Self { order, order_detail_list: details, order_dishes }
    }
}

/// Joins line items into the denormalized display string, e.g. `Kung Pao Chicken*3;Rice*2;`.
pub fn dish_summary(details: &[OrderDetail]) -> String {
    details.iter().map(|d| format!("{}*{};", d.name, d.number)).collect()
}

//--------------------------------------       Paged         ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paged<T> {
    pub total: i64,
    pub records: Vec<T>,
}

//--------------------------------------  OrderStatistics    ---------------------------------------------------------
/// Counts of the order states the kitchen dashboard cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatistics {
    pub to_be_confirmed: i64,
    pub confirmed: i64,
    pub delivery_in_progress: i64,
}

#[cfg(test)]
mod test {
    use super::*;
    use tko_common::Money;

    #[test]
    fn dish_summary_format() {
        let detail = |name: &str, qty: i64| OrderDetail {
            id: 0,
            name: name.to_string(),
            image: String::new(),
            order_id: 1,
            dish_id: Some(1),
            setmeal_id: None,
            dish_flavor: String::new(),
            number: qty,
            amount: Money::from_cents(100),
        };
        let details = vec![detail("Kung Pao Chicken", 3), detail("Rice", 2)];
        assert_eq!(dish_summary(&details), "Kung Pao Chicken*3;Rice*2;");
        assert_eq!(dish_summary(&[]), "");
    }

    #[test]
    fn filter_paging() {
        let filter = OrderQueryFilter::default().paged(3, 20);
        assert_eq!(filter.offset(), 40);
        let filter = OrderQueryFilter::default().paged(0, 500);
        assert_eq!(filter.page, 1);
        assert_eq!(filter.page_size, 100);
        assert!(!filter.has_criteria());
    }
}
