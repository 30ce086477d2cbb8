//! Persistence records for the storefront schema.
//!
//! These mirror the tables one-to-one. Input validation lives separately in
//! [`crate::service::validation`]; nothing here decides what a request may contain.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

pub type CustomerId = i32;
pub type OrderId = i32;
pub type ProductId = i32;
pub type AccountId = i32;

pub const NAME_MAX_LEN: usize = 255;
pub const EMAIL_MAX_LEN: usize = 320;
pub const PHONE_MAX_LEN: usize = 15;
pub const USERNAME_MAX_LEN: usize = 255;
pub const PASSWORD_MAX_LEN: usize = 255;

/// Row of `customers`. Serializes to the `{id, name, email, phone}` listing shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Full field set written on insert and on update (no partial patch).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl NewCustomer {
    pub fn into_customer(self, id: CustomerId) -> Customer {
        Customer {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
        }
    }
}

/// Row of `orders`. `customer_id` is nullable at the schema level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub date: NaiveDate,
    pub customer_id: Option<CustomerId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewOrder {
    pub date: NaiveDate,
    pub customer_id: Option<CustomerId>,
    pub product_ids: Vec<ProductId>,
}

/// Row of `customer_accounts`.
///
/// The password is an opaque string stored exactly as given. It is not hashed;
/// it is only kept out of serialized output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CustomerAccount {
    pub id: AccountId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub customer_id: Option<CustomerId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub customer_id: Option<CustomerId>,
}

/// Row of `products`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
}

/// Row of the `order_product` join table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderProduct {
    pub order_id: OrderId,
    pub product_id: ProductId,
}
