//! Storage seam. Handlers receive an `Arc<dyn Store>` through axum state; nothing reaches a global session.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{connect, ensure_schema, PgStore};

use crate::error::{AppError, FieldErrors};
use crate::model::{
    Customer, CustomerAccount, CustomerId, NewAccount, NewCustomer, NewOrder, NewProduct, Order, OrderId, Product,
    PASSWORD_MAX_LEN, USERNAME_MAX_LEN,
};
use async_trait::async_trait;
use std::sync::Arc;

/// What happens to a customer's orders and account when the customer is deleted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Refuse while dependents exist.
    #[default]
    Restrict,
    /// Remove join rows, orders, and the account together with the customer.
    Cascade,
    /// Keep orders and the account, clearing their `customer_id`.
    Nullify,
}

impl DeletePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletePolicy::Restrict => "restrict",
            DeletePolicy::Cascade => "cascade",
            DeletePolicy::Nullify => "nullify",
        }
    }
}

impl std::str::FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "restrict" => Ok(DeletePolicy::Restrict),
            "cascade" => Ok(DeletePolicy::Cascade),
            "nullify" => Ok(DeletePolicy::Nullify),
            _ => Err(format!(
                "invalid delete policy: {} (expected restrict, cascade or nullify)",
                s
            )),
        }
    }
}

/// Outcome of a customer delete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Deleted {
    Removed,
    Missing,
}

pub type SharedStore = Arc<dyn Store>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Round-trip to the backing store.
    async fn ping(&self) -> Result<(), AppError>;

    /// All customers, ascending by id.
    async fn list_customers(&self) -> Result<Vec<Customer>, AppError>;

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, AppError>;

    async fn create_customer(&self, new: &NewCustomer) -> Result<Customer, AppError>;

    /// Overwrite every mutable field. `None` when the row is gone.
    async fn update_customer(&self, id: CustomerId, new: &NewCustomer) -> Result<Option<Customer>, AppError>;

    /// Restrict fails with `Conflict` while orders or an account reference the customer;
    /// Nullify detaches them instead.
    async fn delete_customer(&self, id: CustomerId, policy: DeletePolicy) -> Result<Deleted, AppError>;

    /// Username is unique across accounts and a customer holds at most one account.
    async fn create_account(&self, new: &NewAccount) -> Result<CustomerAccount, AppError>;

    async fn account_for_customer(&self, customer_id: CustomerId) -> Result<Option<CustomerAccount>, AppError>;

    async fn create_product(&self, new: &NewProduct) -> Result<Product, AppError>;

    async fn list_products(&self) -> Result<Vec<Product>, AppError>;

    /// Insert the order and its join rows atomically.
    async fn create_order(&self, new: &NewOrder) -> Result<Order, AppError>;

    async fn orders_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>, AppError>;

    async fn products_for_order(&self, order_id: OrderId) -> Result<Vec<Product>, AppError>;
}

/// Column widths of `customer_accounts`; both stores refuse what the table could not hold.
pub(crate) fn ensure_account_fits(new: &NewAccount) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    for (field, value, max) in [
        ("username", &new.username, USERNAME_MAX_LEN),
        ("password", &new.password, PASSWORD_MAX_LEN),
    ] {
        if value.chars().count() > max {
            errors.insert(field.into(), vec![format!("Longer than maximum length {}.", max)]);
        } else if value.contains('\0') {
            errors.insert(field.into(), vec!["Must not contain NUL characters.".into()]);
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub(crate) fn ensure_price_non_negative(new: &NewProduct) -> Result<(), AppError> {
    if new.price.is_sign_negative() && !new.price.is_zero() {
        return Err(AppError::Conflict(format!("product '{}' has a negative price", new.name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_policy_parses_case_insensitively() {
        assert_eq!("RESTRICT".parse::<DeletePolicy>().unwrap(), DeletePolicy::Restrict);
        assert_eq!("cascade".parse::<DeletePolicy>().unwrap(), DeletePolicy::Cascade);
        assert_eq!("Nullify".parse::<DeletePolicy>().unwrap(), DeletePolicy::Nullify);
        assert_eq!(DeletePolicy::Nullify.as_str().parse::<DeletePolicy>().unwrap(), DeletePolicy::Nullify);
        let err = "set_default".parse::<DeletePolicy>().unwrap_err();
        assert!(err.contains("set_default"));
    }

    #[test]
    fn account_widths_checked() {
        let ok = NewAccount {
            username: "ada".into(),
            password: "pw".into(),
            customer_id: None,
        };
        assert!(ensure_account_fits(&ok).is_ok());
        let long = NewAccount {
            username: "u".repeat(USERNAME_MAX_LEN + 1),
            ..ok
        };
        match ensure_account_fits(&long) {
            Err(AppError::Validation(f)) => assert!(f.contains_key("username") && !f.contains_key("password")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn negative_price_rejected() {
        let bad = NewProduct {
            name: "widget".into(),
            price: rust_decimal::Decimal::new(-1, 2),
        };
        assert!(matches!(ensure_price_non_negative(&bad), Err(AppError::Conflict(_))));
        let free = NewProduct {
            name: "sticker".into(),
            price: rust_decimal::Decimal::ZERO,
        };
        assert!(ensure_price_non_negative(&free).is_ok());
    }
}
