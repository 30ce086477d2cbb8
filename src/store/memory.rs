//! In-process store with the same integrity rules as the PostgreSQL schema.
//! Used by tests and by `DATABASE_URL=memory`.

use super::{ensure_account_fits, ensure_price_non_negative, DeletePolicy, Deleted, Store};
use crate::error::AppError;
use crate::model::{
    AccountId, Customer, CustomerAccount, CustomerId, NewAccount, NewCustomer, NewOrder, NewProduct, Order, OrderId,
    OrderProduct, Product, ProductId,
};
use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Tables {
    customers: BTreeMap<CustomerId, Customer>,
    orders: BTreeMap<OrderId, Order>,
    accounts: BTreeMap<AccountId, CustomerAccount>,
    products: BTreeMap<ProductId, Product>,
    order_product: BTreeSet<OrderProduct>,
    seq: Sequences,
}

/// Serial counters; ids are never reused, like a SERIAL column.
#[derive(Default)]
struct Sequences {
    customer: i32,
    order: i32,
    account: i32,
    product: i32,
}

/// `NUMERIC(12, 2)` keeps two places, rounding half away from zero.
const PRICE_SCALE: u32 = 2;

fn to_price_scale(price: Decimal) -> Decimal {
    let mut rounded = price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(PRICE_SCALE);
    rounded
}

fn next(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Tables {
    fn require_customer(&self, id: Option<CustomerId>, what: &str) -> Result<(), AppError> {
        match id {
            Some(id) if !self.customers.contains_key(&id) => Err(AppError::Conflict(format!(
                "{} references a missing or dependent record",
                what
            ))),
            _ => Ok(()),
        }
    }

    fn dependents_of(&self, id: CustomerId) -> (usize, usize) {
        let orders = self.orders.values().filter(|o| o.customer_id == Some(id)).count();
        let accounts = self.accounts.values().filter(|a| a.customer_id == Some(id)).count();
        (orders, accounts)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        Ok(self.read().customers.values().cloned().collect())
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, AppError> {
        Ok(self.read().customers.get(&id).cloned())
    }

    async fn create_customer(&self, new: &NewCustomer) -> Result<Customer, AppError> {
        let mut t = self.write();
        let id = next(&mut t.seq.customer);
        let customer = new.clone().into_customer(id);
        t.customers.insert(id, customer.clone());
        Ok(customer)
    }

    async fn update_customer(&self, id: CustomerId, new: &NewCustomer) -> Result<Option<Customer>, AppError> {
        let mut t = self.write();
        Ok(t.customers.get_mut(&id).map(|row| {
            *row = new.clone().into_customer(id);
            row.clone()
        }))
    }

    async fn delete_customer(&self, id: CustomerId, policy: DeletePolicy) -> Result<Deleted, AppError> {
        let mut t = self.write();
        if !t.customers.contains_key(&id) {
            return Ok(Deleted::Missing);
        }
        match policy {
            DeletePolicy::Restrict => {
                let (orders, accounts) = t.dependents_of(id);
                if orders > 0 || accounts > 0 {
                    return Err(AppError::Conflict(format!(
                        "customer {} has {} order(s) and {} account(s)",
                        id, orders, accounts
                    )));
                }
            }
            DeletePolicy::Cascade => {
                let order_ids: BTreeSet<OrderId> = t
                    .orders
                    .values()
                    .filter(|o| o.customer_id == Some(id))
                    .map(|o| o.id)
                    .collect();
                t.order_product.retain(|op| !order_ids.contains(&op.order_id));
                t.orders.retain(|order_id, _| !order_ids.contains(order_id));
                t.accounts.retain(|_, a| a.customer_id != Some(id));
            }
            DeletePolicy::Nullify => {
                for order in t.orders.values_mut().filter(|o| o.customer_id == Some(id)) {
                    order.customer_id = None;
                }
                for account in t.accounts.values_mut().filter(|a| a.customer_id == Some(id)) {
                    account.customer_id = None;
                }
            }
        }
        t.customers.remove(&id);
        Ok(Deleted::Removed)
    }

    async fn create_account(&self, new: &NewAccount) -> Result<CustomerAccount, AppError> {
        ensure_account_fits(new)?;
        let mut t = self.write();
        t.require_customer(new.customer_id, "account")?;
        let taken = t.accounts.values().any(|a| {
            a.username == new.username || (new.customer_id.is_some() && a.customer_id == new.customer_id)
        });
        if taken {
            return Err(AppError::Conflict("account already exists".into()));
        }
        let account = CustomerAccount {
            id: next(&mut t.seq.account),
            username: new.username.clone(),
            password: new.password.clone(),
            customer_id: new.customer_id,
        };
        t.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn account_for_customer(&self, customer_id: CustomerId) -> Result<Option<CustomerAccount>, AppError> {
        Ok(self
            .read()
            .accounts
            .values()
            .find(|a| a.customer_id == Some(customer_id))
            .cloned())
    }

    async fn create_product(&self, new: &NewProduct) -> Result<Product, AppError> {
        ensure_price_non_negative(new)?;
        let mut t = self.write();
        let product = Product {
            id: next(&mut t.seq.product),
            name: new.name.clone(),
            price: to_price_scale(new.price),
        };
        t.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        Ok(self.read().products.values().cloned().collect())
    }

    async fn create_order(&self, new: &NewOrder) -> Result<Order, AppError> {
        let mut t = self.write();
        t.require_customer(new.customer_id, "order")?;
        if new.product_ids.iter().any(|p| !t.products.contains_key(p)) {
            return Err(AppError::Conflict(
                "order product references a missing or dependent record".into(),
            ));
        }
        let order = Order {
            id: next(&mut t.seq.order),
            date: new.date,
            customer_id: new.customer_id,
        };
        t.orders.insert(order.id, order.clone());
        for &product_id in &new.product_ids {
            t.order_product.insert(OrderProduct {
                order_id: order.id,
                product_id,
            });
        }
        Ok(order)
    }

    async fn orders_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>, AppError> {
        Ok(self
            .read()
            .orders
            .values()
            .filter(|o| o.customer_id == Some(customer_id))
            .cloned()
            .collect())
    }

    async fn products_for_order(&self, order_id: OrderId) -> Result<Vec<Product>, AppError> {
        let t = self.read();
        Ok(t.order_product
            .iter()
            .filter(|op| op.order_id == order_id)
            .filter_map(|op| t.products.get(&op.product_id).cloned())
            .collect())
    }
}
