//! PostgreSQL-backed store and schema bootstrap.

use super::{ensure_account_fits, ensure_price_non_negative, DeletePolicy, Deleted, Store};
use crate::config::ServiceConfig;
use crate::error::AppError;
use crate::model::{
    Customer, CustomerAccount, CustomerId, NewAccount, NewCustomer, NewOrder, NewProduct, Order, OrderId, Product,
};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Table DDL in dependency order. Every statement is idempotent.
const SCHEMA: &[(&str, &str)] = &[
    (
        "customers",
        r#"
        CREATE TABLE IF NOT EXISTS customers (
            id SERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            email VARCHAR(320),
            phone VARCHAR(15)
        )
        "#,
    ),
    (
        "orders",
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id SERIAL PRIMARY KEY,
            "date" DATE NOT NULL,
            customer_id INTEGER REFERENCES customers (id)
        )
        "#,
    ),
    (
        "customer_accounts",
        r#"
        CREATE TABLE IF NOT EXISTS customer_accounts (
            id SERIAL PRIMARY KEY,
            username VARCHAR(255) NOT NULL UNIQUE,
            password VARCHAR(255) NOT NULL,
            customer_id INTEGER UNIQUE REFERENCES customers (id)
        )
        "#,
    ),
    (
        "products",
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id SERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            price NUMERIC(12, 2) NOT NULL CHECK (price >= 0)
        )
        "#,
    ),
    (
        "order_product",
        r#"
        CREATE TABLE IF NOT EXISTS order_product (
            order_id INTEGER NOT NULL REFERENCES orders (id),
            product_id INTEGER NOT NULL REFERENCES products (id),
            PRIMARY KEY (order_id, product_id)
        )
        "#,
    ),
];

/// Open a pool sized from config.
pub async fn connect(config: &ServiceConfig) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}

/// Create all tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), AppError> {
    for (table, ddl) in SCHEMA {
        tracing::debug!(table = %table, "ensure table");
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

const CUSTOMER_COLUMNS: &str = "id, name, email, phone";
const ACCOUNT_COLUMNS: &str = "id, username, password, customer_id";
const ORDER_COLUMNS: &str = r#"id, "date", customer_id"#;

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        let sql = format!("SELECT {} FROM customers ORDER BY id", CUSTOMER_COLUMNS);
        tracing::debug!(sql = %sql, "query");
        let rows = sqlx::query_as::<_, Customer>(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, AppError> {
        let sql = format!("SELECT {} FROM customers WHERE id = $1", CUSTOMER_COLUMNS);
        tracing::debug!(sql = %sql, id, "query");
        let row = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_customer(&self, new: &NewCustomer) -> Result<Customer, AppError> {
        let sql = format!(
            "INSERT INTO customers (name, email, phone) VALUES ($1, $2, $3) RETURNING {}",
            CUSTOMER_COLUMNS
        );
        tracing::debug!(sql = %sql, "query");
        let row = sqlx::query_as::<_, Customer>(&sql)
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.phone)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::from_constraint(e, "customer"))?;
        Ok(row)
    }

    async fn update_customer(&self, id: CustomerId, new: &NewCustomer) -> Result<Option<Customer>, AppError> {
        let sql = format!(
            "UPDATE customers SET name = $1, email = $2, phone = $3 WHERE id = $4 RETURNING {}",
            CUSTOMER_COLUMNS
        );
        tracing::debug!(sql = %sql, id, "query");
        let row = sqlx::query_as::<_, Customer>(&sql)
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.phone)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_customer(&self, id: CustomerId, policy: DeletePolicy) -> Result<Deleted, AppError> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, i32>("SELECT id FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(Deleted::Missing);
        }

        match policy {
            DeletePolicy::Restrict => {
                let (orders, accounts) = sqlx::query_as::<_, (i64, i64)>(
                    r#"
                    SELECT
                        (SELECT COUNT(*) FROM orders WHERE customer_id = $1),
                        (SELECT COUNT(*) FROM customer_accounts WHERE customer_id = $1)
                    "#,
                )
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
                if orders > 0 || accounts > 0 {
                    return Err(AppError::Conflict(format!(
                        "customer {} has {} order(s) and {} account(s)",
                        id, orders, accounts
                    )));
                }
            }
            DeletePolicy::Cascade => {
                tracing::debug!(id, "cascade delete of customer dependents");
                sqlx::query(
                    "DELETE FROM order_product WHERE order_id IN (SELECT id FROM orders WHERE customer_id = $1)",
                )
                .bind(id)
                .execute(&mut *tx)
                .await?;
                sqlx::query("DELETE FROM orders WHERE customer_id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query("DELETE FROM customer_accounts WHERE customer_id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
            DeletePolicy::Nullify => {
                tracing::debug!(id, "detach customer dependents");
                sqlx::query("UPDATE orders SET customer_id = NULL WHERE customer_id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query("UPDATE customer_accounts SET customer_id = NULL WHERE customer_id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::from_constraint(e, "customer"))?;
        tx.commit().await?;

        Ok(if result.rows_affected() > 0 {
            Deleted::Removed
        } else {
            Deleted::Missing
        })
    }

    async fn create_account(&self, new: &NewAccount) -> Result<CustomerAccount, AppError> {
        ensure_account_fits(new)?;
        let sql = format!(
            "INSERT INTO customer_accounts (username, password, customer_id) VALUES ($1, $2, $3) RETURNING {}",
            ACCOUNT_COLUMNS
        );
        tracing::debug!(sql = %sql, username = %new.username, "query");
        let row = sqlx::query_as::<_, CustomerAccount>(&sql)
            .bind(&new.username)
            .bind(&new.password)
            .bind(new.customer_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::from_constraint(e, "account"))?;
        Ok(row)
    }

    async fn account_for_customer(&self, customer_id: CustomerId) -> Result<Option<CustomerAccount>, AppError> {
        let sql = format!("SELECT {} FROM customer_accounts WHERE customer_id = $1", ACCOUNT_COLUMNS);
        let row = sqlx::query_as::<_, CustomerAccount>(&sql)
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_product(&self, new: &NewProduct) -> Result<Product, AppError> {
        ensure_price_non_negative(new)?;
        let row = sqlx::query_as::<_, Product>(
            "INSERT INTO products (name, price) VALUES ($1, $2) RETURNING id, name, price",
        )
        .bind(&new.name)
        .bind(new.price)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_constraint(e, "product"))?;
        Ok(row)
    }

    async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let rows = sqlx::query_as::<_, Product>("SELECT id, name, price FROM products ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn create_order(&self, new: &NewOrder) -> Result<Order, AppError> {
        let mut product_ids = new.product_ids.clone();
        product_ids.sort_unstable();
        product_ids.dedup();

        let mut tx = self.pool.begin().await?;
        let sql = format!(
            r#"INSERT INTO orders ("date", customer_id) VALUES ($1, $2) RETURNING {}"#,
            ORDER_COLUMNS
        );
        tracing::debug!(sql = %sql, "query (tx)");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(new.date)
            .bind(new.customer_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::from_constraint(e, "order"))?;
        for product_id in product_ids {
            sqlx::query("INSERT INTO order_product (order_id, product_id) VALUES ($1, $2)")
                .bind(order.id)
                .bind(product_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::from_constraint(e, "order product"))?;
        }
        tx.commit().await?;
        Ok(order)
    }

    async fn orders_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Order>, AppError> {
        let sql = format!(
            "SELECT {} FROM orders WHERE customer_id = $1 ORDER BY id",
            ORDER_COLUMNS
        );
        let rows = sqlx::query_as::<_, Order>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn products_for_order(&self, order_id: OrderId) -> Result<Vec<Product>, AppError> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT p.id, p.name, p.price
            FROM products p
            JOIN order_product op ON op.product_id = p.id
            WHERE op.order_id = $1
            ORDER BY p.id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
