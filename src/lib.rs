//! Customer CRUD service over a relational e-commerce schema
//! (customers, orders, accounts, products).

pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use config::ServiceConfig;
pub use error::{AppError, ConfigError, FieldErrors};
pub use routes::{app, common_routes, customer_routes};
pub use service::CustomerService;
pub use state::AppState;
pub use store::{ensure_schema, DeletePolicy, MemoryStore, PgStore, SharedStore, Store};
