//! Request-level orchestration: validation contracts and the customer service built on them.

mod customers;
pub mod validation;
pub use customers::CustomerService;
pub use validation::{Contract, FieldRule, RequestValidator, CUSTOMER_CONTRACT};
