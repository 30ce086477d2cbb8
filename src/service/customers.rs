//! Customer operations: validate the payload, then hand typed records to the store.

use super::validation::{RequestValidator, CUSTOMER_CONTRACT};
use crate::error::AppError;
use crate::model::{Customer, CustomerId, NewCustomer};
use crate::store::{DeletePolicy, Deleted, Store};
use serde_json::{Map, Value};

pub struct CustomerService;

impl CustomerService {
    pub async fn list(store: &dyn Store) -> Result<Vec<Customer>, AppError> {
        store.list_customers().await
    }

    pub async fn get(store: &dyn Store, id: CustomerId) -> Result<Customer, AppError> {
        store.get_customer(id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn create(store: &dyn Store, body: &Value) -> Result<Customer, AppError> {
        let new = parse_customer(body)?;
        let customer = store.create_customer(&new).await?;
        tracing::info!(id = customer.id, "customer created");
        Ok(customer)
    }

    /// The id is looked up before the body is validated, so a missing customer is
    /// reported as not found even when the payload is also invalid.
    pub async fn update(store: &dyn Store, id: CustomerId, body: &Value) -> Result<Customer, AppError> {
        Self::get(store, id).await?;
        let new = parse_customer(body)?;
        let customer = store
            .update_customer(id, &new)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(id, "customer updated");
        Ok(customer)
    }

    pub async fn delete(store: &dyn Store, id: CustomerId, policy: DeletePolicy) -> Result<(), AppError> {
        match store.delete_customer(id, policy).await {
            Ok(Deleted::Removed) => {
                tracing::info!(id, ?policy, "customer deleted");
                Ok(())
            }
            Ok(Deleted::Missing) => Err(not_found(id)),
            Err(AppError::Conflict(msg)) => {
                tracing::warn!(id, reason = %msg, "customer delete refused");
                Err(AppError::Conflict(msg))
            }
            Err(e) => Err(e),
        }
    }
}

fn not_found(id: CustomerId) -> AppError {
    AppError::NotFound(format!("customer {}", id))
}

fn parse_customer(body: &Value) -> Result<NewCustomer, AppError> {
    let obj = RequestValidator::validate(body, &CUSTOMER_CONTRACT)?;
    Ok(NewCustomer {
        name: string_field(obj, "name").unwrap_or_default(),
        email: string_field(obj, "email"),
        phone: string_field(obj, "phone"),
    })
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_owned)
}
