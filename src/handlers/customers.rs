//! Customer handlers: list, create, update, delete.

use crate::error::AppError;
use crate::model::CustomerId;
use crate::response::{self, CUSTOMER_CREATED, CUSTOMER_REMOVED, CUSTOMER_UPDATED};
use crate::service::CustomerService;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

/// Ids that are not integers cannot name a customer, so they read as not found.
fn parse_id(id_str: &str) -> Result<CustomerId, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::NotFound(format!("customer {}", id_str)))
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let rows = CustomerService::list(state.store.as_ref()).await?;
    Ok(response::many(rows))
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    CustomerService::create(state.store.as_ref(), &body).await?;
    Ok(response::message(StatusCode::CREATED, CUSTOMER_CREATED))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            CustomerService::get(state.store.as_ref(), id).await?;
            return Err(rejection.into());
        }
    };
    CustomerService::update(state.store.as_ref(), id, &body).await?;
    Ok(response::message(StatusCode::OK, CUSTOMER_UPDATED))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    CustomerService::delete(state.store.as_ref(), id, state.delete_policy).await?;
    Ok(response::message(StatusCode::OK, CUSTOMER_REMOVED))
}
