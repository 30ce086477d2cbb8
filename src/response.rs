//! Response payloads.

use axum::{http::StatusCode, Json};
use serde::Serialize;

pub const CUSTOMER_CREATED: &str = "New Customer added successfully.";
pub const CUSTOMER_UPDATED: &str = "Customer details updated successfully";
pub const CUSTOMER_REMOVED: &str = "Customer removed successfully";

#[derive(Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

pub fn message(status: StatusCode, message: &'static str) -> (StatusCode, Json<MessageBody>) {
    (status, Json(MessageBody { message }))
}

/// Bare JSON array, no envelope.
pub fn many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<Vec<T>>) {
    (StatusCode::OK, Json(data))
}
