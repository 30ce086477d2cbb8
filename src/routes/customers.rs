//! Customer CRUD routes.

use crate::handlers::customers::{create, delete as delete_handler, list, update};
use crate::state::AppState;
use axum::{routing::get, routing::put, Router};

pub fn customer_routes(state: AppState) -> Router {
    Router::new()
        .route("/customers", get(list).post(create))
        .route("/customers/:id", put(update).delete(delete_handler))
        .with_state(state)
}
