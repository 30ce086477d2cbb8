//! Service status endpoints: liveness, store readiness, build identity.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use serde_json::json;

#[derive(Serialize)]
struct Status {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delete_policy: Option<&'static str>,
}

async fn alive() -> Json<Status> {
    Json(Status {
        status: "ok",
        database: None,
        delete_policy: None,
    })
}

/// 503 until the store answers a round-trip.
async fn store_ready(State(state): State<AppState>) -> impl IntoResponse {
    let (code, status, database) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "ok", "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "store not reachable");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
        }
    };
    let body = Status {
        status,
        database: Some(database),
        delete_policy: Some(state.delete_policy.as_str()),
    };
    (code, Json(body))
}

async fn build_info() -> Json<serde_json::Value> {
    Json(json!({ "name": env!("CARGO_PKG_NAME"), "version": env!("CARGO_PKG_VERSION") }))
}

pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(alive))
        .route("/ready", get(store_ready))
        .route("/version", get(build_info))
        .with_state(state)
}
