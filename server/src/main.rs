//! Customer service binary.
//!
//! Run from repo root: `cargo run -p ecommerce-server`
//! Set `DATABASE_URL=memory` to run without PostgreSQL.

use ecommerce_api::store::connect;
use ecommerce_api::{app, ensure_schema, AppState, MemoryStore, PgStore, ServiceConfig, SharedStore};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ecommerce_api=info,tower_http=info")),
        )
        .init();

    let config = ServiceConfig::from_env()?;

    let store: SharedStore = if config.uses_memory_store() {
        tracing::warn!("DATABASE_URL=memory: data is kept in process and lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let pool = connect(&config).await?;
        ensure_schema(&pool).await?;
        Arc::new(PgStore::new(pool))
    };

    let state = AppState::new(store, config.delete_policy);
    let router = app(state, config.max_body_bytes);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        delete_policy = ?config.delete_policy,
        "listening on http://{}",
        listener.local_addr()?
    );
    axum::serve(listener, router).await?;
    Ok(())
}
