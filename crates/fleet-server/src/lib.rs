//! HTTP surface of the Fleet Assistant backend.
//!
//! `/api/genie` relays chat turns to Genie, `/api/turbine` serves the
//! simulated fleet, and `/health` answers liveness probes.

use axum::routing::get;
use axum::{Json, Router};
use fleet_config::AppConfig;
use fleet_core::Result;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(liveness))
        .nest("/api/genie", routes::genie::router())
        .nest("/api/turbine", routes::turbine::router())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Binds `config.server.bind` and serves until Ctrl-C.
pub async fn serve(config: AppConfig) -> Result<()> {
    let addr = config.server.socket_addr()?;
    let app = build_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "starting fleet-assistant");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn liveness() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
