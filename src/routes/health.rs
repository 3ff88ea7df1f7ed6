// src/routes/health.rs
//! Liveness endpoint for the sensor query service.
//!
//! `/health` is polled by container orchestrators and CI to check that the
//! process is up and answering HTTP. It is a sibling module in the `routes`
//! directory and follows the Explicit Module Boundary Pattern (EMBP):
//! - Internal to this file: the handler and its response type
//! - Exports to the gateway (`mod.rs`): a subrouter containing `/health`

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};

/// JSON response body for the `/health` endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Handle `GET /health`.
///
/// Touches neither the database nor the translation oracle.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Subrouter with the `/health` route, generic over the gateway state.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
