//! HTTP gateway: merges every subrouter and binds the shared state.

use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json, Router};
use serde::{Deserialize, Serialize};

use crate::{MetricStore, QueryTranslator};

mod add_metric;
mod health;
mod query_metrics;

// ---

/// State shared by all handlers. Both members are read-only.
#[derive(Clone)]
pub struct AppState {
    // ---
    pub translator: Arc<QueryTranslator>,
    pub store: Arc<dyn MetricStore>,
}

impl AppState {
    pub fn new(translator: QueryTranslator, store: Arc<dyn MetricStore>) -> Self {
        Self {
            translator: Arc::new(translator),
            store,
        }
    }
}

/// JSON error body, `{"detail": "..."}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

pub(crate) fn error_response(status: StatusCode, detail: impl Into<String>) -> Response {
    // ---
    (
        status,
        Json(ErrorBody {
            detail: detail.into(),
        }),
    )
        .into_response()
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(add_metric::router())
        .merge(query_metrics::router())
        .merge(health::router())
        .with_state(state)
}
