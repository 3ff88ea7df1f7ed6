use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, response::Response,
    routing::get, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use super::{error_response, AppState};
use crate::{NaturalLanguageQuery, TranslateError};

// ---

pub const PARSE_FAILURE_DETAIL: &str = "Error parsing the natural language query.";
pub const INVALID_QUERY_DETAIL: &str = "Invalid SQL query generated from the natural language input.";
pub const EXECUTION_FAILURE_DETAIL: &str = "Database error while executing the query.";

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/metrics/query", get(handler))
}

/// Query parameters for `GET /metrics/query`.
#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    /// Free-text question. Absent is treated as empty.
    #[serde(default)]
    input_query: Option<String>,
}

#[derive(Debug, Serialize)]
struct QueryResponse {
    data: Vec<Map<String, Value>>,
}

/// Handle `GET /metrics/query`: translate, gate, execute.
///
/// Oracle failures and gate rejections are both 400 but carry different
/// details; execution failures are 500.
async fn handler(Query(params): Query<MetricsQuery>, State(state): State<AppState>) -> Response {
    // ---
    let span = info_span!("metrics_query", request_id = %Uuid::new_v4());

    async move {
        let question = NaturalLanguageQuery::new(params.input_query.unwrap_or_default());

        let accepted = match state.translator.accept(&question).await {
            Ok(accepted) => accepted,
            Err(TranslateError::Oracle(_)) => {
                return error_response(StatusCode::BAD_REQUEST, PARSE_FAILURE_DETAIL);
            }
            Err(TranslateError::InvalidQuery { .. }) => {
                return error_response(StatusCode::BAD_REQUEST, INVALID_QUERY_DETAIL);
            }
        };

        match state.store.execute(&accepted).await {
            Ok(rows) => {
                let data = rows.into_records();
                info!("GET /metrics/query - returning {} rows", data.len());
                (StatusCode::OK, Json(QueryResponse { data })).into_response()
            }
            Err(e) => {
                error!("Query execution failed: {}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, EXECUTION_FAILURE_DETAIL)
            }
        }
    }
    .instrument(span)
    .await
}
