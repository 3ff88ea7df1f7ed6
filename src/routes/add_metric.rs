use axum::{
    extract::rejection::JsonRejection, extract::State, http::StatusCode, response::IntoResponse,
    response::Response, routing::post, Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info};

use super::{error_response, AppState};
use crate::NewSensorMetric;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/metrics", post(handler))
}

#[derive(Debug, Serialize)]
struct Created {
    message: &'static str,
    id: i32,
}

/// Handle `POST /metrics`: validate, stamp with the receive time, store.
async fn handler(
    State(state): State<AppState>,
    payload: Result<Json<NewSensorMetric>, JsonRejection>,
) -> Response {
    // ---
    let Json(metric) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            debug!("POST /metrics - rejected body: {}", rejection.body_text());
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Validation error: {}", rejection.body_text()),
            );
        }
    };

    let received_at = Utc::now();
    if metric.timestamp.is_some() {
        debug!("POST /metrics - client timestamp replaced by receive time {}", received_at);
    }

    let valid = match metric.validate(received_at) {
        Ok(valid) => valid,
        Err(reason) => {
            debug!("POST /metrics - validation failed: {}", reason);
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Validation error: {reason}"),
            );
        }
    };

    match state.store.insert_metric(&valid).await {
        Ok(stored) => {
            info!(id = stored.id, sensor_id = stored.sensor_id, "Metric stored");
            (
                StatusCode::CREATED,
                Json(Created {
                    message: "Metric added successfully",
                    id: stored.id,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to store metric: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to add sensor metric due to a database error.",
            )
        }
    }
}
