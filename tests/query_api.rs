//! In-process tests for the HTTP API.
//!
//! Uses Axum's tower integration with a fake oracle and a fake store, so no
//! network, provider key, or database is needed.

mod common;

use std::io;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use serde_json::json;
use tracing_subscriber::fmt::MakeWriter;

use common::{app, get, post_json, send, FakeOracle, FakeStore};

// ---

const SENSOR_ONE_SQL: &str = "SELECT AVG(temperature) FROM sensor_metrics WHERE sensor_id = 1;";

#[tokio::test]
async fn query_valid_translation_is_executed() {
    // ---
    let oracle = FakeOracle::answering(SENSOR_ONE_SQL, true);
    let store = FakeStore::averages();

    let (status, body) = send(
        app(oracle.clone(), store.clone()),
        get("/metrics/query?input_query=What%20is%20the%20average%20temperature%20from%20sensor%201%3F"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"data": [{"avg_temperature": 25.0, "avg_humidity": 50.0}]})
    );
    assert_eq!(oracle.call_count(), 1);
    assert_eq!(store.executed(), vec![SENSOR_ONE_SQL.to_string()]);

    // The literal question reached the oracle
    let calls = oracle.calls.lock().unwrap();
    assert!(calls[0].messages[0]
        .content
        .contains("\"What is the average temperature from sensor 1?\""));
}

#[tokio::test]
async fn query_invalid_translation_is_never_executed() {
    // ---
    let oracle = FakeOracle::answering("SELECT AVG(temperature) FROM sensor_metrics;", false);
    let store = FakeStore::averages();

    let (status, body) = send(
        app(oracle.clone(), store.clone()),
        get("/metrics/query?input_query=What%20is%20the%20average%20temperature%3F"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("Invalid SQL query generated"));
    assert_eq!(oracle.call_count(), 1);
    assert!(store.executed().is_empty());
}

#[tokio::test]
async fn query_invalid_empty_translation_is_rejected() {
    // ---
    let oracle = FakeOracle::answering("", false);
    let store = FakeStore::averages();

    let (status, _) = send(
        app(oracle, store.clone()),
        get("/metrics/query?input_query=tell%20me%20a%20joke"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(store.executed().is_empty());
}

#[tokio::test]
async fn query_oracle_failure_is_a_distinct_400() {
    // ---
    let oracle = FakeOracle::failing("API error");
    let store = FakeStore::averages();

    let (status, body) = send(
        app(oracle.clone(), store.clone()),
        get("/metrics/query?input_query=What%20is%20the%20average%20temperature%3F"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Error parsing the natural language query.");
    assert_eq!(oracle.call_count(), 1, "no retry");
    assert!(store.executed().is_empty());
}

#[tokio::test]
async fn query_missing_parameter_is_translated_as_empty() {
    // ---
    let oracle = FakeOracle::answering("", false);
    let store = FakeStore::averages();

    let (status, _) = send(app(oracle.clone(), store), get("/metrics/query")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let calls = oracle.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].messages[0].content.contains("Natural Language Query:\n\"\""));
}

#[tokio::test]
async fn query_execution_failure_is_500() {
    // ---
    let oracle = FakeOracle::answering("SELECT nonsense FROM nowhere;", true);
    let store = FakeStore::broken();

    let (status, body) = send(
        app(oracle, store.clone()),
        get("/metrics/query?input_query=anything"),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Database error while executing the query.");
    assert_eq!(store.executed(), vec!["SELECT nonsense FROM nowhere;".to_string()]);
}

#[tokio::test]
async fn add_metric_success() {
    // ---
    let store = FakeStore::averages();
    let payload = r#"{
        "sensor_id": 1,
        "timestamp": "2025-03-27T12:34:56Z",
        "temperature": 24.5,
        "humidity": 60,
        "wind_speed": 5.2
    }"#;

    let (status, body) = send(
        app(FakeOracle::answering("", false), store.clone()),
        post_json("/metrics", payload),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Metric added successfully");
    assert_eq!(body["id"], 1);

    let inserted = store.inserted.lock().unwrap();
    assert_eq!(inserted.len(), 1);
    assert_eq!(inserted[0].sensor_id, 1);
    assert_eq!(inserted[0].humidity, Some(60.0));
    // Receive time wins over the client timestamp
    assert_ne!(inserted[0].timestamp.to_rfc3339(), "2025-03-27T12:34:56+00:00");
}

#[tokio::test]
async fn add_metric_rejects_bad_sensor_id() {
    // ---
    let store = FakeStore::averages();

    for payload in [
        r#"{"sensor_id": 0}"#,
        r#"{"sensor_id": -4, "temperature": 20.0}"#,
        r#"{"sensor_id": "abc"}"#,
        r#"{"temperature": 20.0}"#,
    ] {
        let (status, body) = send(
            app(FakeOracle::answering("", false), store.clone()),
            post_json("/metrics", payload),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "payload {payload}");
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .starts_with("Validation error:"));
    }
    assert!(store.inserted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn add_metric_database_failure_is_500() {
    // ---
    let (status, body) = send(
        app(FakeOracle::answering("", false), FakeStore::broken()),
        post_json("/metrics", r#"{"sensor_id": 3}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["detail"],
        "Failed to add sensor metric due to a database error."
    );
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    // ---
    let oracle = FakeOracle::answering("", false);
    let (status, body) = send(app(oracle.clone(), FakeStore::averages()), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(oracle.call_count(), 0);
}

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn query_question_and_generated_sql_are_logged_once() {
    // ---
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (status, _) = send(
        app(FakeOracle::answering(SENSOR_ONE_SQL, true), FakeStore::averages()),
        get("/metrics/query?input_query=What%20is%20the%20average%20temperature%20from%20sensor%201%3F"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let text = logs.text();
    assert_eq!(
        text.matches("What is the average temperature from sensor 1?").count(),
        1,
        "{text}"
    );
    assert_eq!(text.matches(SENSOR_ONE_SQL).count(), 1, "{text}");
}
