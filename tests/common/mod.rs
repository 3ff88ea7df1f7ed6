//! Fakes for the oracle and the store, plus request helpers.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt; // for oneshot()

use codemetal_sensorquery::nlq::{
    CompletionClient, CompletionRequest, CompletionResponse, OracleError,
};
use codemetal_sensorquery::{
    router, AcceptedQuery, AppState, MetricStore, QueryRows, QueryTranslator, SensorMetric,
    StoreError, TranslatedQuery, ValidMetric,
};

// ---

pub enum OracleReply {
    Answer(TranslatedQuery),
    Fail(String),
}

pub struct FakeOracle {
    pub reply: OracleReply,
    pub calls: Mutex<Vec<CompletionRequest>>,
}

impl FakeOracle {
    pub fn answering(query_text: &str, is_valid: bool) -> Arc<Self> {
        // ---
        Arc::new(Self {
            reply: OracleReply::Answer(TranslatedQuery::new(query_text, is_valid)),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        // ---
        Arc::new(Self {
            reply: OracleReply::Fail(message.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for FakeOracle {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, OracleError> {
        // ---
        self.calls.lock().unwrap().push(request.clone());
        match &self.reply {
            OracleReply::Answer(answer) => Ok(CompletionResponse::with_content(
                serde_json::to_string(answer).unwrap(),
            )),
            OracleReply::Fail(message) => Err(OracleError::Provider {
                status: 500,
                message: message.clone(),
            }),
        }
    }
}

/// In-memory store. Execution ignores the text and returns `rows`.
pub struct FakeStore {
    pub rows: Option<QueryRows>,
    pub executed: Mutex<Vec<String>>,
    pub inserted: Mutex<Vec<ValidMetric>>,
    pub fail_inserts: bool,
}

impl FakeStore {
    pub fn returning(rows: QueryRows) -> Arc<Self> {
        // ---
        Arc::new(Self {
            rows: Some(rows),
            executed: Mutex::new(Vec::new()),
            inserted: Mutex::new(Vec::new()),
            fail_inserts: false,
        })
    }

    /// Every execute fails, like a query the database refuses.
    pub fn broken() -> Arc<Self> {
        // ---
        Arc::new(Self {
            rows: None,
            executed: Mutex::new(Vec::new()),
            inserted: Mutex::new(Vec::new()),
            fail_inserts: true,
        })
    }

    pub fn averages() -> Arc<Self> {
        // ---
        Self::returning(QueryRows {
            columns: vec!["avg_temperature".to_string(), "avg_humidity".to_string()],
            rows: vec![vec![json!(25.0), json!(50.0)]],
        })
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetricStore for FakeStore {
    async fn insert_metric(&self, metric: &ValidMetric) -> Result<SensorMetric, StoreError> {
        // ---
        if self.fail_inserts {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut inserted = self.inserted.lock().unwrap();
        inserted.push(metric.clone());
        Ok(SensorMetric {
            id: inserted.len() as i32,
            sensor_id: metric.sensor_id,
            timestamp: metric.timestamp,
            temperature: metric.temperature,
            humidity: metric.humidity,
            wind_speed: metric.wind_speed,
        })
    }

    async fn insert_batch(&self, metrics: &[ValidMetric]) -> Result<u64, StoreError> {
        // ---
        for metric in metrics {
            self.insert_metric(metric).await?;
        }
        Ok(metrics.len() as u64)
    }

    async fn execute(&self, query: &AcceptedQuery) -> Result<QueryRows, StoreError> {
        // ---
        self.executed.lock().unwrap().push(query.as_str().to_string());
        self.rows
            .clone()
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))
    }
}

pub fn app(oracle: Arc<FakeOracle>, store: Arc<FakeStore>) -> Router {
    // ---
    let translator = QueryTranslator::new(oracle, "gpt-4o");
    router(AppState::new(translator, store))
}

/// Send one request through the router, returning status and JSON body.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    // ---
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    // ---
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
