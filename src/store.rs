//! Persistence for sensor readings and execution of accepted queries.
//!
//! Handlers talk to [`MetricStore`]; [`PgStore`] is the PostgreSQL
//! implementation. Query execution only takes an [`AcceptedQuery`], so text
//! the validity gate rejected cannot reach the database.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::types::{Decimal, Uuid};
use sqlx::{Column, Executor, Row, Statement, TypeInfo, ValueRef};
use thiserror::Error;

use crate::{AcceptedQuery, QueryRows, SensorMetric, ValidMetric};

// ---

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait MetricStore: Send + Sync {
    /// Insert one reading and return the stored row.
    async fn insert_metric(&self, metric: &ValidMetric) -> Result<SensorMetric, StoreError>;

    /// Insert many readings in one transaction, returning how many were written.
    async fn insert_batch(&self, metrics: &[ValidMetric]) -> Result<u64, StoreError>;

    /// Run accepted query text verbatim as a single read-only statement.
    async fn execute(&self, query: &AcceptedQuery) -> Result<QueryRows, StoreError>;
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

const INSERT_METRIC: &str = r#"
    INSERT INTO sensor_metrics (sensor_id, timestamp, temperature, humidity, wind_speed)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, sensor_id, timestamp, temperature, humidity, wind_speed
"#;

#[async_trait]
impl MetricStore for PgStore {
    async fn insert_metric(&self, metric: &ValidMetric) -> Result<SensorMetric, StoreError> {
        // ---
        let row = sqlx::query_as::<_, SensorMetric>(INSERT_METRIC)
            .bind(metric.sensor_id)
            .bind(metric.timestamp)
            .bind(metric.temperature)
            .bind(metric.humidity)
            .bind(metric.wind_speed)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn insert_batch(&self, metrics: &[ValidMetric]) -> Result<u64, StoreError> {
        // ---
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for metric in metrics {
            sqlx::query(
                r#"
                INSERT INTO sensor_metrics (sensor_id, timestamp, temperature, humidity, wind_speed)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(metric.sensor_id)
            .bind(metric.timestamp)
            .bind(metric.temperature)
            .bind(metric.humidity)
            .bind(metric.wind_speed)
            .execute(&mut *tx)
            .await?;
            written += 1;
        }

        tx.commit().await?;
        Ok(written)
    }

    async fn execute(&self, query: &AcceptedQuery) -> Result<QueryRows, StoreError> {
        // ---
        tracing::debug!("Executing accepted query: {}", query.as_str());

        // Read-only and always rolled back: the query endpoint never persists writes
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await?;

        // A prepared statement holds exactly one command; multi-statement text fails here
        let statement = (&mut *tx).prepare(query.as_str()).await?;
        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let fetched: Vec<PgRow> = statement.query().fetch_all(&mut *tx).await?;
        tx.rollback().await?;

        let rows: Vec<Vec<Value>> = fetched
            .iter()
            .map(|row| (0..row.len()).map(|i| cell_to_json(row, i)).collect::<Vec<_>>())
            .collect();

        Ok(QueryRows { columns, rows })
    }
}

/// Decode one cell into a JSON scalar based on its PostgreSQL type.
///
/// Types without a mapping come back as `null`.
fn cell_to_json(row: &PgRow, index: usize) -> Value {
    // ---
    let is_null = row
        .try_get_raw(index)
        .map(|raw| raw.is_null())
        .unwrap_or(true);
    if is_null {
        return Value::Null;
    }

    let type_name = row.columns()[index].type_info().name().to_string();
    let decoded = match type_name.as_str() {
        "BOOL" => row.try_get::<bool, _>(index).map(Value::from),
        "INT2" => row.try_get::<i16, _>(index).map(Value::from),
        "INT4" => row.try_get::<i32, _>(index).map(Value::from),
        "INT8" => row.try_get::<i64, _>(index).map(Value::from),
        "FLOAT4" => row.try_get::<f32, _>(index).map(|v| float_value(f64::from(v))),
        "FLOAT8" => row.try_get::<f64, _>(index).map(float_value),
        "NUMERIC" => row
            .try_get::<Decimal, _>(index)
            .map(|v| v.to_string().parse::<f64>().map(float_value).unwrap_or(Value::Null)),
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => {
            row.try_get::<String, _>(index).map(Value::from)
        }
        "TIMESTAMPTZ" => row
            .try_get::<DateTime<Utc>, _>(index)
            .map(|v| Value::from(v.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<NaiveDateTime, _>(index)
            .map(|v| Value::from(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())),
        "DATE" => row
            .try_get::<NaiveDate, _>(index)
            .map(|v| Value::from(v.to_string())),
        "UUID" => row.try_get::<Uuid, _>(index).map(|v| Value::from(v.to_string())),
        other => {
            tracing::warn!("No JSON mapping for column type {}, returning null", other);
            return Value::Null;
        }
    };

    decoded.unwrap_or_else(|e| {
        tracing::warn!("Failed to decode column {} ({}): {}", index, type_name, e);
        Value::Null
    })
}

/// JSON has no NaN or infinity.
fn float_value(v: f64) -> Value {
    serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
}
