//! Simple data models for the sensor metrics service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---

/// Incoming reading on `POST /metrics`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NewSensorMetric {
    // ---
    pub sensor_id: i64,
    /// Accepted for compatibility; the stored timestamp is the server's receive time.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
}

/// A row of `sensor_metrics`.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SensorMetric {
    // ---
    pub id: i32,
    pub sensor_id: i32,
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
}

/// Validation helpers
impl NewSensorMetric {
    // ---
    /// Check the payload and produce the row to insert, stamped with `received_at`.
    pub fn validate(&self, received_at: DateTime<Utc>) -> Result<ValidMetric, String> {
        // ---
        if self.sensor_id <= 0 {
            return Err("Sensor ID must be a positive integer.".to_string());
        }
        let sensor_id = i32::try_from(self.sensor_id)
            .map_err(|_| format!("Sensor ID {} is out of range.", self.sensor_id))?;

        for (name, value) in [
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("wind_speed", self.wind_speed),
        ] {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(format!("{name} must be a finite number."));
            }
        }

        Ok(ValidMetric {
            sensor_id,
            timestamp: received_at,
            temperature: self.temperature,
            humidity: self.humidity,
            wind_speed: self.wind_speed,
        })
    }
}

/// A reading that passed validation and is ready to store.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidMetric {
    pub sensor_id: i32,
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
}

/// Generic tabular result of an executed query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryRows {
    /// One JSON object per row keyed by column name.
    ///
    /// Duplicate column names keep the right-most value.
    pub fn into_records(self) -> Vec<Map<String, Value>> {
        // ---
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|row| columns.iter().cloned().zip(row).collect())
            .collect()
    }
}
