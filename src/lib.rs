//! Sensor metrics service with natural-language querying.
//!
//! Readings are ingested over HTTP and stored in PostgreSQL. Questions in
//! plain English are translated to SQL by an external chat-completion oracle,
//! gated on the oracle's own validity flag, and executed against the one
//! `sensor_metrics` table.
//!
//! Module boundaries follow the Explicit Module Boundary Pattern (EMBP):
//! sibling modules reach each other only through the re-exports below.

pub mod config;
pub mod models;
pub mod nlq;
pub mod routes;
pub mod schema;
pub mod seed;
pub mod store;
pub mod telemetry;

pub use config::{Config, ConfigError};
pub use models::{NewSensorMetric, QueryRows, SensorMetric, ValidMetric};
pub use nlq::{AcceptedQuery, NaturalLanguageQuery, QueryTranslator, TranslateError, TranslatedQuery};
pub use routes::{router, AppState};
pub use store::{MetricStore, PgStore, StoreError};
