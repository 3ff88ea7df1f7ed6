//! Database schema management for `codemetal-sensorquery`.
//!
//! Ensures the `sensor_metrics` table and its indexes exist before serving
//! requests. Applied once on startup (EMBP: single gateway call).

use sqlx::PgPool;

// ---

/// Create the database schema (idempotent).
///
/// The column set must stay in step with `nlq::COLUMNS`, which is what the
/// translation oracle is told about.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sensor_metrics (
            id          SERIAL PRIMARY KEY,
            sensor_id   INTEGER          NOT NULL,
            timestamp   TIMESTAMPTZ      NOT NULL,
            temperature DOUBLE PRECISION,
            humidity    DOUBLE PRECISION,
            wind_speed  DOUBLE PRECISION
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sensor_metrics_sensor_id
            ON sensor_metrics (sensor_id);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sensor_metrics_timestamp
            ON sensor_metrics (timestamp);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
