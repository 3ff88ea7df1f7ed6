//! Populate `sensor_metrics` with synthetic readings.
//!
//! Uses `DATABASE_URL` (and `DB_POOL_MAX`) only; the oracle credential is not
//! needed to seed.
use std::env;

use anyhow::{Context, Result};
use chrono::Utc;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;

use codemetal_sensorquery::seed::{self, SeedPlan};
use codemetal_sensorquery::{schema, telemetry, MetricStore, PgStore};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    telemetry::init_tracing();
    dotenv().ok();

    let db_url = env::var("DATABASE_URL").context("DATABASE_URL must be set in .env or environment")?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await
        .context("Failed to connect to database")?;

    schema::create_schema(&pool)
        .await
        .context("Failed to create database schema")?;

    let plan = SeedPlan::default();
    let readings = seed::generate(&plan, Utc::now(), &mut rand::rng());
    tracing::info!(
        "Generated {} readings for {} sensors",
        readings.len(),
        plan.sensor_ids.len()
    );

    let store = PgStore::new(pool);
    let inserted = store.insert_batch(&readings).await?;
    tracing::info!("Inserted {} sample records into the database.", inserted);

    Ok(())
}
