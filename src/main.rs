//! Application entry point for the `codemetal-sensorquery` service.
//!
//! This binary orchestrates the full startup sequence, including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Building the translation oracle client (fatal without a credential)
//! - Establishing a PostgreSQL connection pool
//! - Creating the database schema if it does not exist
//! - Mounting all API routes via the `routes` gateway (EMBP pattern)
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `DATABASE_URL` (**required**) – PostgreSQL connection string
//! - `OPENAI_API_KEY` (**required**) – translation oracle credential
//! - `OPENAI_MODEL`, `OPENAI_BASE_URL` (optional) – oracle model and API root
//! - `DB_POOL_MAX` (optional) – maximum number of DB connections (default: 5)
//! - `HTTP_PORT` (optional) – listen port (default: 8080)
//! - `AXUM_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AXUM_SPAN_EVENTS` (optional) – span event mode for tracing
use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;

use codemetal_sensorquery::{config, router, schema, telemetry, AppState, PgStore, QueryTranslator};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    telemetry::init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let translator = QueryTranslator::from_config(cfg.oracle())
        .context("Failed to build translation oracle client")?;

    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect(&cfg.db_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Successfully connected to database");

    schema::create_schema(&pool)
        .await
        .context("Failed to create database schema")?;

    // Build app from routes gateway (EMBP)
    let state = AppState::new(translator, Arc::new(PgStore::new(pool)));
    let app: Router = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.http_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
