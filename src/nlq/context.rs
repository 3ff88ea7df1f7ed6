//! Schema grounding text supplied to the translation oracle.
//!
//! The only moving part is the timestamp; everything else is fixed for a
//! given [`SCHEMA_VERSION`].

use std::fmt;

use chrono::{DateTime, Utc};

// ---

/// Bumped whenever the described table shape changes.
pub const SCHEMA_VERSION: u32 = 1;

/// The single queryable table.
pub const TABLE_NAME: &str = "sensor_metrics";

/// Aggregate operations named in the prompt. Not enforced on the returned text.
pub const ALLOWED_AGGREGATES: [&str; 4] = ["min", "max", "sum", "average"];

/// Timezone every stored timestamp is expressed in.
pub const TIMEZONE: &str = "UTC";

/// Format used for the current time line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One described column of [`TABLE_NAME`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub description: &'static str,
}

pub const COLUMNS: [ColumnSpec; 6] = [
    ColumnSpec {
        name: "id",
        sql_type: "INTEGER, primary key",
        description: "row identifier",
    },
    ColumnSpec {
        name: "sensor_id",
        sql_type: "INTEGER",
        description: "sensor identifier",
    },
    ColumnSpec {
        name: "timestamp",
        sql_type: "TIMESTAMPTZ",
        description: "reading timestamp",
    },
    ColumnSpec {
        name: "temperature",
        sql_type: "DOUBLE PRECISION",
        description: "temperature in degrees Celsius",
    },
    ColumnSpec {
        name: "humidity",
        sql_type: "DOUBLE PRECISION",
        description: "humidity percentage",
    },
    ColumnSpec {
        name: "wind_speed",
        sql_type: "DOUBLE PRECISION",
        description: "wind speed in km/h",
    },
];

/// Grounding snapshot taken at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaContext {
    generated_at: DateTime<Utc>,
}

impl SchemaContext {
    /// Snapshot the schema against the system clock.
    pub fn now() -> Self {
        // ---
        Self::at(Utc::now())
    }

    /// Snapshot the schema against an explicit instant.
    pub fn at(generated_at: DateTime<Utc>) -> Self {
        // ---
        Self { generated_at }
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Render the text block embedded in the translation prompt.
    pub fn render(&self) -> String {
        // ---
        let mut lines = vec![
            format!("Database Schema (version {SCHEMA_VERSION}):"),
            format!("Table: {TABLE_NAME}"),
            "Columns:".to_string(),
        ];
        lines.extend(COLUMNS.iter().map(|column| {
            format!(
                "  - {} ({}) -- {}",
                column.name, column.sql_type, column.description
            )
        }));

        lines.push(String::new());
        lines.push("ALLOWED SQL Aggregate Functions:".to_string());
        lines.extend(ALLOWED_AGGREGATES.iter().map(|op| format!("  - {op}")));

        lines.push(String::new());
        lines.push(format!("Current Timezone: {TIMEZONE}"));
        lines.push(format!(
            "Current Date and Time: {}",
            self.generated_at.format(TIMESTAMP_FORMAT)
        ));

        lines.join("\n")
    }
}

impl fmt::Display for SchemaContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
