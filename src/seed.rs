//! Sample data generation for local development and demos.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::ValidMetric;

// ---

/// Shape of a generated data set.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedPlan {
    pub sensor_ids: Vec<i32>,
    /// Readings are generated from `end - span` through `end`, inclusive.
    pub span: Duration,
    pub interval: Duration,
}

impl Default for SeedPlan {
    fn default() -> Self {
        // ---
        SeedPlan {
            sensor_ids: vec![1, 2, 3, 4, 5],
            span: Duration::days(90),
            interval: Duration::minutes(30),
        }
    }
}

/// Generate one reading per sensor per interval, ending at `end`.
///
/// Values are uniform in fixed ranges and rounded to two decimals:
/// temperature 15–30 °C, humidity 40–80 %, wind speed 0–15 km/h.
pub fn generate<R: Rng>(plan: &SeedPlan, end: DateTime<Utc>, rng: &mut R) -> Vec<ValidMetric> {
    // ---
    let mut readings = Vec::new();
    if plan.interval <= Duration::zero() {
        return readings;
    }

    let mut current = end - plan.span;
    while current <= end {
        for &sensor_id in &plan.sensor_ids {
            readings.push(ValidMetric {
                sensor_id,
                timestamp: current,
                temperature: Some(round2(rng.random_range(15.0..=30.0))),
                humidity: Some(round2(rng.random_range(40.0..=80.0))),
                wind_speed: Some(round2(rng.random_range(0.0..=15.0))),
            });
        }
        current += plan.interval;
    }

    readings
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
