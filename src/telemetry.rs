//! Tracing subscriber setup shared by the server and the seed binary.

use std::env;

use is_terminal::IsTerminal;

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `AXUM_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level from `RUST_LOG`, else `AXUM_LOG_LEVEL` (default `debug`)
///
/// Call once at startup, before any logging macro runs.
pub fn init_tracing() {
    // ---
    let span_events = match env::var("AXUM_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter(
            env::var("RUST_LOG").ok().as_deref(),
            env::var("AXUM_LOG_LEVEL").ok().as_deref(),
        ))
        .with_ansi(use_color)
        .compact()
        .init();
}

/// Pick the filter: `RUST_LOG` wins, otherwise a level with noisy crates quietened.
fn env_filter(rust_log: Option<&str>, level: Option<&str>) -> EnvFilter {
    // ---
    if let Some(directives) = rust_log {
        return EnvFilter::new(directives);
    }
    EnvFilter::new(default_directives(level))
}

fn default_directives(level: Option<&str>) -> String {
    // ---
    let level = match level {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("info") => "info",
        Some("warn") => "warn",
        Some("error") => "error",
        _ => "debug",
    };
    format!("{level},sqlx::query=warn,hyper=info,reqwest=info")
}
