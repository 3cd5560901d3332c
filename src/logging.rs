//! Logging setup for Tablewright.
//!
//! The compiler emits `tracing` events (table compilation spans, index
//! migration steps, signature cache hits). Nothing is printed unless a
//! subscriber is installed, either by the application or by [`init`].
//!
//! # Environment Variables
//!
//! - `TABLEWRIGHT_DEBUG=true|1|yes` - Enable debug logging
//! - `TABLEWRIGHT_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `TABLEWRIGHT_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! The `[debug]` section of `tablewright.toml` supplies the same settings;
//! environment variables win over it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use tablewright::logging;
//!
//! // Call once at startup
//! logging::init();
//! ```
//!
//! Installing the subscriber requires the `tracing-subscriber` feature.

use std::env;
use std::sync::Once;

use tablewright_schema::config::DebugConfig;

static INIT: Once = Once::new();

const DEBUG_VAR: &str = "TABLEWRIGHT_DEBUG";
const LEVEL_VAR: &str = "TABLEWRIGHT_LOG_LEVEL";
const FORMAT_VAR: &str = "TABLEWRIGHT_LOG_FORMAT";

/// Check if debug logging is enabled via `TABLEWRIGHT_DEBUG`.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/// Get the configured log level.
///
/// `TABLEWRIGHT_LOG_LEVEL` wins; otherwise "debug" when `TABLEWRIGHT_DEBUG`
/// is enabled, otherwise "warn".
pub fn get_log_level() -> &'static str {
    env::var(LEVEL_VAR)
        .ok()
        .and_then(|level| normalize_level(&level))
        .unwrap_or_else(default_level)
}

/// Get the configured log format from `TABLEWRIGHT_LOG_FORMAT`.
pub fn get_log_format() -> &'static str {
    env::var(FORMAT_VAR)
        .map(|f| normalize_format(&f))
        .unwrap_or("json")
}

/// Initialize logging from the environment.
///
/// Subsequent calls (and calls to [`init_with_config`]) are no-ops.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
            return;
        }
        install(get_log_level(), get_log_format());
    });
}

/// Initialize logging from the `[debug]` section of a config file.
///
/// Environment variables still take precedence over the file.
pub fn init_with_config(config: &DebugConfig) {
    INIT.call_once(|| {
        let level = env::var(LEVEL_VAR)
            .ok()
            .and_then(|level| normalize_level(&level))
            .or_else(|| config.log_level.as_deref().and_then(normalize_level));
        let Some(level) = level.or_else(|| is_debug_enabled().then_some("debug")) else {
            return;
        };

        let format = match env::var(FORMAT_VAR) {
            Ok(format) => normalize_format(&format),
            Err(_) => config.log_format.as_deref().map_or("json", normalize_format),
        };
        install(level, format);
    });
}

/// Initialize logging at a specific level, ignoring the environment.
pub fn init_with_level(level: &str) {
    let level = normalize_level(level).unwrap_or_else(default_level);
    INIT.call_once(|| install(level, get_log_format()));
}

fn default_level() -> &'static str {
    if is_debug_enabled() { "debug" } else { "warn" }
}

fn normalize_level(level: &str) -> Option<&'static str> {
    match level.to_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

fn normalize_format(format: &str) -> &'static str {
    match format.to_lowercase().as_str() {
        "pretty" => "pretty",
        "compact" => "compact",
        _ => "json",
    }
}

#[cfg(feature = "tracing-subscriber")]
fn install(level: &'static str, format: &'static str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_new(format!(
        "tablewright={level},tablewright_schema={level},tablewright_migrate={level},tablewright_build={level}"
    ))
    .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        "compact" => registry.with(fmt::layer().compact()).try_init(),
        "pretty" => registry.with(fmt::layer().pretty()).try_init(),
        _ => registry.with(fmt::layer().json()).try_init(),
    };

    if installed.is_ok() {
        tracing::info!(level, format, "Tablewright logging initialized");
    }
}

#[cfg(not(feature = "tracing-subscriber"))]
fn install(level: &'static str, format: &'static str) {
    // Without the subscriber, events go to whatever the application installed.
    let _ = (level, format);
}
