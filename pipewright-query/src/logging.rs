//! Logging setup.
//!
//! Encoding and execution log through `tracing`; nothing is printed unless a
//! subscriber is installed. With the `tracing-subscriber` feature, [`init`]
//! installs one configured from the environment:
//!
//! - `PIPEWRIGHT_DEBUG=true|1|yes` - log at `debug`
//! - `PIPEWRIGHT_LOG_LEVEL=trace|debug|info|warn|error` - explicit level
//! - `PIPEWRIGHT_LOG_FORMAT=json|pretty|compact` - output format (default: json)
//!
//! ```rust,no_run
//! use pipewright_query::logging;
//!
//! // Call once at startup; later calls do nothing.
//! logging::init();
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

const DEBUG_VAR: &str = "PIPEWRIGHT_DEBUG";
const LEVEL_VAR: &str = "PIPEWRIGHT_LOG_LEVEL";
const FORMAT_VAR: &str = "PIPEWRIGHT_LOG_FORMAT";

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    Compact,
}

impl LogFormat {
    /// Parse a format name; unknown names fall back to JSON.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::Json,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        }
    }
}

fn truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn resolve_level(level: Option<&str>, debug: bool) -> &'static str {
    let fallback = if debug { "debug" } else { "warn" };
    match level.map(str::to_lowercase).as_deref() {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("info") => "info",
        Some("warn") => "warn",
        Some("error") => "error",
        _ => fallback,
    }
}

/// Whether `PIPEWRIGHT_DEBUG` asks for debug logging.
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR).map(|v| truthy(&v)).unwrap_or(false)
}

/// Level from `PIPEWRIGHT_LOG_LEVEL`, else `debug` in debug mode, else `warn`.
pub fn log_level() -> &'static str {
    resolve_level(env::var(LEVEL_VAR).ok().as_deref(), is_debug_enabled())
}

/// Format from `PIPEWRIGHT_LOG_FORMAT`.
pub fn log_format() -> LogFormat {
    env::var(FORMAT_VAR)
        .map(|f| LogFormat::parse(&f))
        .unwrap_or_default()
}

/// Install a subscriber configured from the environment.
///
/// Does nothing unless `PIPEWRIGHT_DEBUG` or `PIPEWRIGHT_LOG_LEVEL` is set.
pub fn init() {
    if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
        return;
    }
    init_with(log_level(), log_format());
}

/// Install a subscriber with an explicit level and format, ignoring the
/// environment. Only the first successful initialization takes effect.
pub fn init_with(level: &str, format: LogFormat) {
    let level = resolve_level(Some(level), false);
    INIT.call_once(|| install(level, format));
}

#[cfg(feature = "tracing-subscriber")]
fn install(level: &'static str, format: LogFormat) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_new(format!(
        "pipewright={level},pipewright_query={level},pipewright_mongodb={level}"
    ))
    .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    };

    if installed.is_ok() {
        tracing::info!(
            level = level,
            format = format.as_str(),
            "Pipewright logging initialized"
        );
    }
}

#[cfg(not(feature = "tracing-subscriber"))]
fn install(_level: &'static str, _format: LogFormat) {}

/// Debug log that is skipped unless `PIPEWRIGHT_DEBUG` is set.
#[macro_export]
macro_rules! pipewright_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_resolution() {
        assert_eq!(resolve_level(None, false), "warn");
        assert_eq!(resolve_level(None, true), "debug");
        assert_eq!(resolve_level(Some("TRACE"), false), "trace");
        assert_eq!(resolve_level(Some("verbose"), false), "warn");
        assert_eq!(resolve_level(Some("verbose"), true), "debug");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(LogFormat::parse("Pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("compact"), LogFormat::Compact);
        assert_eq!(LogFormat::parse("xml"), LogFormat::Json);
        assert_eq!(LogFormat::default().as_str(), "json");
    }

    #[test]
    fn test_truthy_values() {
        for v in ["true", "1", "YES"] {
            assert!(truthy(v));
        }
        assert!(!truthy("0"));
        assert!(!truthy(""));
    }

    #[test]
    fn test_repeated_init_is_noop() {
        init_with("debug", LogFormat::Compact);
        init_with("trace", LogFormat::Json);
    }
}
