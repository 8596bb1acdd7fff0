//! # atlas-telemetry
//!
//! Logging setup for ATLAS binaries.
//!
//! [`init_telemetry`] installs a global `tracing` subscriber that writes human-readable or JSON
//! lines to stderr (stdout is left for the report) and filters with `RUST_LOG`. It also
//! installs a [`SpanTimings`] layer so callers can print how long each pipeline stage took.

mod timings;

pub use timings::{SpanTimingLayer, SpanTimings, StageTiming};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Install the global subscriber with the [`DEFAULT_FILTER`].
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_telemetry(format: LogFormat) -> Result<SpanTimings, TryInitError> {
    init_with_filter(format, DEFAULT_FILTER)
}

/// Install the global subscriber, using `RUST_LOG` if set and `default_filter` otherwise.
///
/// Returns the handle of the installed [`SpanTimings`] layer.
pub fn init_with_filter(
    format: LogFormat,
    default_filter: &str,
) -> Result<SpanTimings, TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let timings = SpanTimings::default();

    let json = (format == LogFormat::Json)
        .then(|| fmt::layer().json().with_target(true).with_writer(std::io::stderr));
    let pretty = (format == LogFormat::Pretty)
        .then(|| fmt::layer().with_target(false).with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .with(timings.layer())
        .try_init()?;

    Ok(timings)
}
