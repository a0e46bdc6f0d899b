//! Structured logging initialization
//!
//! Inside Lambda the log stream is CloudWatch, which stamps ingestion time, so
//! records are emitted as JSON without timestamps. Locally a plain human format
//! is used instead.

use crate::config::{ConfigExt, LambdaEnv};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Guard that keeps the tracing subscriber active.
/// Hold it for the lifetime of the process.
pub struct LogGuard;

/// Initialize structured logging for a component.
///
/// Returns a guard that should be held for the lifetime of the program.
/// `LOG_JSON` overrides the format auto-detection.
///
/// # Example
/// ```ignore
/// let _guard = init_logging("db-user-provisioner");
/// info!("Starting up...");
/// ```
pub fn init_logging(component: &str) -> LogGuard {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let json = bool::env_bool("LOG_JSON", LambdaEnv::is_lambda());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(false)
                    .without_time(),
            )
            .init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }

    tracing::debug!(component, json, "logging initialised");
    LogGuard
}
