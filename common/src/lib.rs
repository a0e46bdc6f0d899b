//! Shared utilities for the db-user-provisioner workspace
//!
//! - Structured logging initialization
//! - Environment variable parsing helpers
//! - Progress events for the operator-visible log stream

pub mod config;
pub mod logging;
pub mod progress;

pub use config::{ConfigExt, LambdaEnv};
pub use logging::init_logging;
pub use progress::{Progress, ProgressEvent};
