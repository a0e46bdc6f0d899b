//! Environment variable parsing helpers
//!
//! Provides ergonomic helpers for reading configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Extension trait for parsing environment variables.
///
/// Provides convenient methods for reading env vars with defaults, blank handling
/// and type parsing.
pub trait ConfigExt {
    /// Get an environment variable with a default value.
    ///
    /// # Example
    /// ```ignore
    /// let region = String::env_or("AWS_REGION", "us-east-1");
    /// ```
    fn env_or(name: &str, default: &str) -> String {
        env::var(name).unwrap_or_else(|_| default.to_string())
    }

    /// Get an environment variable, treating an empty or whitespace-only value as unset.
    fn env_non_empty(name: &str) -> Option<String> {
        env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Get an environment variable as a boolean.
    ///
    /// Accepts `true`, `1`, `yes` and `on` (case-insensitive) as true. Any other
    /// value is false; an unset variable yields `default`.
    fn env_bool(name: &str, default: bool) -> bool {
        env::var(name)
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on"))
            .unwrap_or(default)
    }

    /// Get an environment variable parsed as a specific type.
    ///
    /// Returns `default` if the variable is not set or fails to parse.
    ///
    /// # Example
    /// ```ignore
    /// let timeout: u64 = u64::env_parse("DB_PRECHECK_TIMEOUT_SECS", 3);
    /// ```
    fn env_parse<T: FromStr>(name: &str, default: T) -> T {
        env::var(name)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }
}

// Blanket implementation for all types
impl<T> ConfigExt for T {}

/// Lambda-specific environment helpers.
///
/// Reads the variables the Lambda runtime sets for every function instance.
pub struct LambdaEnv;

impl LambdaEnv {
    /// Check if running inside the Lambda execution environment.
    pub fn is_lambda() -> bool {
        env::var_os("AWS_LAMBDA_FUNCTION_NAME").is_some()
            || env::var_os("LAMBDA_TASK_ROOT").is_some()
    }

    pub fn function_name() -> String {
        String::env_or("AWS_LAMBDA_FUNCTION_NAME", "local")
    }

    pub fn function_version() -> String {
        String::env_or("AWS_LAMBDA_FUNCTION_VERSION", "$LATEST")
    }

    /// Region the function runs in, if the runtime exposed one.
    pub fn region() -> Option<String> {
        String::env_non_empty("AWS_REGION").or_else(|| String::env_non_empty("AWS_DEFAULT_REGION"))
    }
}
