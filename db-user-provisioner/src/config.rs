//! Provisioner settings from environment variables

use crate::precheck::{DEFAULT_PROBE_TIMEOUT, SECRETS_PROBE_PORTS};
use common::ConfigExt;
use std::env;
use std::time::Duration;

/// Environment variable naming the Secrets Manager endpoint.
pub const SECRETS_ENDPOINT_ENV: &str = "AWS_ENDPOINT_URL_SECRETS_MANAGER";

/// Settings for one invocation.
///
/// Read from the environment when an invocation starts and handed to the
/// provisioner explicitly; nothing downstream reads the environment itself.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Secrets Manager endpoint, as a URL or bare host. A missing value is
    /// only reported once the database host precheck has passed.
    pub secrets_endpoint: Option<String>,
    pub probe_timeout: Duration,
    pub secrets_probe_ports: Vec<u16>,
    /// Verify the server certificate chain when the connection negotiates TLS.
    pub tls_verify: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            secrets_endpoint: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            secrets_probe_ports: SECRETS_PROBE_PORTS.to_vec(),
            tls_verify: false,
        }
    }
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Self {
        let probe_timeout = Duration::from_secs(u64::env_parse(
            "DB_PRECHECK_TIMEOUT_SECS",
            DEFAULT_PROBE_TIMEOUT.as_secs(),
        ));

        Self {
            secrets_endpoint: String::env_non_empty(SECRETS_ENDPOINT_ENV),
            probe_timeout,
            secrets_probe_ports: env::var("SECRETS_PROBE_PORTS")
                .ok()
                .and_then(|raw| parse_ports(&raw))
                .unwrap_or_else(|| SECRETS_PROBE_PORTS.to_vec()),
            tls_verify: bool::env_bool("DB_TLS_VERIFY", false),
        }
    }
}

/// Parse a comma-separated port list. `None` if any entry is invalid or the list is empty.
fn parse_ports(raw: &str) -> Option<Vec<u16>> {
    let ports = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u16>().ok().filter(|port| *port != 0))
        .collect::<Option<Vec<_>>>()?;

    if ports.is_empty() {
        None
    } else {
        Some(ports)
    }
}
