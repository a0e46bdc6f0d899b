//! Error taxonomy for a provisioning invocation
//!
//! Each variant names the step that failed and carries the underlying cause.
//! The first failing step ends the invocation; nothing is retried.

use crate::precheck::ProbeError;
use crate::provision::UpsertVerb;
use lambda_runtime::Error as LambdaError;
use std::fmt;
use thiserror::Error;
use tracing::error;

/// Boxed cause returned across the driver and SDK seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("received nil event")]
    MissingEvent,

    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("failed to connect to db host: {0}")]
    DatabaseUnreachable(#[source] ProbeError),

    #[error("secrets manager endpoint not set")]
    MissingSecretsEndpoint,

    #[error("failed to connect to secrets manager endpoint `{endpoint}`\ngot errors: {errors}")]
    SecretsEndpointUnreachable {
        endpoint: String,
        errors: ProbeErrors,
    },

    #[error("failed to get {kind} secret: {source}")]
    SecretFetch {
        kind: SecretKind,
        #[source]
        source: BoxError,
    },

    #[error("{kind} secret has no string value")]
    SecretEmpty { kind: SecretKind },

    #[error("failed to unmarshal admin user json: {0}")]
    SecretDecode(#[source] serde_json::Error),

    #[error("admin user secret is missing a {0}")]
    SecretIncomplete(&'static str),

    #[error("failed to parse pg config: {0}")]
    ConfigParse(#[source] tokio_postgres::Error),

    #[error("failed to connect to database: {0}")]
    Connect(#[source] BoxError),

    #[error("failed to check for existing user: {0}")]
    UserLookup(#[source] BoxError),

    #[error("failed to {verb} db user: {source}")]
    Execute {
        verb: UpsertVerb,
        #[source]
        source: BoxError,
    },
}

impl ProvisionError {
    /// Short phase name used in logs and failure progress events.
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingEvent | Self::InvalidEvent(_) => "input",
            Self::DatabaseUnreachable(_) | Self::SecretsEndpointUnreachable { .. } => {
                "connectivity"
            }
            Self::MissingSecretsEndpoint => "configuration",
            Self::SecretFetch { .. }
            | Self::SecretEmpty { .. }
            | Self::SecretDecode(_)
            | Self::SecretIncomplete(_) => "secret",
            Self::ConfigParse(_) => "config_parse",
            Self::Connect(_) => "connection",
            Self::UserLookup(_) => "query",
            Self::Execute { .. } => "execution",
        }
    }
}

/// Which of the two secrets an invocation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    Admin,
    Password,
}

impl SecretKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Password => "password",
        }
    }
}

impl fmt::Display for SecretKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every failed probe of the secrets endpoint, in the order they were tried.
#[derive(Debug)]
pub struct ProbeErrors(pub Vec<ProbeError>);

impl fmt::Display for ProbeErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", err)?;
        }
        f.write_str("]")
    }
}

/// Convert a provisioning error into the Lambda runtime error type.
pub fn lambda_error(err: ProvisionError) -> LambdaError {
    let category = err.category();
    let message = err.to_string();
    error!(category = %category, error = ?err, message = %message, "provisioning error forwarded to Lambda runtime");
    LambdaError::from(message)
}
