//! Progress events for the operator-visible log stream
//!
//! Every step of an invocation that completes emits one event, so a failed
//! invocation can be localised by the last event that made it into the logs.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// All progress events emitted while provisioning a database user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEvent {
    /// Invocation event accepted
    EventReceived {
        db_host: String,
        db_name: String,
        port: u16,
        username: String,
    },

    /// TCP precheck against the database host succeeded
    DatabaseHostReachable { host: String, port: u16 },

    /// Secrets Manager endpoint read from configuration
    SecretsEndpointResolved { endpoint: String },

    /// At least one candidate port of the Secrets Manager endpoint accepted a connection
    SecretsEndpointReachable { endpoint: String, ports: Vec<u16> },

    /// A secret value was retrieved
    SecretFetched { kind: String },

    /// Admin credential JSON decoded
    SecretDecoded { kind: String },

    /// Connection configuration assembled
    ConnectionConfigured {
        host: String,
        port: u16,
        database: String,
    },

    /// Administrative connection established
    DatabaseConnected { host: String, database: String },

    /// Existence check against the user catalog finished
    UserChecked { username: String, exists: bool },

    /// CREATE or ALTER statement executed
    UserUpserted { username: String, action: String },

    /// Invocation finished successfully
    ProvisionCompleted {
        username: String,
        action: String,
        duration_ms: u64,
    },

    /// Invocation aborted
    ProvisionFailed { phase: String, error: String },
}

impl ProgressEvent {
    /// Stable event code used as a structured log field.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::EventReceived { .. } => "EVENT_RECEIVED",
            Self::DatabaseHostReachable { .. } => "DB_HOST_REACHABLE",
            Self::SecretsEndpointResolved { .. } => "SECRETS_ENDPOINT_RESOLVED",
            Self::SecretsEndpointReachable { .. } => "SECRETS_ENDPOINT_REACHABLE",
            Self::SecretFetched { .. } => "SECRET_FETCHED",
            Self::SecretDecoded { .. } => "SECRET_DECODED",
            Self::ConnectionConfigured { .. } => "CONNECTION_CONFIGURED",
            Self::DatabaseConnected { .. } => "DB_CONNECTED",
            Self::UserChecked { .. } => "USER_CHECKED",
            Self::UserUpserted { .. } => "USER_UPSERTED",
            Self::ProvisionCompleted { .. } => "PROVISION_COMPLETED",
            Self::ProvisionFailed { .. } => "PROVISION_FAILED",
        }
    }

    /// Convert event to a human-readable message.
    pub fn message(&self) -> String {
        match self {
            Self::EventReceived {
                db_host,
                db_name,
                port,
                username,
            } => {
                format!(
                    "received event for user `{}` on {}:{}/{}",
                    username, db_host, port, db_name
                )
            }
            Self::DatabaseHostReachable { host, port } => {
                format!("db host {} reachable on port {}", host, port)
            }
            Self::SecretsEndpointResolved { endpoint } => {
                format!("got secrets manager endpoint `{}`", endpoint)
            }
            Self::SecretsEndpointReachable { endpoint, ports } => {
                format!(
                    "connected to secrets manager endpoint `{}` on ports {:?}",
                    endpoint, ports
                )
            }
            Self::SecretFetched { kind } => format!("got {} db user secret", kind),
            Self::SecretDecoded { kind } => format!("unmarshalled {} db user secret json", kind),
            Self::ConnectionConfigured {
                host,
                port,
                database,
            } => {
                format!("got db connection config for {}:{}/{}", host, port, database)
            }
            Self::DatabaseConnected { host, database } => {
                format!("connected to db {} on {}", database, host)
            }
            Self::UserChecked { username, exists } => {
                if *exists {
                    format!(
                        "database user `{}` already exists. Updating password...",
                        username
                    )
                } else {
                    format!("checked for existing db user `{}`: not found", username)
                }
            }
            Self::UserUpserted { username, action } => {
                format!("{} db user `{}`", action, username)
            }
            Self::ProvisionCompleted {
                username,
                action,
                duration_ms,
            } => {
                format!(
                    "provisioning of `{}` completed ({}) in {}ms",
                    username, action, duration_ms
                )
            }
            Self::ProvisionFailed { phase, error } => {
                format!("provisioning failed during {}: {}", phase, error)
            }
        }
    }
}

/// Reports progress events to the log stream of one component.
#[derive(Debug, Clone)]
pub struct Progress {
    component: String,
}

impl Progress {
    pub fn new(component: &str) -> Self {
        Self {
            component: component.to_string(),
        }
    }

    /// Log an event with its code and serialized payload attached as fields.
    pub fn report(&self, event: ProgressEvent) {
        let event_type = event.event_type();
        let message = event.message();
        let detail = serde_json::to_string(&event).unwrap_or_default();

        match event {
            ProgressEvent::ProvisionFailed { .. } => {
                error!(component = %self.component, event = %event_type, %detail, "{}", message);
            }
            _ => {
                info!(component = %self.component, event = %event_type, %detail, "{}", message);
            }
        }
    }
}
