//! Invocation event

use crate::error::ProvisionError;
use serde::{Deserialize, Serialize};

/// Event the function is invoked with.
///
/// Every field is required; a missing field fails deserialization before the
/// handler runs, and empty values are rejected by [`ProvisionEvent::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionEvent {
    pub admin_secret_arn: String,
    pub db_host: String,
    pub db_name: String,
    pub port: u16,
    pub username: String,
    pub pw_secret_arn: String,
}

impl ProvisionEvent {
    pub fn validate(&self) -> Result<(), ProvisionError> {
        let fields = [
            ("admin_secret_arn", &self.admin_secret_arn),
            ("db_host", &self.db_host),
            ("db_name", &self.db_name),
            ("username", &self.username),
            ("pw_secret_arn", &self.pw_secret_arn),
        ];

        if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ProvisionError::InvalidEvent(format!("{} must not be empty", name)));
        }

        if self.port == 0 {
            return Err(ProvisionError::InvalidEvent("port must not be 0".to_string()));
        }

        Ok(())
    }
}
