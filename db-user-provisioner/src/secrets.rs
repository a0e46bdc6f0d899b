//! Credential resolution from AWS Secrets Manager

use crate::error::{BoxError, ProvisionError};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use serde::Deserialize;
use std::fmt;
use tracing::debug;

/// A database login. The password is kept out of `Debug` output.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Decode an admin secret payload of the form `{"username": "...", "password": "..."}`.
    pub fn from_secret_json(payload: &str) -> Result<Self, ProvisionError> {
        let credential: Credential =
            serde_json::from_str(payload).map_err(ProvisionError::SecretDecode)?;

        if credential.username.is_empty() {
            return Err(ProvisionError::SecretIncomplete("username"));
        }
        if credential.password.is_empty() {
            return Err(ProvisionError::SecretIncomplete("password"));
        }
        Ok(credential)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Source of secret strings.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the string value of `secret_id` through the store at `endpoint`.
    ///
    /// `Ok(None)` means the secret exists but has no string value.
    async fn secret_string(
        &self,
        endpoint: &str,
        secret_id: &str,
    ) -> Result<Option<String>, BoxError>;
}

/// Secrets Manager client factory bound to the shared SDK configuration.
///
/// The SDK configuration is loaded once per cold start; a client is built per
/// call so the endpoint always comes from the current invocation's settings.
#[derive(Clone)]
pub struct SecretsManager {
    sdk_config: SdkConfig,
}

impl SecretsManager {
    pub fn new(sdk_config: SdkConfig) -> Self {
        Self { sdk_config }
    }

    fn client(&self, endpoint: &str) -> aws_sdk_secretsmanager::Client {
        let config = aws_sdk_secretsmanager::config::Builder::from(&self.sdk_config)
            .endpoint_url(endpoint_url(endpoint))
            .build();
        aws_sdk_secretsmanager::Client::from_conf(config)
    }
}

#[async_trait]
impl SecretStore for SecretsManager {
    async fn secret_string(
        &self,
        endpoint: &str,
        secret_id: &str,
    ) -> Result<Option<String>, BoxError> {
        debug!(%endpoint, %secret_id, "Fetching secret value");

        let output = self
            .client(endpoint)
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| BoxError::from(DisplayErrorContext(&e).to_string()))?;

        Ok(output.secret_string().map(str::to_string))
    }
}

/// The SDK wants a URL; bare hosts are assumed to speak HTTPS.
pub fn endpoint_url(endpoint: &str) -> String {
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    }
}
