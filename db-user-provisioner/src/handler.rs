//! Invocation orchestration
//!
//! Order of operations, each step only after the previous one succeeded:
//! 1. Validate the event
//! 2. TCP precheck of the database host
//! 3. Resolve and TCP precheck the Secrets Manager endpoint
//! 4. Fetch and decode the admin secret, then fetch the target password
//! 5. Open the administrative connection
//! 6. Upsert the target user

use crate::config::Settings;
use crate::error::{ProbeErrors, ProvisionError, SecretKind};
use crate::event::ProvisionEvent;
use crate::precheck::{check_any_port, check_host_port, endpoint_host};
use crate::provision::{connection_config, upsert_user, Connector, UpsertVerb};
use crate::secrets::{Credential, SecretStore};
use common::{Progress, ProgressEvent};
use std::time::Instant;
use tracing::{info, instrument};

/// Runs one provisioning invocation against a secret store and a connector.
pub struct Provisioner<S, C> {
    settings: Settings,
    secrets: S,
    connector: C,
    progress: Progress,
}

impl<S, C> Provisioner<S, C>
where
    S: SecretStore,
    C: Connector,
{
    pub fn new(settings: Settings, secrets: S, connector: C, progress: Progress) -> Self {
        Self {
            settings,
            secrets,
            connector,
            progress,
        }
    }

    /// Handle one invocation, reporting a failure event if any step fails.
    pub async fn handle(
        &self,
        event: Option<ProvisionEvent>,
    ) -> Result<UpsertVerb, ProvisionError> {
        let start = Instant::now();

        match self.provision(event).await {
            Ok((username, verb)) => {
                self.progress.report(ProgressEvent::ProvisionCompleted {
                    username,
                    action: verb.past_tense().to_string(),
                    duration_ms: start.elapsed().as_millis() as u64,
                });
                Ok(verb)
            }
            Err(e) => {
                self.progress.report(ProgressEvent::ProvisionFailed {
                    phase: e.category().to_string(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    #[instrument(skip_all)]
    async fn provision(
        &self,
        event: Option<ProvisionEvent>,
    ) -> Result<(String, UpsertVerb), ProvisionError> {
        let event = event.ok_or(ProvisionError::MissingEvent)?;
        event.validate()?;
        self.progress.report(ProgressEvent::EventReceived {
            db_host: event.db_host.clone(),
            db_name: event.db_name.clone(),
            port: event.port,
            username: event.username.clone(),
        });

        check_host_port(&event.db_host, event.port, self.settings.probe_timeout)
            .await
            .map_err(ProvisionError::DatabaseUnreachable)?;
        self.progress.report(ProgressEvent::DatabaseHostReachable {
            host: event.db_host.clone(),
            port: event.port,
        });

        let endpoint = self.reach_secrets_endpoint().await?;

        let admin = self.admin_credential(endpoint, &event.admin_secret_arn).await?;
        let password = self
            .fetch_secret(endpoint, &event.pw_secret_arn, SecretKind::Password)
            .await?;
        let target = Credential::new(event.username.as_str(), password);

        let config = connection_config(&admin, &event.db_host, event.port, &event.db_name)?;
        self.progress.report(ProgressEvent::ConnectionConfigured {
            host: event.db_host.clone(),
            port: event.port,
            database: event.db_name.clone(),
        });

        let session = self
            .connector
            .connect(&config)
            .await
            .map_err(ProvisionError::Connect)?;
        self.progress.report(ProgressEvent::DatabaseConnected {
            host: event.db_host.clone(),
            database: event.db_name.clone(),
        });

        let verb = upsert_user(&session, &target, &self.progress).await?;
        Ok((event.username, verb))
    }

    /// Resolve the configured endpoint and require at least one candidate port to answer.
    async fn reach_secrets_endpoint(&self) -> Result<&str, ProvisionError> {
        let endpoint = self
            .settings
            .secrets_endpoint
            .as_deref()
            .ok_or(ProvisionError::MissingSecretsEndpoint)?;
        self.progress.report(ProgressEvent::SecretsEndpointResolved {
            endpoint: endpoint.to_string(),
        });

        let host = endpoint_host(endpoint);
        let ports = check_any_port(
            host,
            &self.settings.secrets_probe_ports,
            self.settings.probe_timeout,
        )
        .await
        .map_err(|errors| ProvisionError::SecretsEndpointUnreachable {
            endpoint: endpoint.to_string(),
            errors: ProbeErrors(errors),
        })?;

        self.progress.report(ProgressEvent::SecretsEndpointReachable {
            endpoint: endpoint.to_string(),
            ports,
        });
        Ok(endpoint)
    }

    async fn admin_credential(
        &self,
        endpoint: &str,
        secret_id: &str,
    ) -> Result<Credential, ProvisionError> {
        let raw = self.fetch_secret(endpoint, secret_id, SecretKind::Admin).await?;
        let admin = Credential::from_secret_json(&raw)?;
        self.progress.report(ProgressEvent::SecretDecoded {
            kind: SecretKind::Admin.to_string(),
        });
        info!(admin_user = %admin.username, "Resolved admin credential");
        Ok(admin)
    }

    async fn fetch_secret(
        &self,
        endpoint: &str,
        secret_id: &str,
        kind: SecretKind,
    ) -> Result<String, ProvisionError> {
        let value = self
            .secrets
            .secret_string(endpoint, secret_id)
            .await
            .map_err(|source| ProvisionError::SecretFetch { kind, source })?
            .filter(|v| !v.is_empty())
            .ok_or(ProvisionError::SecretEmpty { kind })?;

        self.progress.report(ProgressEvent::SecretFetched {
            kind: kind.to_string(),
        });
        Ok(value)
    }
}
