//! Lambda entry point
//!
//! Loads the AWS SDK configuration once per cold start, then serves each
//! invocation with settings read from the environment at that moment.
//! Exactly one administrative connection is opened per invocation and dropped
//! when the invocation returns.

use anyhow::{anyhow, Result};
use aws_config::BehaviorVersion;
use common::{init_logging, LambdaEnv, Progress};
use db_user_provisioner::provision::PostgresConnector;
use db_user_provisioner::{lambda_error, ProvisionEvent, Provisioner, SecretsManager, Settings};
use lambda_runtime::{run, service_fn, LambdaEvent};
use tracing::info;

const COMPONENT: &str = "db-user-provisioner";

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = init_logging(COMPONENT);

    let region = LambdaEnv::region().unwrap_or_else(|| "unset".to_string());
    info!(
        function = %LambdaEnv::function_name(),
        version = %LambdaEnv::function_version(),
        %region,
        "Initialising Lambda runtime"
    );

    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let secrets = SecretsManager::new(sdk_config);

    run(service_fn(move |event: LambdaEvent<Option<ProvisionEvent>>| {
        let secrets = secrets.clone();
        async move {
            let (payload, context) = event.into_parts();
            info!(request_id = %context.request_id, "Invocation started");

            let settings = Settings::from_env();
            let connector = PostgresConnector::new(settings.tls_verify);
            let provisioner =
                Provisioner::new(settings, secrets, connector, Progress::new(COMPONENT));

            provisioner
                .handle(payload)
                .await
                .map(|_| ())
                .map_err(lambda_error)
        }
    }))
    .await
    .map_err(|e| anyhow!("Lambda runtime exited: {}", e))
}
