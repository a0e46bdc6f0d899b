//! tokio-postgres backed administrative session

use super::sql::USER_EXISTS_QUERY;
use super::upsert::{AdminSession, Connector, UserLookup};
use crate::error::{BoxError, ProvisionError};
use crate::precheck::join_host_port;
use crate::secrets::Credential;
use async_trait::async_trait;
use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode};
use postgres_openssl::MakeTlsConnector;
use tokio_postgres::{Client, Config};
use tracing::{debug, warn};

const APPLICATION_NAME: &str = "db-user-provisioner";

/// Assemble the administrative connection config.
///
/// The admin username, host, port and database go through the driver's URL
/// parser; the password is set on the parsed config and never appears in the URL.
pub fn connection_config(
    admin: &Credential,
    host: &str,
    port: u16,
    database: &str,
) -> Result<Config, ProvisionError> {
    let url = format!(
        "postgres://{}@{}/{}",
        admin.username,
        join_host_port(host, port),
        database
    );

    let mut config: Config = url.parse().map_err(ProvisionError::ConfigParse)?;
    config
        .password(admin.password.as_str())
        .application_name(APPLICATION_NAME);
    Ok(config)
}

#[async_trait]
impl AdminSession for Client {
    async fn lookup_user(&self, username: &str) -> Result<UserLookup, BoxError> {
        let row = self.query_opt(USER_EXISTS_QUERY, &[&username]).await?;
        match row {
            Some(row) => Ok(UserLookup::Found(row.try_get(0)?)),
            None => Ok(UserLookup::Absent),
        }
    }

    async fn execute(&self, statement: &str) -> Result<(), BoxError> {
        self.batch_execute(statement).await?;
        Ok(())
    }
}

/// Connects with TLS negotiated per the config's SSL mode (`prefer` by default).
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresConnector {
    tls_verify: bool,
}

impl PostgresConnector {
    pub fn new(tls_verify: bool) -> Self {
        Self { tls_verify }
    }

    fn tls(&self) -> Result<MakeTlsConnector, BoxError> {
        let mut builder = SslConnector::builder(SslMethod::tls())?;
        if !self.tls_verify {
            builder.set_verify(SslVerifyMode::NONE);
        }
        Ok(MakeTlsConnector::new(builder.build()))
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    type Session = Client;

    async fn connect(&self, config: &Config) -> Result<Client, BoxError> {
        let (client, connection) = config.connect(self.tls()?).await?;

        // The connection drives the socket; it ends when the client is dropped.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "Database connection closed with error");
            }
        });

        debug!(tls_verify = self.tls_verify, "Database session opened");
        Ok(client)
    }
}
