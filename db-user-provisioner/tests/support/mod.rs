use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use db_user_provisioner::provision::{AdminSession, Connector, UserLookup};
use db_user_provisioner::{BoxError, ProvisionEvent, SecretStore, Settings};
use tokio::net::TcpListener;

pub const ADMIN_ARN: &str = "arn:aws:secretsmanager:eu-west-1:123456789012:secret:rds-admin";
pub const PW_ARN: &str = "arn:aws:secretsmanager:eu-west-1:123456789012:secret:svc-app-pw";
pub const ADMIN_SECRET: &str = r#"{"username":"postgres","password":"admin-pw"}"#;

/// Secret store double that records every lookup.
#[derive(Clone, Default)]
pub struct FakeSecrets {
    values: Arc<Mutex<HashMap<String, Result<Option<String>, String>>>>,
    pub calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeSecrets {
    pub fn with(self, secret_id: &str, value: &str) -> Self {
        self.values
            .lock()
            .unwrap()
            .insert(secret_id.to_string(), Ok(Some(value.to_string())));
        self
    }

    pub fn with_binary(self, secret_id: &str) -> Self {
        self.values
            .lock()
            .unwrap()
            .insert(secret_id.to_string(), Ok(None));
        self
    }

    pub fn with_failure(self, secret_id: &str, error: &str) -> Self {
        self.values
            .lock()
            .unwrap()
            .insert(secret_id.to_string(), Err(error.to_string()));
        self
    }

    pub fn standard(password: &str) -> Self {
        Self::default()
            .with(ADMIN_ARN, ADMIN_SECRET)
            .with(PW_ARN, password)
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SecretStore for FakeSecrets {
    async fn secret_string(
        &self,
        endpoint: &str,
        secret_id: &str,
    ) -> Result<Option<String>, BoxError> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), secret_id.to_string()));
        match self.values.lock().unwrap().get(secret_id) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(e)) => Err(e.clone().into()),
            None => Err(format!(
                "ResourceNotFoundException: Secrets Manager can't find the specified secret {}",
                secret_id
            )
            .into()),
        }
    }
}

/// Server-side state shared by every session a [`FakeConnector`] opens.
#[derive(Clone, Default)]
pub struct FakeDatabase {
    pub users: Arc<Mutex<HashSet<String>>>,
    pub lookups: Arc<Mutex<Vec<String>>>,
    pub statements: Arc<Mutex<Vec<String>>>,
}

impl FakeDatabase {
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

pub struct FakeSession {
    db: FakeDatabase,
}

#[async_trait]
impl AdminSession for FakeSession {
    async fn lookup_user(&self, username: &str) -> Result<UserLookup, BoxError> {
        self.db.lookups.lock().unwrap().push(username.to_string());
        if self.db.users.lock().unwrap().contains(username) {
            Ok(UserLookup::Found(username.to_string()))
        } else {
            Ok(UserLookup::Absent)
        }
    }

    async fn execute(&self, statement: &str) -> Result<(), BoxError> {
        self.db
            .statements
            .lock()
            .unwrap()
            .push(statement.to_string());
        if let Some(rest) = statement.strip_prefix("CREATE USER \"") {
            let name = rest.split('"').next().unwrap_or_default().to_string();
            if !self.db.users.lock().unwrap().insert(name.clone()) {
                return Err(format!("role \"{}\" already exists", name).into());
            }
        }
        Ok(())
    }
}

/// Connector double; records each connection config it was asked to open.
#[derive(Clone, Default)]
pub struct FakeConnector {
    pub db: FakeDatabase,
    pub configs: Arc<Mutex<Vec<tokio_postgres::Config>>>,
    pub refuse: bool,
}

impl FakeConnector {
    pub fn connect_count(&self) -> usize {
        self.configs.lock().unwrap().len()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Session = FakeSession;

    async fn connect(&self, config: &tokio_postgres::Config) -> Result<FakeSession, BoxError> {
        self.configs.lock().unwrap().push(config.clone());
        if self.refuse {
            return Err("password authentication failed for user \"postgres\"".into());
        }
        Ok(FakeSession {
            db: self.db.clone(),
        })
    }
}

/// A loopback listener standing in for a reachable host.
pub async fn open_port() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

/// A loopback port nothing listens on.
pub async fn closed_port() -> u16 {
    let (listener, port) = open_port().await;
    drop(listener);
    port
}

pub fn settings(endpoint: Option<&str>, probe_ports: Vec<u16>) -> Settings {
    Settings {
        secrets_endpoint: endpoint.map(str::to_string),
        probe_timeout: Duration::from_secs(3),
        secrets_probe_ports: probe_ports,
        tls_verify: false,
    }
}

pub fn event(port: u16, username: &str) -> ProvisionEvent {
    ProvisionEvent {
        admin_secret_arn: ADMIN_ARN.to_string(),
        db_host: "127.0.0.1".to_string(),
        db_name: "app".to_string(),
        port,
        username: username.to_string(),
        pw_secret_arn: PW_ARN.to_string(),
    }
}
