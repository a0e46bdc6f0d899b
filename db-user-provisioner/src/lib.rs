//! Provision or rotate a PostgreSQL login from a Lambda invocation
//!
//! An invocation carries the database location, the target username and two
//! Secrets Manager identifiers. The function prechecks TCP reachability,
//! resolves the admin credential and the target password, connects as the
//! admin and creates the target user or alters its password.

pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod precheck;
pub mod provision;
pub mod secrets;

pub use common::{ConfigExt, LambdaEnv, Progress, ProgressEvent};
pub use config::Settings;
pub use error::{lambda_error, BoxError, ProvisionError};
pub use event::ProvisionEvent;
pub use handler::Provisioner;
pub use secrets::{Credential, SecretStore, SecretsManager};
