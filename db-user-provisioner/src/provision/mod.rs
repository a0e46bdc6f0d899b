//! Database user provisioning
//!
//! - Statement text for the user catalog check and CREATE/ALTER USER
//! - The idempotent upsert routine over an administrative session
//! - The tokio-postgres backed session and connector

mod postgres;
mod sql;
mod upsert;

pub use postgres::{connection_config, PostgresConnector};
pub use sql::{quote_identifier, quote_literal, upsert_statement, UpsertVerb, USER_EXISTS_QUERY};
pub use upsert::{upsert_user, AdminSession, Connector, UserLookup};
