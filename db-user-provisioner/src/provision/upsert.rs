//! Idempotent create-or-alter of a database user

use super::sql::{upsert_statement, UpsertVerb};
use crate::error::{BoxError, ProvisionError};
use crate::secrets::Credential;
use async_trait::async_trait;
use common::{Progress, ProgressEvent};
use tracing::instrument;

/// Outcome of the user catalog check. A failed query is the `Err` side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    Found(String),
    Absent,
}

/// An authenticated connection with privilege to create and alter users.
#[async_trait]
pub trait AdminSession: Send + Sync {
    /// Look the username up in the user catalog by exact match.
    async fn lookup_user(&self, username: &str) -> Result<UserLookup, BoxError>;

    /// Run a statement that returns no rows.
    async fn execute(&self, statement: &str) -> Result<(), BoxError>;
}

/// Opens administrative sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: AdminSession;

    async fn connect(&self, config: &tokio_postgres::Config) -> Result<Self::Session, BoxError>;
}

/// Make `target` exist with `target.password`, creating or altering as needed.
///
/// Runs the catalog check exactly once, then exactly one CREATE or ALTER.
/// Two concurrent calls for the same absent user can both pick CREATE; the
/// loser fails with the server's duplicate-role error.
#[instrument(skip_all, fields(username = %target.username))]
pub async fn upsert_user<S>(
    session: &S,
    target: &Credential,
    progress: &Progress,
) -> Result<UpsertVerb, ProvisionError>
where
    S: AdminSession + ?Sized,
{
    let lookup = session
        .lookup_user(&target.username)
        .await
        .map_err(ProvisionError::UserLookup)?;

    let verb = match lookup {
        UserLookup::Found(_) => UpsertVerb::Alter,
        UserLookup::Absent => UpsertVerb::Create,
    };
    progress.report(ProgressEvent::UserChecked {
        username: target.username.clone(),
        exists: verb == UpsertVerb::Alter,
    });

    let statement = upsert_statement(verb, &target.username, &target.password);
    session
        .execute(&statement)
        .await
        .map_err(|source| ProvisionError::Execute { verb, source })?;

    progress.report(ProgressEvent::UserUpserted {
        username: target.username.clone(),
        action: verb.past_tense().to_string(),
    });

    Ok(verb)
}
