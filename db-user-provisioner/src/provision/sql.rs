//! Statement text for user provisioning

use std::fmt;

/// Existence check against the user catalog. The username is parameter-bound.
pub const USER_EXISTS_QUERY: &str = "SELECT usename FROM pg_catalog.pg_user WHERE usename = $1";

/// Which DDL verb an upsert runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertVerb {
    Create,
    Alter,
}

impl UpsertVerb {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Alter => "ALTER",
        }
    }

    /// Past tense, for progress messages.
    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Alter => "updated",
        }
    }
}

impl fmt::Display for UpsertVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Alter => f.write_str("alter"),
        }
    }
}

/// Quote a value as an SQL identifier: wrap in `"` and double embedded `"`.
pub fn quote_identifier(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Quote a value as a standard SQL string literal: wrap in `'` and double embedded `'`.
///
/// Relies on `standard_conforming_strings = on` (the server default since 9.1),
/// under which backslashes inside the literal are not escapes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `CREATE USER "<username>" WITH PASSWORD '<password>'`, or the ALTER form.
///
/// DDL cannot take bind parameters, so both values are quoted into the text.
/// The result must never be logged.
pub fn upsert_statement(verb: UpsertVerb, username: &str, password: &str) -> String {
    format!(
        "{} USER {} WITH PASSWORD {}",
        verb.keyword(),
        quote_identifier(username),
        quote_literal(password)
    )
}
