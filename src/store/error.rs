//! Repository error taxonomy

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RepoError>;

/// Errors surfaced by every repository backend.
///
/// Adapters never retry or swallow these; the caller decides what to show.
#[derive(Debug, Error, Diagnostic)]
pub enum RepoError {
    #[error("constraint violation: {message}")]
    #[diagnostic(
        code(qms::store::constraint),
        help("a unique value is already taken or a referenced record does not exist")
    )]
    ConstraintViolation { message: String },

    #[error("{table} record not found: {id}")]
    #[diagnostic(code(qms::store::not_found))]
    NotFound { table: String, id: String },

    #[error("storage backend unavailable: {message}")]
    #[diagnostic(
        code(qms::store::unavailable),
        help("check the backend settings with `qms config show`")
    )]
    BackendUnavailable { message: String },

    #[error("storage query failed: {message}")]
    #[diagnostic(code(qms::store::query))]
    Query { message: String },

    #[error("could not decode stored {table} row: {message}")]
    #[diagnostic(code(qms::store::decode))]
    Decode { table: String, message: String },
}

impl RepoError {
    pub fn not_found(table: impl Into<String>, id: impl Into<String>) -> Self {
        RepoError::NotFound {
            table: table.into(),
            id: id.into(),
        }
    }

    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        RepoError::BackendUnavailable {
            message: message.to_string(),
        }
    }

    pub fn decode(table: impl Into<String>, message: impl std::fmt::Display) -> Self {
        RepoError::Decode {
            table: table.into(),
            message: message.to_string(),
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, RepoError::ConstraintViolation { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepoError::NotFound { .. })
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref inner, _)
                if inner.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                RepoError::ConstraintViolation {
                    message: err.to_string(),
                }
            }
            rusqlite::Error::SqliteFailure(ref inner, _)
                if matches!(
                    inner.code,
                    rusqlite::ErrorCode::CannotOpen
                        | rusqlite::ErrorCode::NotADatabase
                        | rusqlite::ErrorCode::DatabaseCorrupt
                ) =>
            {
                RepoError::BackendUnavailable {
                    message: err.to_string(),
                }
            }
            other => RepoError::Query {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_unique_failure_maps_to_constraint_violation() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (code TEXT UNIQUE); INSERT INTO t VALUES ('A');")
            .unwrap();
        let err: RepoError = conn
            .execute("INSERT INTO t VALUES ('A')", [])
            .unwrap_err()
            .into();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_syntax_error_maps_to_query() {
        let conn = Connection::open_in_memory().unwrap();
        let err: RepoError = conn.execute("SELEC 1", []).unwrap_err().into();
        assert!(matches!(err, RepoError::Query { .. }));
    }
}
