//! Error types for mpp-db.

use rusqlite::ffi;

/// Result type alias for mpp-db operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for mpp-db.
///
/// A missing project is not an error: reads return `None` and updates return
/// [`UpdateOutcome::NotFound`](crate::core::UpdateOutcome::NotFound).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid credentials, or an unreadable config source.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Backend failure while opening a connection or running a statement.
    #[error("Database connection error: {0}")]
    Connection(#[source] rusqlite::Error),

    /// Duration unit label that does not name a known time unit.
    #[error("Unrecognized duration unit: {0:?}")]
    UnitParse(String),

    /// Duration magnitude that cannot be stored.
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// Column value of the wrong type or format.
    #[error("Invalid value in column {column}: {reason}")]
    InvalidRow { column: String, reason: String },

    /// A project with this id is already stored.
    #[error("Project #{0} already exists")]
    ProjectExists(i64),

    /// Logger bootstrap failure.
    #[error("Logging error: {0}")]
    Logging(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::InvalidColumnType(_, column, ty) => Error::InvalidRow {
                column,
                reason: format!("unexpected {ty} value"),
            },
            rusqlite::Error::FromSqlConversionFailure(idx, ty, source) => Error::InvalidRow {
                column: format!("#{idx}"),
                reason: format!("cannot convert {ty} value: {source}"),
            },
            other => Error::Connection(other),
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Configuration(err.to_string())
    }
}

impl Error {
    /// Whether this is a primary-key violation reported by SQLite.
    pub(crate) fn is_primary_key_violation(&self) -> bool {
        matches!(
            self,
            Error::Connection(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )
    }
}
