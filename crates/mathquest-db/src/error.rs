//! Error types for database operations.

use thiserror::Error;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Native DB error.
    #[error("Database error: {0}")]
    Database(String),

    /// Stored record could not be converted back into a domain value.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<native_db::db_type::Error> for Error {
    fn from(err: native_db::db_type::Error) -> Self {
        Error::Database(err.to_string())
    }
}

impl From<Error> for mathquest_core::Error {
    fn from(err: Error) -> Self {
        mathquest_core::Error::Storage(err.to_string())
    }
}
