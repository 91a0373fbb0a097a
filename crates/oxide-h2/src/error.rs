//! Error types for the H2 dialect adapter.

use crate::executor::ExecutorError;
use crate::reflect::ConstraintParseError;

/// Errors that can occur while compiling, reflecting or coordinating
/// transactions against an H2 database.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A round-trip to the database failed.
    ///
    /// The executor's error is carried unchanged so callers can inspect the
    /// driver message (see [`ExecutorError::error_code`]).
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    /// A foreign-key definition returned by the catalog could not be parsed.
    #[error("Malformed definition for constraint '{constraint}': {source}")]
    MalformedConstraint {
        /// Name of the constraint whose definition failed to parse.
        constraint: String,
        /// The underlying parse failure.
        #[source]
        source: ConstraintParseError,
    },

    /// A catalog row did not have the shape the reflector expects.
    #[error("Unexpected row from {query}: {message}")]
    UnexpectedRow {
        /// Short name of the catalog query.
        query: &'static str,
        /// What was wrong with the row.
        message: String,
    },

    /// A two-phase-commit transaction id contains characters that cannot be
    /// embedded in protocol commands.
    #[error("Invalid two-phase transaction id: {0:?}")]
    InvalidTransactionId(String),

    /// Configuration rejected a value before it reached the database.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns the numeric error code reported by the database, if this is an
    /// executor failure that carries one.
    #[must_use]
    pub fn error_code(&self) -> Option<i32> {
        match self {
            Self::Executor(err) => err.error_code(),
            _ => None,
        }
    }
}

/// Result type for dialect operations.
pub type Result<T> = std::result::Result<T, Error>;
