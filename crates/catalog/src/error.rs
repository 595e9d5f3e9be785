//! Catalog Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// No row of the given entity has that id.
    #[display("{_0} {_1} not found")]
    NotFound(#[error(not(source))] &'static str, #[error(not(source))] i64),
    /// A unique column (name or path) already holds that value.
    #[display("{_0} already exists: {_1}")]
    Conflict(#[error(not(source))] &'static str, #[error(not(source))] String),
    /// A requested page lies beyond the end of the issue.
    #[display("page {requested} is out of range (issue has {total} pages)")]
    PageOutOfRange { requested: u64, total: u64 },
    /// A value could not be converted to or from its column representation.
    #[display("invalid catalog data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // SQLITE_BUSY surfaces as a generic database error.
        matches!(self, Self::Database)
    }
}

/// Whether a sqlx error is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
