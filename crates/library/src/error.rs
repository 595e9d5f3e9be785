//! Library Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Callers at an outer boundary (the command line, or a
//! request handler) match on the [`ErrorKind`] at the root of the tree; the
//! dependency error that caused it hangs beneath.

use derive_more::{Display, Error};
use luxi_catalog::error::{Error as CatalogError, ErrorKind as CatalogErrorKind};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong, from the point of view of whoever asked.
///
/// ### Request Errors
/// - [`ErrorKind::NotFound`]
/// - [`ErrorKind::Conflict`]
/// - [`ErrorKind::InvalidInput`]
/// - [`ErrorKind::PathViolation`]
///
/// ### Per-Issue Errors (logged during a scan, never fatal to it)
/// - [`ErrorKind::ArchiveCorrupt`]
/// - [`ErrorKind::MetadataUnavailable`]
/// - [`ErrorKind::Thumbnail`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Io`]
/// - [`ErrorKind::Catalog`]
/// - [`ErrorKind::Storage`]
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The library, series, issue, or its backing file does not exist.
    #[display("not found")]
    NotFound,
    /// A scan is already running, or a unique name/path is taken.
    #[display("conflict")]
    Conflict,
    #[display("invalid input: {_0}")]
    InvalidInput(#[error(not(source))] String),
    /// A catalog path resolved outside its library root.
    #[display("path escapes its library root")]
    PathViolation,
    #[display("archive is corrupt or unreadable")]
    ArchiveCorrupt,
    #[display("series metadata unavailable")]
    MetadataUnavailable,
    #[display("could not generate thumbnail")]
    Thumbnail,
    #[display("I/O failure")]
    Io,
    #[display("catalog failure")]
    Catalog,
    #[display("storage failure")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io | Self::Catalog | Self::MetadataUnavailable)
    }

    /// Translate a catalog failure into the request-level kind it implies.
    pub(crate) fn from_catalog(err: &CatalogError) -> Self {
        match &**err {
            CatalogErrorKind::NotFound(_, _) => Self::NotFound,
            CatalogErrorKind::Conflict(_, _) => Self::Conflict,
            CatalogErrorKind::PageOutOfRange { requested, total } => {
                Self::InvalidInput(format!("page {requested} is beyond the last page ({total})"))
            },
            _ => Self::Catalog,
        }
    }
}

/// Raise catalog errors into library errors, keeping NotFound/Conflict
/// distinguishable at the top of the tree.
pub(crate) trait CatalogResultExt<T> {
    fn or_catalog(self) -> Result<T>;
}
impl<T> CatalogResultExt<T> for luxi_catalog::error::Result<T> {
    fn or_catalog(self) -> Result<T> {
        use exn::ResultExt;
        match self {
            Ok(value) => Ok(value),
            Err(err) => {
                let kind = ErrorKind::from_catalog(&err);
                Err(err).or_raise(|| kind.clone())
            },
        }
    }
}
