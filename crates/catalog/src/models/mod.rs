mod issue;
mod library;
mod scan;
mod series;

pub use self::issue::{Issue, IssueFormat, NewIssue};
pub(crate) use self::issue::IssueRow;
pub use self::library::Library;
pub(crate) use self::library::LibraryRow;
pub use self::scan::ScanState;
pub use self::series::{Series, SeriesSummary};
pub(crate) use self::series::{SeriesRow, SeriesSummaryRow};

use crate::error::{Error, ErrorKind};
use exn::{OptionExt, ResultExt};
use std::path::Path;
use time::UtcDateTime;

/// sqlx has no `Path` encoding, and non-UTF-8 paths have no place in a TEXT
/// column anyway.
pub(crate) fn path_to_text(path: &Path) -> Result<String, Error> {
    Ok(path.to_str().ok_or_raise(|| ErrorKind::InvalidData("path"))?.to_string())
}

pub(crate) fn timestamp(seconds: i64) -> Result<UtcDateTime, Error> {
    UtcDateTime::from_unix_timestamp(seconds).or_raise(|| ErrorKind::InvalidData("timestamp"))
}

pub(crate) fn unsigned<T: TryFrom<i64>>(value: i64, field: &'static str) -> Result<T, Error>
where
    T::Error: std::error::Error + Send + Sync + 'static,
{
    T::try_from(value).or_raise(|| ErrorKind::InvalidData(field))
}
