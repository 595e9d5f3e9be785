use crate::error::{Error, ErrorKind};
use crate::models::{timestamp, unsigned};
use exn::ResultExt;
use luxi_archive::ArchiveKind;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;
use time::UtcDateTime;

/// What backs an issue on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueFormat {
    Archive(ArchiveKind),
    /// A directory of loose page images.
    Folder,
}
impl IssueFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueFormat::Archive(kind) => kind.as_str(),
            IssueFormat::Folder => "folder",
        }
    }
}
impl Display for IssueFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
impl FromStr for IssueFormat {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folder" => Ok(IssueFormat::Folder),
            other => Ok(IssueFormat::Archive(
                other.parse::<ArchiveKind>().or_raise(|| ErrorKind::InvalidData("issue format"))?,
            )),
        }
    }
}

/// One readable unit (an archive or an image folder) of a series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub id: i64,
    pub series_id: i64,
    /// Unique absolute path; the deduplication key across rescans.
    pub path: PathBuf,
    pub format: IssueFormat,
    /// Parsed volume number, 0 when unknown.
    pub volume: u32,
    /// Parsed chapter number, 0 when unknown.
    pub chapter: u32,
    pub page_count: u64,
    pub current_page: u64,
    pub is_read: bool,
    pub created_at: UtcDateTime,
}

/// Everything known about an issue before it is inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub series_id: i64,
    pub path: PathBuf,
    pub format: IssueFormat,
    pub volume: u32,
    pub chapter: u32,
}

#[derive(sqlx::FromRow)]
pub(crate) struct IssueRow {
    id: i64,
    series_id: i64,
    path: String,
    format: String,
    volume: i64,
    chapter: i64,
    page_count: i64,
    current_page: i64,
    is_read: bool,
    created_at: i64,
}
impl TryFrom<IssueRow> for Issue {
    type Error = Error;
    fn try_from(row: IssueRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            series_id: row.series_id,
            path: PathBuf::from(row.path),
            format: row.format.parse()?,
            volume: unsigned(row.volume, "volume")?,
            chapter: unsigned(row.chapter, "chapter")?,
            page_count: unsigned(row.page_count, "page count")?,
            current_page: unsigned(row.current_page, "current page")?,
            is_read: row.is_read,
            created_at: timestamp(row.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("zip", IssueFormat::Archive(ArchiveKind::Zip))]
    #[case("rar", IssueFormat::Archive(ArchiveKind::Rar))]
    #[case("7z", IssueFormat::Archive(ArchiveKind::SevenZip))]
    #[case("folder", IssueFormat::Folder)]
    fn test_format_round_trip(#[case] text: &str, #[case] format: IssueFormat) {
        assert_eq!(text.parse::<IssueFormat>().unwrap(), format);
        assert_eq!(format.to_string(), text);
    }

    #[test]
    fn test_row_to_model() {
        let row = IssueRow {
            id: 1,
            series_id: 2,
            path: "/comics/OnePiece/OnePiece - v1 c001.cbz".to_string(),
            format: "zip".to_string(),
            volume: 1,
            chapter: 1,
            page_count: 20,
            current_page: 3,
            is_read: false,
            created_at: 1_700_000_000,
        };
        let issue = Issue::try_from(row).unwrap();
        assert_eq!(issue.format, IssueFormat::Archive(ArchiveKind::Zip));
        assert_eq!(issue.page_count, 20);
        assert_eq!(issue.created_at.unix_timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_unknown_format_is_invalid() {
        let row = IssueRow {
            id: 1,
            series_id: 2,
            path: "/comics/a.cbz".to_string(),
            format: "tar".to_string(),
            volume: 0,
            chapter: 0,
            page_count: 0,
            current_page: 0,
            is_read: false,
            created_at: 0,
        };
        let err = Issue::try_from(row).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidData("issue format"));
    }
}
