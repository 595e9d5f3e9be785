use crate::error::Error;
use crate::models::{timestamp, unsigned};
use luxi_extract::models::RawMetadata;
use std::path::PathBuf;
use time::UtcDateTime;

/// A catalogued title, backed by one directory directly under a library root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub id: i64,
    pub library_id: i64,
    pub title: String,
    /// Unique absolute path; the deduplication key across rescans.
    pub path: PathBuf,
    /// Downloaded cover, relative to the assets root.
    pub cover_path: Option<PathBuf>,
    pub metadata: Option<RawMetadata>,
    pub created_at: UtcDateTime,
}

/// A series plus how many issues it holds, for library listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSummary {
    pub series: Series,
    pub issue_count: u64,
}

#[derive(sqlx::FromRow)]
pub(crate) struct SeriesRow {
    id: i64,
    library_id: i64,
    title: String,
    path: String,
    cover_path: Option<String>,
    metadata: Option<String>,
    created_at: i64,
}
impl TryFrom<SeriesRow> for Series {
    type Error = Error;
    fn try_from(row: SeriesRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            library_id: row.library_id,
            title: row.title,
            path: PathBuf::from(row.path),
            cover_path: row.cover_path.map(PathBuf::from),
            metadata: row.metadata.map(RawMetadata::from),
            created_at: timestamp(row.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct SeriesSummaryRow {
    #[sqlx(flatten)]
    series: SeriesRow,
    issue_count: i64,
}
impl TryFrom<SeriesSummaryRow> for SeriesSummary {
    type Error = Error;
    fn try_from(row: SeriesSummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            series: row.series.try_into()?,
            issue_count: unsigned(row.issue_count, "issue count")?,
        })
    }
}
