//! Queries over libraries, series, issues and the scan flag.

use crate::Database;
use crate::error::{ErrorKind, Result, is_unique_violation};
use crate::models::{
    Issue, IssueRow, Library, LibraryRow, NewIssue, ScanState, Series, SeriesRow, SeriesSummary, SeriesSummaryRow,
    path_to_text, unsigned,
};
use exn::{OptionExt, ResultExt};
use luxi_extract::models::RawMetadata;
use sqlx::SqlitePool;
use std::path::Path;
use time::UtcDateTime;
use tracing::{debug, instrument};

const SCAN_LOCK_KEY: &str = "scan_lock";

/// Row totals across the whole catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct Counts {
    pub libraries: i64,
    pub series: i64,
    pub issues: i64,
}

/// Repository over every catalog table.
///
/// # Relationships
///
/// - A library owns many series; a series owns many issues.
/// - Deleting a series deletes its issues (foreign key cascade).
/// - Series and issue paths are globally unique, which is what makes
///   [`find_or_create_series`](Self::find_or_create_series) and
///   [`find_or_create_issue`](Self::find_or_create_issue) idempotent.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn now() -> i64 {
        UtcDateTime::now().unix_timestamp()
    }

    // =========================================================================
    // Libraries
    // =========================================================================

    /// Record a new library. Returns [`ErrorKind::Conflict`] if the name or
    /// the path is already taken.
    #[instrument(skip(self))]
    pub async fn create_library(&self, name: &str, path: &Path) -> Result<Library> {
        let path_text = path_to_text(path)?;
        let row: LibraryRow = match sqlx::query_as(include_str!("../queries/insert_library.sql"))
            .bind(name)
            .bind(&path_text)
            .bind(Self::now())
            .fetch_one(&self.pool)
            .await
        {
            Err(e) if is_unique_violation(&e) => {
                exn::bail!(ErrorKind::Conflict("library", format!("{name} ({path_text})")))
            },
            other => other.or_raise(|| ErrorKind::Database)?,
        };
        row.try_into()
    }

    pub async fn get_library(&self, id: i64) -> Result<Option<Library>> {
        let row: Option<LibraryRow> = sqlx::query_as(include_str!("../queries/get_library.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Library::try_from).transpose()
    }

    /// All libraries, ordered by name.
    pub async fn list_libraries(&self) -> Result<Vec<Library>> {
        let rows: Vec<LibraryRow> = sqlx::query_as(include_str!("../queries/list_libraries.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Library::try_from).collect()
    }

    // =========================================================================
    // Series
    // =========================================================================

    /// Find the series at `path`, or create it. The boolean is `true` only
    /// when this call created the row.
    #[instrument(skip(self))]
    pub async fn find_or_create_series(&self, library_id: i64, title: &str, path: &Path) -> Result<(Series, bool)> {
        let path_text = path_to_text(path)?;
        let created: Option<SeriesRow> = sqlx::query_as(include_str!("../queries/insert_series.sql"))
            .bind(library_id)
            .bind(title)
            .bind(&path_text)
            .bind(Self::now())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if let Some(row) = created {
            debug!("created series");
            return Ok((row.try_into()?, true));
        }
        let existing: SeriesRow = sqlx::query_as(include_str!("../queries/get_series_by_path.sql"))
            .bind(&path_text)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok((existing.try_into()?, false))
    }

    pub async fn get_series(&self, id: i64) -> Result<Option<Series>> {
        let row: Option<SeriesRow> = sqlx::query_as(include_str!("../queries/get_series.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Series::try_from).transpose()
    }

    /// Series of a library ordered by title, each with its issue count.
    pub async fn list_series(&self, library_id: i64) -> Result<Vec<SeriesSummary>> {
        let rows: Vec<SeriesSummaryRow> = sqlx::query_as(include_str!("../queries/list_series.sql"))
            .bind(library_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(SeriesSummary::try_from).collect()
    }

    pub async fn set_series_metadata(&self, id: i64, metadata: &RawMetadata) -> Result<()> {
        let result = sqlx::query(include_str!("../queries/update_series_metadata.sql"))
            .bind(id)
            .bind(metadata.as_str())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::expect_one("series", id, result.rows_affected())
    }

    pub async fn set_series_cover(&self, id: i64, cover_path: &Path) -> Result<()> {
        let result = sqlx::query(include_str!("../queries/update_series_cover.sql"))
            .bind(id)
            .bind(path_to_text(cover_path)?)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::expect_one("series", id, result.rows_affected())
    }

    /// Delete a series and, through the cascade, all of its issues.
    #[instrument(skip(self))]
    pub async fn delete_series(&self, id: i64) -> Result<()> {
        let result = sqlx::query(include_str!("../queries/delete_series.sql"))
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::expect_one("series", id, result.rows_affected())
    }

    // =========================================================================
    // Issues
    // =========================================================================

    /// Find the issue at `issue.path`, or create it with a page count of
    /// zero. The boolean is `true` only when this call created the row.
    #[instrument(skip(self, issue), fields(path = %issue.path.display()))]
    pub async fn find_or_create_issue(&self, issue: &NewIssue) -> Result<(Issue, bool)> {
        let path_text = path_to_text(&issue.path)?;
        let created: Option<IssueRow> = sqlx::query_as(include_str!("../queries/insert_issue.sql"))
            .bind(issue.series_id)
            .bind(&path_text)
            .bind(issue.format.as_str())
            .bind(i64::from(issue.volume))
            .bind(i64::from(issue.chapter))
            .bind(Self::now())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if let Some(row) = created {
            debug!("created issue");
            return Ok((row.try_into()?, true));
        }
        let existing: IssueRow = sqlx::query_as(include_str!("../queries/get_issue_by_path.sql"))
            .bind(&path_text)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok((existing.try_into()?, false))
    }

    pub async fn get_issue(&self, id: i64) -> Result<Option<Issue>> {
        let row: Option<IssueRow> = sqlx::query_as(include_str!("../queries/get_issue.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Issue::try_from).transpose()
    }

    /// Issues of a series ordered by volume, then chapter, then path.
    pub async fn list_issues(&self, series_id: i64) -> Result<Vec<Issue>> {
        let rows: Vec<IssueRow> = sqlx::query_as(include_str!("../queries/list_issues.sql"))
            .bind(series_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Issue::try_from).collect()
    }

    pub async fn set_page_count(&self, id: i64, page_count: u64) -> Result<()> {
        let page_count = i64::try_from(page_count).or_raise(|| ErrorKind::InvalidData("page count"))?;
        let result = sqlx::query(include_str!("../queries/update_issue_page_count.sql"))
            .bind(id)
            .bind(page_count)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::expect_one("issue", id, result.rows_affected())
    }

    /// Move the reading cursor. Landing on the last page marks the issue
    /// read; moving back never clears the flag.
    ///
    /// Returns [`ErrorKind::PageOutOfRange`] if `page` is beyond the page
    /// count, or [`ErrorKind::NotFound`] if there is no such issue.
    #[instrument(skip(self))]
    pub async fn set_current_page(&self, id: i64, page: u64) -> Result<Issue> {
        let page_value = i64::try_from(page).or_raise(|| ErrorKind::InvalidData("current page"))?;
        let updated: Option<IssueRow> = sqlx::query_as(include_str!("../queries/update_issue_progress.sql"))
            .bind(id)
            .bind(page_value)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        match updated {
            Some(row) => row.try_into(),
            None => {
                let issue = self.get_issue(id).await?.ok_or_raise(|| ErrorKind::NotFound("issue", id))?;
                exn::bail!(ErrorKind::PageOutOfRange { requested: page, total: issue.page_count })
            },
        }
    }

    pub async fn mark_issue_read(&self, id: i64) -> Result<()> {
        let result = sqlx::query(include_str!("../queries/mark_issue_read.sql"))
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::expect_one("issue", id, result.rows_affected())
    }

    /// Mark every issue of a series read, returning how many rows changed.
    pub async fn mark_series_read(&self, series_id: i64) -> Result<u64> {
        let result = sqlx::query(include_str!("../queries/mark_series_read.sql"))
            .bind(series_id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    pub async fn delete_issue(&self, id: i64) -> Result<()> {
        let result = sqlx::query(include_str!("../queries/delete_issue.sql"))
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::expect_one("issue", id, result.rows_affected())
    }

    pub async fn counts(&self) -> Result<Counts> {
        sqlx::query_as(include_str!("../queries/count_catalog.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    // =========================================================================
    // Scan flag
    // =========================================================================

    pub async fn scan_state(&self) -> Result<ScanState> {
        let value: Option<(String,)> = sqlx::query_as(include_str!("../queries/get_config.sql"))
            .bind(SCAN_LOCK_KEY)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        value.map_or(Ok(ScanState::Idle), |(flag,)| flag.parse())
    }

    /// Overwrite the scan flag unconditionally.
    pub async fn set_scan_state(&self, state: ScanState) -> Result<()> {
        sqlx::query(include_str!("../queries/set_config.sql"))
            .bind(SCAN_LOCK_KEY)
            .bind(state.as_flag())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Atomically flip the scan flag from idle to busy. Returns `false`
    /// (changing nothing) if it was already busy.
    pub async fn try_begin_scan(&self) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/compare_and_set_config.sql"))
            .bind(SCAN_LOCK_KEY)
            .bind(ScanState::Idle.as_flag())
            .bind(ScanState::Busy.as_flag())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() == 1)
    }

    fn expect_one(entity: &'static str, id: i64, rows_affected: u64) -> Result<()> {
        match rows_affected {
            0 => exn::bail!(ErrorKind::NotFound(entity, id)),
            _ => Ok(()),
        }
    }
}
