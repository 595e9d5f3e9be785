//! Catalog operations a front end exposes besides scanning and streaming.

use crate::Context;
use crate::error::{CatalogResultExt, ErrorKind, Result};
use crate::scan::{LOOSE_IMAGE_EXTENSIONS, ScanHandle, request_scan};
use exn::{OptionExt, ResultExt};
use luxi_catalog::{Issue, Library, ScanState, Series, SeriesSummary};
use luxi_storage::StorageBackend;
use luxi_storage::error::ErrorKind as StorageErrorKind;
use luxi_thumbnail::Thumbnailer;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// A library and its series, ordered by title.
#[derive(Debug, Clone)]
pub struct LibraryOverview {
    pub library: Library,
    pub series: Vec<SeriesSummary>,
}

/// A series and its issues, ordered by volume then chapter.
#[derive(Debug, Clone)]
pub struct SeriesDetail {
    pub series: Series,
    pub issues: Vec<Issue>,
}

/// Register a library and start scanning it.
///
/// The library is kept even if the scan can't start because another one is
/// running; the returned handle is `None` in that case.
#[instrument(skip(ctx))]
pub async fn create_library(ctx: &Context, name: &str, path: &Path) -> Result<(Library, Option<ScanHandle>)> {
    let name = name.trim();
    if name.is_empty() {
        exn::bail!(ErrorKind::InvalidInput("library name is empty".to_string()));
    }
    if !path.is_absolute() {
        exn::bail!(ErrorKind::InvalidInput(format!("library path must be absolute: {}", path.display())));
    }
    let is_dir = tokio::fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false);
    if !is_dir {
        exn::bail!(ErrorKind::InvalidInput(format!("not a directory: {}", path.display())));
    }
    let library = ctx.catalog().create_library(name, path).await.or_catalog()?;
    info!(library = library.id, "created library");
    match request_scan(ctx, library.id).await {
        Ok(handle) => Ok((library, Some(handle))),
        Err(e) if *e == ErrorKind::Conflict => {
            warn!(library = library.id, "scan already running; new library will be picked up by a later scan");
            Ok((library, None))
        },
        Err(e) => Err(e),
    }
}

pub async fn list_libraries(ctx: &Context) -> Result<Vec<Library>> {
    ctx.catalog().list_libraries().await.or_catalog()
}

pub async fn get_library(ctx: &Context, id: i64) -> Result<LibraryOverview> {
    let library = ctx.catalog().get_library(id).await.or_catalog()?.ok_or_raise(|| ErrorKind::NotFound)?;
    let series = ctx.catalog().list_series(id).await.or_catalog()?;
    Ok(LibraryOverview { library, series })
}

pub async fn get_series(ctx: &Context, id: i64) -> Result<SeriesDetail> {
    let series = ctx.catalog().get_series(id).await.or_catalog()?.ok_or_raise(|| ErrorKind::NotFound)?;
    let issues = list_issues(ctx, id).await?;
    Ok(SeriesDetail { series, issues })
}

/// Issues of a series ordered by volume then chapter.
pub async fn list_issues(ctx: &Context, series_id: i64) -> Result<Vec<Issue>> {
    ctx.catalog().get_series(series_id).await.or_catalog()?.ok_or_raise(|| ErrorKind::NotFound)?;
    ctx.catalog().list_issues(series_id).await.or_catalog()
}

pub async fn get_issue(ctx: &Context, id: i64) -> Result<Issue> {
    ctx.catalog().get_issue(id).await.or_catalog()?.ok_or_raise(|| ErrorKind::NotFound)
}

/// Delete a series and its issues. With `remove_files`, each issue's file
/// or folder is removed from disk too; removal failures are logged.
#[instrument(skip(ctx))]
pub async fn delete_series(ctx: &Context, id: i64, remove_files: bool) -> Result<()> {
    let SeriesDetail { series, issues } = get_series(ctx, id).await?;
    ctx.catalog().delete_series(id).await.or_catalog()?;
    info!(issues = issues.len(), "deleted series");
    let library = ctx.catalog().get_library(series.library_id).await.or_catalog()?;
    for issue in &issues {
        discard_preview(ctx, issue.id).await;
        if remove_files && let Some(library) = &library {
            remove_backing_path(&issue.path, &library.path).await;
        }
    }
    if let Some(cover) = &series.cover_path {
        discard_asset(ctx, cover).await;
    }
    Ok(())
}

/// Delete one issue, optionally removing its file or folder from disk.
#[instrument(skip(ctx))]
pub async fn delete_issue(ctx: &Context, id: i64, remove_files: bool) -> Result<()> {
    let issue = get_issue(ctx, id).await?;
    ctx.catalog().delete_issue(id).await.or_catalog()?;
    info!("deleted issue");
    discard_preview(ctx, id).await;
    if remove_files {
        let series = ctx.catalog().get_series(issue.series_id).await.or_catalog()?;
        if let Some(series) = series
            && let Some(library) = ctx.catalog().get_library(series.library_id).await.or_catalog()?
        {
            remove_backing_path(&issue.path, &library.path).await;
        }
    }
    Ok(())
}

/// Move the reading cursor of an issue; reaching the last page marks it
/// read. A page past the end is [`ErrorKind::InvalidInput`].
pub async fn set_current_page(ctx: &Context, id: i64, page: u64) -> Result<Issue> {
    ctx.catalog().set_current_page(id, page).await.or_catalog()
}

pub async fn mark_issue_read(ctx: &Context, id: i64) -> Result<Issue> {
    ctx.catalog().mark_issue_read(id).await.or_catalog()?;
    get_issue(ctx, id).await
}

/// Mark every issue of a series read, returning how many there were.
pub async fn mark_series_read(ctx: &Context, id: i64) -> Result<u64> {
    ctx.catalog().get_series(id).await.or_catalog()?.ok_or_raise(|| ErrorKind::NotFound)?;
    ctx.catalog().mark_series_read(id).await.or_catalog()
}

pub async fn scan_status(ctx: &Context) -> Result<ScanState> {
    ctx.catalog().scan_state().await.or_catalog()
}

/// JPEG bytes of a series cover. [`ErrorKind::NotFound`] if the series is
/// unknown or no cover was downloaded for it.
pub async fn series_cover(ctx: &Context, id: i64) -> Result<Vec<u8>> {
    let series = ctx.catalog().get_series(id).await.or_catalog()?.ok_or_raise(|| ErrorKind::NotFound)?;
    let path = series.cover_path.ok_or_raise(|| ErrorKind::NotFound)?;
    read_asset(ctx, &path).await
}

/// JPEG bytes of an issue's first-page thumbnail. [`ErrorKind::NotFound`]
/// if the issue is unknown or was never thumbnailed.
pub async fn issue_preview(ctx: &Context, id: i64) -> Result<Vec<u8>> {
    get_issue(ctx, id).await?;
    read_asset(ctx, &Thumbnailer::preview_path(id)).await
}

async fn read_asset(ctx: &Context, path: &Path) -> Result<Vec<u8>> {
    match ctx.assets().read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if matches!(&*e, StorageErrorKind::NotFound(_)) => exn::bail!(ErrorKind::NotFound),
        Err(e) => Err(e).or_raise(|| ErrorKind::Storage),
    }
}

async fn discard_preview(ctx: &Context, issue_id: i64) {
    discard_asset(ctx, &Thumbnailer::preview_path(issue_id)).await;
}

async fn discard_asset(ctx: &Context, path: &Path) {
    if let Err(e) = ctx.assets().delete(path).await {
        debug!(path = %path.display(), error = ?e, "no asset to discard");
    }
}

/// Remove an issue's file, or the loose images of a folder issue, refusing
/// anything outside its library. A folder goes too once nothing else is
/// left in it; it may well be a series directory holding other issues.
async fn remove_backing_path(path: &Path, root: &Path) {
    let path = match luxi_storage::confine(path, root) {
        Ok(path) => path,
        Err(e) => {
            warn!(error = ?e, "refusing to remove file outside library");
            return;
        },
    };
    let removed = match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_dir() => remove_loose_images(&path).await,
        Ok(_) => tokio::fs::remove_file(&path).await,
        Err(e) => Err(e),
    };
    match removed.or_raise(|| ErrorKind::Io) {
        Ok(()) => info!(path = %path.display(), "removed issue from disk"),
        Err(e) => warn!(path = %path.display(), error = ?e, "could not remove issue from disk"),
    }
}

async fn remove_loose_images(dir: &Path) -> std::io::Result<()> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_loose_image(&path) {
            tokio::fs::remove_file(&path).await?;
        }
    }
    // Non-recursive: fails while anything else remains.
    if let Err(e) = tokio::fs::remove_dir(dir).await {
        debug!(path = %dir.display(), error = %e, "keeping folder with other contents");
    }
    Ok(())
}

fn is_loose_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| LOOSE_IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
