use crate::Context;
use crate::error::{CatalogResultExt, Error, ErrorKind, Result};
use crate::scan::classify::Classification;
use exn::ResultExt;
use luxi_archive::{ArchiveKind, inspect};
use luxi_catalog::{Issue, IssueFormat, Library, NewIssue, Series};
use luxi_lookup::MetadataLookup;
use luxi_storage::{LocalBackend, StorageBackend};
use luxi_thumbnail::Thumbnailer;
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::{debug, info, instrument, warn};

/// The catalog rows one walked file maps onto.
#[derive(Debug, Clone)]
pub struct Synced {
    pub series: Series,
    pub series_created: bool,
    pub issue: Issue,
    pub issue_created: bool,
}

/// Where a series cover downloaded for `id` is kept, relative to the assets
/// root.
pub fn cover_path(id: i64) -> PathBuf {
    PathBuf::from("series").join(format!("{id}.jpg"))
}

/// Brings the catalog in line with classified files of one library.
pub(crate) struct Synchronizer<'a> {
    ctx: &'a Context,
    library: &'a Library,
    backend: &'a LocalBackend,
}

impl<'a> Synchronizer<'a> {
    pub fn new(ctx: &'a Context, library: &'a Library, backend: &'a LocalBackend) -> Self {
        Self { ctx, library, backend }
    }

    /// Find or create the series and issue behind `item`.
    ///
    /// A newly created issue is inspected and thumbnailed before this
    /// returns. Failures in that step leave the issue catalogued (with a page
    /// count of zero if it couldn't be counted) and come back alongside it
    /// rather than as an `Err`.
    pub async fn sync(&self, item: &Classification) -> Result<(Synced, Option<Error>)> {
        let (series, series_created, (issue, issue_created, failure)) = match item {
            Classification::Archive { series, path, kind } => {
                let (series, created) = self.series(series).await?;
                let issue = self.archive(&series, path, *kind).await?;
                (series, created, issue)
            },
            Classification::Folder { series, directory, image } => {
                let (series, created) = self.series(series).await?;
                let issue = self.folder(&series, directory, image).await?;
                (series, created, issue)
            },
            Classification::Skip(reason) => exn::bail!(ErrorKind::InvalidInput(format!("skipped file: {reason}"))),
        };
        Ok((Synced { series, series_created, issue, issue_created }, failure))
    }

    #[instrument(skip(self), fields(library = self.library.id))]
    async fn series(&self, name: &str) -> Result<(Series, bool)> {
        let path = self.library.path.join(name);
        let catalog = self.ctx.catalog();
        let (series, created) = catalog.find_or_create_series(self.library.id, name, &path).await.or_catalog()?;
        if !created {
            debug!(series = series.id, "found existing series");
            return Ok((series, false));
        }
        info!(series = series.id, path = %path.display(), "created series");
        let Some(lookup) = self.ctx.lookup() else {
            return Ok((series, true));
        };
        if let Err(err) = enrich(self.ctx, lookup, &series).await {
            warn!(series = series.id, error = ?err, "could not enrich series");
        }
        tokio::time::sleep(self.ctx.lookup_delay()).await;
        let refreshed = catalog.get_series(series.id).await.or_catalog()?;
        Ok((refreshed.unwrap_or(series), true))
    }

    async fn archive(&self, series: &Series, relative: &Path, kind: ArchiveKind) -> Result<(Issue, bool, Option<Error>)> {
        let path = self.library.path.join(relative);
        let numbering = luxi_extract::parse(&file_stem(relative));
        let new = NewIssue {
            series_id: series.id,
            path: path.clone(),
            format: IssueFormat::Archive(kind),
            volume: numbering.volume,
            chapter: numbering.chapter,
        };
        let (mut issue, created) = self.ctx.catalog().find_or_create_issue(&new).await.or_catalog()?;
        if !created {
            debug!(issue = issue.id, "found existing issue");
            return Ok((issue, false, None));
        }
        info!(issue = issue.id, path = %path.display(), "created issue");

        let inspection = spawn_blocking(move || inspect(kind, &path))
            .await
            .or_raise(|| ErrorKind::Io)
            .and_then(|inspected| inspected.or_raise(|| ErrorKind::ArchiveCorrupt));
        let inspection = match inspection {
            Ok(inspection) => inspection,
            Err(err) => return Ok((issue, true, Some(err))),
        };
        let failure = match inspection.cover {
            Some(cover) => {
                let extension = cover.extension().unwrap_or_default();
                self.write_preview(issue.id, cover.data, extension).await.err()
            },
            None => {
                debug!(issue = issue.id, "archive holds no page images");
                None
            },
        };
        self.ctx.catalog().set_page_count(issue.id, inspection.page_count).await.or_catalog()?;
        issue.page_count = inspection.page_count;
        Ok((issue, true, failure))
    }

    async fn folder(&self, series: &Series, directory: &Path, image: &Path) -> Result<(Issue, bool, Option<Error>)> {
        let path = self.library.path.join(directory);
        let numbering = luxi_extract::parse(&file_name(directory));
        let new = NewIssue {
            series_id: series.id,
            path: path.clone(),
            format: IssueFormat::Folder,
            volume: numbering.volume,
            chapter: numbering.chapter,
        };
        let (mut issue, created) = self.ctx.catalog().find_or_create_issue(&new).await.or_catalog()?;
        if !created {
            debug!(issue = issue.id, "found existing issue");
            return Ok((issue, false, None));
        }
        info!(issue = issue.id, path = %path.display(), "created issue");

        let extension = image.extension().and_then(|e| e.to_str()).unwrap_or_default().to_ascii_lowercase();
        let failure = match self.backend.read(image).await.or_raise(|| ErrorKind::Storage) {
            Ok(data) => self.write_preview(issue.id, data, extension).await.err(),
            Err(err) => Some(err),
        };
        let page_count = self.backend.count_entries(directory).await.or_raise(|| ErrorKind::Storage)?;
        self.ctx.catalog().set_page_count(issue.id, page_count).await.or_catalog()?;
        issue.page_count = page_count;
        Ok((issue, true, failure))
    }

    async fn write_preview(&self, issue_id: i64, data: Vec<u8>, extension: String) -> Result<()> {
        let thumbnailer = self.ctx.thumbnailer();
        let thumbnail = spawn_blocking(move || thumbnailer.render(&data, &extension))
            .await
            .or_raise(|| ErrorKind::Io)?
            .or_raise(|| ErrorKind::Thumbnail)?;
        let preview = Thumbnailer::preview_path(issue_id);
        self.ctx.assets().write(&preview, &thumbnail.jpeg).await.or_raise(|| ErrorKind::Storage)?;
        debug!(issue = issue_id, path = %preview.display(), width = thumbnail.width, height = thumbnail.height, "wrote preview");
        Ok(())
    }
}

/// Look a new series up by title, store whatever comes back, and download
/// its cover if the match has one.
#[instrument(skip_all, fields(series = series.id, title = %series.title))]
pub(crate) async fn enrich(ctx: &Context, lookup: &dyn MetadataLookup, series: &Series) -> Result<()> {
    let found = lookup.find_series(&series.title).await.or_raise(|| ErrorKind::MetadataUnavailable)?;
    let Some(metadata) = found else {
        debug!("no metadata match");
        return Ok(());
    };
    ctx.catalog().set_series_metadata(series.id, &metadata).await.or_catalog()?;
    let view = metadata.view().or_raise(|| ErrorKind::MetadataUnavailable)?;
    let Some(url) = view.cover_url() else {
        debug!("metadata has no cover image");
        return Ok(());
    };
    let image = lookup.fetch_image(url).await.or_raise(|| ErrorKind::MetadataUnavailable)?;
    let cover = cover_path(series.id);
    ctx.assets().write(&cover, &image).await.or_raise(|| ErrorKind::Storage)?;
    ctx.catalog().set_series_cover(series.id, &cover).await.or_catalog()?;
    info!(cover = %cover.display(), "stored series cover");
    Ok(())
}

fn file_stem(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::classify::Classifier;
    use crate::testing::{Fixture, ScriptedLookup, png, write_comic, write_folder};
    use luxi_storage::FileInfo;
    use std::sync::Arc;
    use time::OffsetDateTime;

    async fn sync_file(fixture: &Fixture, library: &Library, relative: &str) -> (Synced, Option<Error>) {
        let backend = LocalBackend::existing(fixture.root()).unwrap();
        let item = Classifier::new().classify(&FileInfo::new(relative, 0, OffsetDateTime::UNIX_EPOCH));
        Synchronizer::new(&fixture.ctx, library, &backend).sync(&item).await.unwrap()
    }

    #[tokio::test]
    async fn test_new_archive_is_inspected_and_thumbnailed() {
        let fixture = Fixture::new().await;
        write_comic(&fixture.root().join("OnePiece/OnePiece - v1 c001.cbz"), 20, &[]);
        let library = fixture.ctx.catalog().create_library("Manga", fixture.root()).await.unwrap();

        let (synced, failure) = sync_file(&fixture, &library, "OnePiece/OnePiece - v1 c001.cbz").await;
        assert!(failure.is_none());
        assert!(synced.series_created && synced.issue_created);
        assert_eq!(synced.series.title, "OnePiece");
        assert_eq!(synced.series.path, fixture.root().join("OnePiece"));
        assert_eq!((synced.issue.volume, synced.issue.chapter, synced.issue.page_count), (1, 1, 20));

        let stored = fixture.ctx.catalog().get_issue(synced.issue.id).await.unwrap().unwrap();
        assert_eq!(stored.page_count, 20);
        let preview = fixture.assets.path().join(Thumbnailer::preview_path(stored.id));
        assert!(preview.is_file());
        fixture.db.close().await;
    }

    #[tokio::test]
    async fn test_rediscovery_does_no_work() {
        let fixture = Fixture::new().await;
        write_comic(&fixture.root().join("Akira/v1.cbz"), 3, &[]);
        let library = fixture.ctx.catalog().create_library("Manga", fixture.root()).await.unwrap();

        let (first, _) = sync_file(&fixture, &library, "Akira/v1.cbz").await;
        let (second, failure) = sync_file(&fixture, &library, "Akira/v1.cbz").await;
        assert!(failure.is_none());
        assert!(!second.series_created && !second.issue_created);
        assert_eq!(first.issue.id, second.issue.id);
        fixture.db.close().await;
    }

    #[tokio::test]
    async fn test_corrupt_archive_is_catalogued_with_failure() {
        let fixture = Fixture::new().await;
        let path = fixture.root().join("Akira/broken.cbz");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"definitely not a zip").unwrap();
        let library = fixture.ctx.catalog().create_library("Manga", fixture.root()).await.unwrap();

        let (synced, failure) = sync_file(&fixture, &library, "Akira/broken.cbz").await;
        assert!(synced.issue_created);
        assert_eq!(synced.issue.page_count, 0);
        assert_eq!(*failure.unwrap(), ErrorKind::ArchiveCorrupt);
        fixture.db.close().await;
    }

    #[tokio::test]
    async fn test_undecodable_cover_still_counts_pages() {
        let fixture = Fixture::new().await;
        write_comic(&fixture.root().join("Akira/v2.cbz"), 0, &[("001.jpg", b"garbage"), ("002.jpg", b"garbage")]);
        let library = fixture.ctx.catalog().create_library("Manga", fixture.root()).await.unwrap();

        let (synced, failure) = sync_file(&fixture, &library, "Akira/v2.cbz").await;
        assert_eq!(synced.issue.page_count, 2);
        assert_eq!(*failure.unwrap(), ErrorKind::Thumbnail);
        fixture.db.close().await;
    }

    #[tokio::test]
    async fn test_image_folder_becomes_issue() {
        let fixture = Fixture::new().await;
        write_folder(&fixture.root().join("Berserk/Chapter 12"), 5);
        let library = fixture.ctx.catalog().create_library("Manga", fixture.root()).await.unwrap();

        let (synced, failure) = sync_file(&fixture, &library, "Berserk/Chapter 12/000.png").await;
        assert!(failure.is_none());
        assert_eq!(synced.issue.format, IssueFormat::Folder);
        assert_eq!(synced.issue.path, fixture.root().join("Berserk/Chapter 12"));
        assert_eq!((synced.issue.volume, synced.issue.chapter, synced.issue.page_count), (0, 12, 5));
        fixture.db.close().await;
    }

    #[tokio::test]
    async fn test_new_series_is_enriched_once() {
        let metadata = r#"{"titles":[{"type":"Default","title":"Akira"}],"images":{"jpg":{"large_image_url":"https://img.example/akira.jpg"}}}"#;
        let lookup = Arc::new(ScriptedLookup {
            result: Some(metadata.to_string()),
            image: Some(png()),
            ..ScriptedLookup::default()
        });
        let fixture = Fixture::new().await.with_lookup(lookup.clone());
        write_comic(&fixture.root().join("Akira/v1.cbz"), 1, &[]);
        write_comic(&fixture.root().join("Akira/v2.cbz"), 1, &[]);
        let library = fixture.ctx.catalog().create_library("Manga", fixture.root()).await.unwrap();

        let (first, _) = sync_file(&fixture, &library, "Akira/v1.cbz").await;
        sync_file(&fixture, &library, "Akira/v2.cbz").await;

        assert_eq!(*lookup.searches.lock().unwrap(), vec!["Akira".to_string()]);
        assert_eq!(first.series.cover_path, Some(cover_path(first.series.id)));
        assert_eq!(first.series.metadata.unwrap().as_str(), metadata);
        assert!(fixture.assets.path().join(cover_path(first.series.id)).is_file());
        fixture.db.close().await;
    }

    #[tokio::test]
    async fn test_failed_cover_download_keeps_metadata() {
        let lookup = Arc::new(ScriptedLookup {
            result: Some(r#"{"images":{"jpg":{"large_image_url":"https://img.example/x.jpg"}}}"#.to_string()),
            ..ScriptedLookup::default()
        });
        let fixture = Fixture::new().await.with_lookup(lookup);
        write_comic(&fixture.root().join("Akira/v1.cbz"), 1, &[]);
        let library = fixture.ctx.catalog().create_library("Manga", fixture.root()).await.unwrap();

        let (synced, _) = sync_file(&fixture, &library, "Akira/v1.cbz").await;
        assert!(synced.series.metadata.is_some());
        assert!(synced.series.cover_path.is_none());
        fixture.db.close().await;
    }
}
