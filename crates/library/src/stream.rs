//! Delivering an issue to a reader.
//!
//! Readers only understand zip. Zip archives are sent as they are; folders
//! of loose images and RAR/7-zip archives are packed into a zip first, in an
//! anonymous temporary file that the operating system reclaims as soon as
//! the [`Delivery`] is dropped, however the request ends.

use crate::Context;
use crate::error::{CatalogResultExt, ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use luxi_archive::{ArchiveKind, pack_directory};
use std::fs::File as StdFile;
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::task::spawn_blocking;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument};

pub const ZIP_CONTENT_TYPE: &str = "application/zip";
pub const PASSTHROUGH_CONTENT_TYPE: &str = "application/octet-stream";

/// An issue ready to send: the bytes plus what to call them.
#[derive(Debug)]
pub struct Delivery {
    /// Suggested download name.
    pub filename: String,
    pub content_type: &'static str,
    /// Body length in bytes.
    pub length: u64,
    body: File,
}

impl Delivery {
    /// Whether the body was produced by packing rather than read as-is.
    pub fn is_repackaged(&self) -> bool {
        self.content_type == ZIP_CONTENT_TYPE
    }

    pub fn into_reader(self) -> File {
        self.body
    }

    pub fn into_stream(self) -> ReaderStream<File> {
        ReaderStream::new(self.body)
    }
}

/// Resolve issue `issue_id` of series `series_id` and open it for delivery.
///
/// # Errors
///
/// - [`ErrorKind::NotFound`] if either id is unknown, the issue belongs to a
///   different series, or its file has gone from disk.
/// - [`ErrorKind::PathViolation`] if the catalogued path resolves outside
///   the library root.
/// - [`ErrorKind::ArchiveCorrupt`] if repackaging fails.
#[instrument(skip(ctx))]
pub async fn deliver(ctx: &Context, series_id: i64, issue_id: i64) -> Result<Delivery> {
    let path = resolve(ctx, series_id, issue_id).await?;
    let metadata = match tokio::fs::metadata(&path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => exn::bail!(ErrorKind::NotFound),
        Err(e) => return Err(e).or_raise(|| ErrorKind::Io),
    };

    if metadata.is_dir() {
        debug!(path = %path.display(), "packing image folder");
        let source = path.clone();
        let body = build_zip(move |file| pack_directory(&source, file)).await?;
        return zipped(file_name(&path), body).await;
    }
    match ArchiveKind::from_path(&path) {
        Some(kind) if !kind.is_client_readable() => {
            debug!(path = %path.display(), %kind, "repackaging archive");
            let source = path.clone();
            let body = build_zip(move |file| kind.repackage(&source, file)).await?;
            let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
            zipped(stem, body).await
        },
        _ => {
            let body = File::open(&path).await.or_raise(|| ErrorKind::Io)?;
            Ok(Delivery {
                filename: file_name(&path),
                content_type: PASSTHROUGH_CONTENT_TYPE,
                length: metadata.len(),
                body,
            })
        },
    }
}

/// The confined absolute path of an issue.
async fn resolve(ctx: &Context, series_id: i64, issue_id: i64) -> Result<PathBuf> {
    let catalog = ctx.catalog();
    let issue = catalog.get_issue(issue_id).await.or_catalog()?.ok_or_raise(|| ErrorKind::NotFound)?;
    if issue.series_id != series_id {
        exn::bail!(ErrorKind::NotFound);
    }
    let series = catalog.get_series(series_id).await.or_catalog()?.ok_or_raise(|| ErrorKind::NotFound)?;
    let library = catalog.get_library(series.library_id).await.or_catalog()?.ok_or_raise(|| ErrorKind::NotFound)?;
    luxi_storage::confine(&issue.path, &library.path).or_raise(|| ErrorKind::PathViolation)
}

/// Run a blocking zip writer against a fresh anonymous temporary file,
/// rewound and ready to read.
async fn build_zip<F>(write: F) -> Result<StdFile>
where
    F: FnOnce(&mut StdFile) -> luxi_archive::error::Result<u64> + Send + 'static,
{
    spawn_blocking(move || {
        let mut file = tempfile::tempfile().or_raise(|| ErrorKind::Io)?;
        let entries = write(&mut file).or_raise(|| ErrorKind::ArchiveCorrupt)?;
        file.seek(SeekFrom::Start(0)).or_raise(|| ErrorKind::Io)?;
        debug!(entries, "packed zip");
        Ok(file)
    })
    .await
    .or_raise(|| ErrorKind::Io)?
}

/// Wrap a packed zip as a delivery named `<basename>.zip`. Folders keep
/// their whole name, dots included; archives lose their extension.
async fn zipped(basename: String, body: StdFile) -> Result<Delivery> {
    let body = File::from_std(body);
    let length = body.metadata().await.or_raise(|| ErrorKind::Io)?.len();
    Ok(Delivery {
        filename: format!("{basename}.zip"),
        content_type: ZIP_CONTENT_TYPE,
        length,
        body,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fixture, write_comic, write_folder};
    use luxi_catalog::{IssueFormat, Library, NewIssue, Series};
    use std::io::Cursor;
    use tokio::io::AsyncReadExt;
    use zip::ZipArchive;

    async fn read_all(delivery: Delivery) -> Vec<u8> {
        let mut buffer = Vec::new();
        delivery.into_reader().read_to_end(&mut buffer).await.unwrap();
        buffer
    }

    async fn catalogue(fixture: &Fixture, path: &Path, format: IssueFormat) -> (Library, Series, i64) {
        let catalog = fixture.ctx.catalog();
        let library = catalog.create_library("Manga", fixture.root()).await.unwrap();
        let series_path = fixture.root().join("Akira");
        let (series, _) = catalog.find_or_create_series(library.id, "Akira", &series_path).await.unwrap();
        let new = NewIssue {
            series_id: series.id,
            path: path.to_path_buf(),
            format,
            volume: 1,
            chapter: 0,
        };
        let (issue, _) = catalog.find_or_create_issue(&new).await.unwrap();
        (library, series, issue.id)
    }

    #[tokio::test]
    async fn test_zip_is_passed_through() {
        let fixture = Fixture::new().await;
        let path = fixture.root().join("Akira/Akira v1.cbz");
        write_comic(&path, 3, &[]);
        let (_, series, issue) = catalogue(&fixture, &path, IssueFormat::Archive(ArchiveKind::Zip)).await;

        let delivery = deliver(&fixture.ctx, series.id, issue).await.unwrap();
        assert_eq!(delivery.filename, "Akira v1.cbz");
        assert_eq!(delivery.content_type, PASSTHROUGH_CONTENT_TYPE);
        assert!(!delivery.is_repackaged());
        assert_eq!(read_all(delivery).await, std::fs::read(&path).unwrap());
        fixture.db.close().await;
    }

    #[tokio::test]
    async fn test_folder_is_packed() {
        let fixture = Fixture::new().await;
        let path = fixture.root().join("Akira/Chapter 1");
        write_folder(&path, 4);
        let (_, series, issue) = catalogue(&fixture, &path, IssueFormat::Folder).await;

        let delivery = deliver(&fixture.ctx, series.id, issue).await.unwrap();
        assert_eq!(delivery.filename, "Chapter 1.zip");
        assert_eq!(delivery.content_type, ZIP_CONTENT_TYPE);
        let length = delivery.length;
        let bytes = read_all(delivery).await;
        assert_eq!(bytes.len() as u64, length);
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["000.png", "001.png", "002.png", "003.png"]);
        fixture.db.close().await;
    }

    #[tokio::test]
    async fn test_dotted_folder_keeps_full_name() {
        let fixture = Fixture::new().await;
        let path = fixture.root().join("Akira/Vol.01");
        write_folder(&path, 2);
        let (_, series, issue) = catalogue(&fixture, &path, IssueFormat::Folder).await;

        let delivery = deliver(&fixture.ctx, series.id, issue).await.unwrap();
        assert_eq!(delivery.filename, "Vol.01.zip");
        assert!(delivery.is_repackaged());
        fixture.db.close().await;
    }

    #[tokio::test]
    async fn test_path_outside_library_is_rejected() {
        let fixture = Fixture::new().await;
        let outside = tempfile::tempdir().unwrap();
        let path = outside.path().join("stolen.cbz");
        write_comic(&path, 1, &[]);
        let (_, series, issue) = catalogue(&fixture, &path, IssueFormat::Archive(ArchiveKind::Zip)).await;
        let err = deliver(&fixture.ctx, series.id, issue).await.unwrap_err();
        assert_eq!(*err, ErrorKind::PathViolation);

        let sneaky = NewIssue {
            series_id: series.id,
            path: fixture.root().join("Akira/../../escape.cbz"),
            format: IssueFormat::Archive(ArchiveKind::Zip),
            volume: 0,
            chapter: 0,
        };
        let (issue, _) = fixture.ctx.catalog().find_or_create_issue(&sneaky).await.unwrap();
        let issue = issue.id;
        let err = deliver(&fixture.ctx, series.id, issue).await.unwrap_err();
        assert_eq!(*err, ErrorKind::PathViolation);
        fixture.db.close().await;
    }

    #[tokio::test]
    async fn test_missing_file_and_wrong_series() {
        let fixture = Fixture::new().await;
        let path = fixture.root().join("Akira/gone.cbz");
        let (_, series, issue) = catalogue(&fixture, &path, IssueFormat::Archive(ArchiveKind::Zip)).await;

        let err = deliver(&fixture.ctx, series.id, issue).await.unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound);
        let err = deliver(&fixture.ctx, series.id + 1, issue).await.unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound);
        let err = deliver(&fixture.ctx, series.id, issue + 1).await.unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound);
        fixture.db.close().await;
    }
}
