//! The ingestion and delivery core of a comic library.
//!
//! - [`scan`] walks a library root, classifies what it finds, and brings the
//!   catalog up to date with it: one series per top-level directory, one issue
//!   per archive or per folder of loose images.
//! - [`stream`] hands an issue back to a reader as bytes, repackaging it into
//!   a zip when its native form isn't one readers understand.
//! - [`manage`] is everything else a front end needs: creating libraries,
//!   reading progress, deleting series and issues.
//!
//! Everything shares a [`Context`].

pub mod error;
pub mod manage;
pub mod scan;
pub mod stream;

use luxi_catalog::Repository;
use luxi_lookup::MetadataLookup;
use luxi_storage::BackendHandle;
use luxi_thumbnail::Thumbnailer;
use std::sync::Arc;
use std::time::Duration;

/// Pause after each metadata enrichment unless configured otherwise.
pub const DEFAULT_LOOKUP_DELAY: Duration = Duration::from_secs(1);

/// Handles to everything a scan or a request needs.
///
/// Cheap to clone; a scan running in the background owns its own copy.
#[derive(Clone)]
pub struct Context {
    catalog: Repository,
    assets: BackendHandle,
    thumbnailer: Thumbnailer,
    lookup: Option<Arc<dyn MetadataLookup>>,
    lookup_delay: Duration,
}

impl Context {
    /// A context without metadata enrichment. `assets` is where previews and
    /// downloaded covers are written.
    pub fn new(catalog: Repository, assets: BackendHandle, thumbnailer: Thumbnailer) -> Self {
        Self {
            catalog,
            assets,
            thumbnailer,
            lookup: None,
            lookup_delay: DEFAULT_LOOKUP_DELAY,
        }
    }

    /// Enrich newly created series through `lookup`, pausing for `delay`
    /// after each one.
    pub fn with_lookup(mut self, lookup: Arc<dyn MetadataLookup>, delay: Duration) -> Self {
        self.lookup = Some(lookup);
        self.lookup_delay = delay;
        self
    }

    pub fn catalog(&self) -> &Repository {
        &self.catalog
    }

    pub fn assets(&self) -> &BackendHandle {
        &self.assets
    }

    pub fn thumbnailer(&self) -> Thumbnailer {
        self.thumbnailer
    }

    pub(crate) fn lookup(&self) -> Option<&dyn MetadataLookup> {
        self.lookup.as_deref()
    }

    pub(crate) fn lookup_delay(&self) -> Duration {
        self.lookup_delay
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures: an in-memory catalog, a temporary library and assets
    //! directory, and a scripted metadata source.

    use super::*;
    use async_trait::async_trait;
    use image::{ImageFormat, Rgb, RgbImage};
    use luxi_catalog::Database;
    use luxi_extract::models::RawMetadata;
    use luxi_lookup::error::{ErrorKind as LookupErrorKind, Result as LookupResult};
    use luxi_storage::LocalBackend;
    use std::fs::{self, File};
    use std::io::{Cursor, Write};
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    pub(crate) struct Fixture {
        pub db: Database,
        pub ctx: Context,
        pub library: TempDir,
        pub assets: TempDir,
    }

    impl Fixture {
        pub async fn new() -> Self {
            let db = Database::connect_in_memory().await.unwrap();
            let library = tempfile::tempdir().unwrap();
            let assets = tempfile::tempdir().unwrap();
            let backend: BackendHandle = Arc::new(LocalBackend::new(assets.path()).unwrap());
            let ctx = Context::new(Repository::from(&db), backend, Thumbnailer::new(16).unwrap());
            Self { db, ctx, library, assets }
        }

        pub fn with_lookup(mut self, lookup: Arc<dyn MetadataLookup>) -> Self {
            self.ctx = self.ctx.with_lookup(lookup, Duration::ZERO);
            self
        }

        pub fn root(&self) -> &Path {
            self.library.path()
        }
    }

    /// A tiny PNG, 8 pixels wide and 4 tall.
    pub(crate) fn png() -> Vec<u8> {
        let image = RgbImage::from_pixel(8, 4, Rgb([200, 30, 30]));
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    /// Write a zip at `path` (creating parent directories) holding `pages`
    /// images plus any extra `(name, bytes)` members.
    pub(crate) fn write_comic(path: &Path, pages: usize, extra: &[(&str, &[u8])]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        let image = png();
        for page in (0..pages).rev() {
            writer.start_file(format!("{page:03}.png"), SimpleFileOptions::default()).unwrap();
            writer.write_all(&image).unwrap();
        }
        for (name, data) in extra {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    /// Write a folder of `pages` loose PNG images.
    pub(crate) fn write_folder(dir: &Path, pages: usize) {
        fs::create_dir_all(dir).unwrap();
        let image = png();
        for page in 0..pages {
            fs::write(dir.join(format!("{page:03}.png")), &image).unwrap();
        }
    }

    /// Answers every search with the same canned result and counts calls.
    #[derive(Default)]
    pub(crate) struct ScriptedLookup {
        pub result: Option<String>,
        pub image: Option<Vec<u8>>,
        pub searches: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MetadataLookup for ScriptedLookup {
        async fn find_series(&self, name: &str) -> LookupResult<Option<RawMetadata>> {
            self.searches.lock().unwrap().push(name.to_string());
            Ok(self.result.clone().map(RawMetadata::new))
        }

        async fn fetch_image(&self, _url: &str) -> LookupResult<Vec<u8>> {
            match &self.image {
                Some(image) => Ok(image.clone()),
                None => exn::bail!(LookupErrorKind::Status(404)),
            }
        }
    }
}
