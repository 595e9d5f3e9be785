//! Storage backend trait and implementations.
//!
//! Only the local filesystem is supported, but scanning and asset writing
//! talk to the trait so tests and callers don't care where bytes live.

mod local;

pub use self::local::LocalBackend;
use crate::error::Result;
use crate::models::FileInfo;
use async_trait::async_trait;
use futures::Stream;
use std::path::Path;
use std::pin::Pin;

pub(crate) type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// Unified interface for storage backends.
///
/// # Path Handling
/// All paths are relative to the storage root and are checked with
/// [`validate_path`](crate::validate_path) before anything touches the disk.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use luxi_storage::{backend::StorageBackend, error::Result};
///
/// async fn replace_cover(backend: &dyn StorageBackend, jpeg: &[u8]) -> Result<usize> {
///     let path = Path::new("series/1.jpg");
///     backend.write(path, jpeg).await?;
///     Ok(backend.read(path).await?.len())
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Walk every file beneath the root.
    ///
    /// Files are yielded lazily in depth-first order, with siblings sorted by
    /// name. A directory or entry that can't be read produces an `Err` item
    /// and the walk carries on with whatever is left. Directories themselves
    /// are never yielded.
    ///
    /// # Examples
    ///
    /// ```
    /// use futures::StreamExt;
    /// # use luxi_storage::backend::StorageBackend;
    /// # async fn example(backend: &dyn StorageBackend) {
    /// let mut stream = backend.list_stream();
    /// while let Some(item) = stream.next().await {
    ///     match item {
    ///         Ok(info) => println!("{}: {:?}", info.path.display(), info.extension),
    ///         Err(e) => eprintln!("skipping: {e}"),
    ///     }
    /// }
    /// # }
    /// ```
    fn list_stream(&self) -> FileInfoStream<'_>;

    /// Count the entries (files and directories) directly inside `path`.
    async fn count_entries(&self, path: &Path) -> Result<u64>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write file contents, creating parent directories and overwriting any
    /// existing file.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Delete a file.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn delete(&self, path: &Path) -> Result<()>;
}
