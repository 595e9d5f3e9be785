//! Local filesystem storage backend.
//!
//! Files are accessed beneath a configured root directory using `tokio::fs`
//! for async I/O.

use crate::backend::FileInfoStream;
use crate::error::ErrorKind;
use crate::{FileInfo, StorageBackend, error::Result, path::validate as validate_path};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use std::ffi::OsStr;
use std::fs::{Metadata, create_dir_all as sync_create_dir};
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};

enum WalkEntry {
    File(FileInfo),
    Descend(PathBuf),
    Skip,
}
impl WalkEntry {
    fn name(&self) -> Option<&OsStr> {
        match self {
            WalkEntry::File(info) => info.path.file_name(),
            WalkEntry::Descend(dir) => dir.file_name(),
            WalkEntry::Skip => None,
        }
    }
}

/// Local filesystem storage backend.
///
/// # Examples
///
/// ```no_run
/// use luxi_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let assets = LocalBackend::new("/var/lib/luxi/assets")?;
/// let library = LocalBackend::existing("/srv/manga")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    root: PathBuf,
}
impl LocalBackend {
    /// Create a backend rooted at an absolute directory, creating the
    /// directory if it doesn't exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute or is not a directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            // Use non-async here; it only happens once at startup and it's not
            // worth the hassle of making the constructor async.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }
        Ok(Self { root })
    }

    /// Create a backend over an absolute directory that must already exist.
    ///
    /// Used for library roots, which should never be silently recreated.
    pub fn existing(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if !root.is_dir() {
            exn::bail!(ErrorKind::NotFound(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the absolute path for a relative storage path.
    ///
    /// Validates the path and joins it with the root directory.
    pub fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    /// Convert an absolute path back to a relative storage path.
    pub fn relative_path(&self, absolute: impl AsRef<Path>) -> Result<PathBuf> {
        let absolute = absolute.as_ref();
        if !absolute.is_absolute() {
            exn::bail!(ErrorKind::BackendError(format!(
                "attempting to get relative path of non-absolute path `{:?}`",
                absolute
            )))
        }
        let relative = absolute.strip_prefix(&self.root).or_raise(|| {
            ErrorKind::BackendError(format!("path `{:?}` is not within root `{:?}`", absolute, self.root))
        })?;
        // Validate path will also normalize it.
        validate_path(relative)
    }

    /// Build the [`FileInfo`] the walk yields for a regular file.
    fn metadata(path: &Path, metadata: Metadata) -> Result<FileInfo> {
        let modified = metadata.modified().map_err(ErrorKind::Io)?.into();
        Ok(FileInfo::new(path, metadata.len(), modified))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    /// Helper so that the stream loop, where `?` isn't available, only has to
    /// deal with one error site per entry.
    async fn process_entry(&self, entry: DirEntry) -> Result<WalkEntry> {
        let path = entry.path();
        let metadata = entry.metadata().await.map_err(|e| Self::map_io_error(e, &path))?;
        if metadata.is_dir() {
            return Ok(WalkEntry::Descend(path));
        }
        if metadata.is_file() {
            let relative = self.relative_path(&path)?;
            return Ok(WalkEntry::File(Self::metadata(&relative, metadata)?));
        }
        // Note: silently drop what is most likely a symlink.
        Ok(WalkEntry::Skip)
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn list_stream(&self) -> FileInfoStream<'_> {
        // Pending work, popped from the end. Each directory's children are
        // pushed in reverse name order so that they come back out sorted.
        let mut stack = vec![WalkEntry::Descend(self.root.clone())];

        Box::pin(stream! {
            'dirs: while let Some(next) = stack.pop() {
                let current = match next {
                    WalkEntry::File(info) => {
                        yield Ok(info);
                        continue 'dirs;
                    },
                    WalkEntry::Descend(dir) => dir,
                    WalkEntry::Skip => continue 'dirs,
                };
                let mut entries = match fs::read_dir(&current).await {
                    Ok(entries) => entries,
                    // A directory removed mid-walk is an empty directory.
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue 'dirs,
                    Err(err) => {
                        yield Err(exn::Exn::from(Self::map_io_error(err, &current)));
                        continue 'dirs;
                    }
                };

                let mut children = Vec::new();
                'entries: loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break 'entries,
                        Err(e) => { yield Err(exn::Exn::from(Self::map_io_error(e, &current))); break 'entries; },
                    };
                    match self.process_entry(entry).await {
                        Ok(WalkEntry::Skip) => {},
                        Ok(child) => children.push(child),
                        Err(e) => yield Err(e),
                    };
                }
                children.sort_by(|a, b| b.name().cmp(&a.name()));
                stack.extend(children);
            }
        })
    }

    async fn count_entries(&self, path: &Path) -> Result<u64> {
        let abs_path = match path.as_os_str().is_empty() {
            true => self.root.clone(),
            false => self.absolute_path(path)?,
        };
        let mut entries = fs::read_dir(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?;
        let mut count = 0;
        while entries.next_entry().await.map_err(ErrorKind::Io)?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        if let Some(parent) = abs_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, path))?;
        }
        Ok(fs::write(&abs_path, data).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::remove_file(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }
}
