//! One [`Container`] implementation per archive format.
//!
//! Every format library has its own idea of how to walk an archive: zip
//! gives random access by index, RAR is a forward-only cursor over headers,
//! and 7-zip hands out entries through a callback. This module hides all of
//! that behind the same three operations so that inspection and repackaging
//! are written once.

mod rar;
mod sevenz;
mod zip;

use crate::ArchiveKind;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::{File, create_dir_all};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{instrument, warn};

/// A single entry inside an archive, as listed by [`Container::members`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Name as stored in the archive (forward-slash separated, may be nested).
    pub name: String,
    pub is_dir: bool,
}

/// Capability shared by every supported archive format.
pub trait Container {
    /// List every entry in archive order, directories included.
    fn members(&mut self) -> Result<Vec<Member>>;

    /// Open a single member for reading without unpacking the rest of the
    /// archive. Returns [`MemberNotFound`](ErrorKind::MemberNotFound) if no
    /// file entry carries that exact name.
    fn open_member(&mut self, name: &str) -> Result<Box<dyn Read + '_>>;

    /// Unpack every file member beneath `destination`, returning the number
    /// of files written. Members whose names would escape `destination` are
    /// skipped with a warning.
    fn extract_all(&mut self, destination: &Path) -> Result<u64>;
}

impl ArchiveKind {
    /// Open the archive at `path` with the backend for this format.
    #[instrument(fields(format = %self))]
    pub fn open(&self, path: &Path) -> Result<Box<dyn Container>> {
        Ok(match self {
            ArchiveKind::Zip => Box::new(self::zip::ZipContainer::open(path)?),
            ArchiveKind::Rar => Box::new(self::rar::RarContainer::open(path)?),
            ArchiveKind::SevenZip => Box::new(self::sevenz::SevenZipContainer::open(path)?),
        })
    }
}

/// Resolve where a member should land beneath `destination`, or `None` if
/// its name is unusable (absolute escapes, `..` past the root, null bytes).
pub(crate) fn extraction_target(destination: &Path, name: &str) -> Option<PathBuf> {
    match luxi_storage::validate_path(name) {
        Ok(relative) => Some(destination.join(relative)),
        Err(_) => {
            warn!(member = name, "skipping archive member that escapes the extraction directory");
            None
        },
    }
}

/// Stream one member's bytes to `target`, creating parent directories.
pub(crate) fn write_member(target: &Path, reader: &mut dyn Read) -> Result<()> {
    if let Some(parent) = target.parent() {
        create_dir_all(parent).or_raise(|| ErrorKind::Io)?;
    }
    let mut file = File::create(target).or_raise(|| ErrorKind::Io)?;
    io::copy(reader, &mut file).or_raise(|| ErrorKind::Corrupt)?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use zip::write::SimpleFileOptions;

    /// Write a zip with the given `(name, contents)` entries. Names ending in
    /// `/` become directory entries.
    pub(crate) fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default();
        for (name, contents) in entries {
            if name.ends_with('/') {
                writer.add_directory(name.to_string(), options).unwrap();
            } else {
                writer.start_file(name.to_string(), options).unwrap();
                writer.write_all(contents).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    /// Write a 7z holding the given `(name, contents)` files. Parent
    /// directories become entries of their own, as does the archive root.
    pub(crate) fn write_7z(path: &Path, files: &[(&str, &[u8])]) {
        let staging = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            let target = staging.path().join(name);
            std::fs::create_dir_all(target.parent().unwrap()).unwrap();
            std::fs::write(target, contents).unwrap();
        }
        sevenz_rust::compress_to_path(staging.path(), path).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("001.jpg", Some("001.jpg"))]
    #[case("chapter/001.jpg", Some("chapter/001.jpg"))]
    #[case("/001.jpg", Some("001.jpg"))]
    #[case("../001.jpg", None)]
    #[case("a/../../001.jpg", None)]
    #[case("", None)]
    fn test_extraction_target(#[case] name: &str, #[case] expected: Option<&str>) {
        let destination = Path::new("/tmp/extract");
        assert_eq!(extraction_target(destination, name), expected.map(|e| destination.join(e)));
    }

    #[test]
    fn open_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.cbz");
        std::fs::write(&path, b"definitely not a zip").unwrap();
        let err = ArchiveKind::Zip.open(&path).err().unwrap();
        assert_eq!(*err, ErrorKind::Corrupt);
    }
}
