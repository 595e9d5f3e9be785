//! Repackaging into zip.

use crate::ArchiveKind;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::File;
use std::io::{self, Seek, Write};
use std::path::Path;
use tracing::{debug, instrument};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Zip every file beneath `source` into `output`, one entry per file, named
/// by its forward-slash path relative to `source`. Siblings are written in
/// name order so the result is deterministic. Symlinks are not followed.
/// Returns the entry count.
#[instrument(skip(output))]
pub fn pack_directory<W: Write + Seek>(source: &Path, output: W) -> Result<u64> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(output);
    let mut count = 0;
    for entry in WalkDir::new(source).follow_links(false).sort_by_file_name() {
        let entry = entry.or_raise(|| ErrorKind::Io)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(source).or_raise(|| ErrorKind::Io)?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        writer.start_file(name, options).or_raise(|| ErrorKind::Io)?;
        let mut input = File::open(entry.path()).or_raise(|| ErrorKind::Io)?;
        io::copy(&mut input, &mut writer).or_raise(|| ErrorKind::Io)?;
        count += 1;
    }
    writer.finish().or_raise(|| ErrorKind::Io)?;
    debug!(entries = count, "packed directory");
    Ok(count)
}

impl ArchiveKind {
    /// Convert the archive at `path` into a zip written to `output`.
    ///
    /// The archive is fully unpacked into a scratch directory first, which
    /// is removed when this returns, on success or failure.
    #[instrument(skip(output), fields(format = %self))]
    pub fn repackage<W: Write + Seek>(&self, path: &Path, output: W) -> Result<u64> {
        let staging = tempfile::tempdir().or_raise(|| ErrorKind::Io)?;
        let extracted = self.open(path)?.extract_all(staging.path())?;
        debug!(extracted, "unpacked archive for repackaging");
        pack_directory(staging.path(), output)
    }
}
