use crate::ArchiveKind;
use crate::error::{Error, ErrorKind};
use std::{path::Path, str::FromStr};

impl FromStr for ArchiveKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from_extension(s) {
            Some(kind) => Ok(kind),
            None => exn::bail!(ErrorKind::UnsupportedFormat(s.to_string())),
        }
    }
}

impl ArchiveKind {
    /// Detect the archive format from a bare extension (no leading dot),
    /// case-insensitively.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "zip" | "cbz" => Some(ArchiveKind::Zip),
            "rar" | "cbr" => Some(ArchiveKind::Rar),
            "7z" | "cb7" => Some(ArchiveKind::SevenZip),
            _ => None,
        }
    }

    /// Detect the archive format from a file extension.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}
