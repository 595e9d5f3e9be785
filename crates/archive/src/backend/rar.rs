use crate::backend::{Container, Member, extraction_target};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::{create_dir_all, write};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use unrar::Archive;

/// RAR archives are a forward-only cursor over headers, so every operation
/// re-opens the file rather than holding a handle.
pub(crate) struct RarContainer {
    path: PathBuf,
}

impl RarContainer {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        // Listing up front surfaces a corrupt archive at open time, the same
        // as the other backends.
        Archive::new(path).open_for_listing().or_raise(|| ErrorKind::Corrupt)?;
        Ok(Self { path: path.to_path_buf() })
    }
}

impl Container for RarContainer {
    fn members(&mut self) -> Result<Vec<Member>> {
        let listing = Archive::new(&self.path).open_for_listing().or_raise(|| ErrorKind::Corrupt)?;
        let mut members = Vec::new();
        for header in listing {
            let header = header.or_raise(|| ErrorKind::Corrupt)?;
            members.push(Member {
                name: header.filename.to_string_lossy().into_owned(),
                is_dir: header.is_directory(),
            });
        }
        Ok(members)
    }

    fn open_member(&mut self, name: &str) -> Result<Box<dyn Read + '_>> {
        let mut archive = Archive::new(&self.path).open_for_processing().or_raise(|| ErrorKind::Corrupt)?;
        while let Some(header) = archive.read_header().or_raise(|| ErrorKind::Corrupt)? {
            let entry = header.entry();
            archive = if entry.is_file() && entry.filename.to_string_lossy() == name {
                // unrar only hands out whole members; this is still one
                // member's worth of memory, never the whole archive.
                let (data, _) = header.read().or_raise(|| ErrorKind::Corrupt)?;
                return Ok(Box::new(Cursor::new(data)));
            } else {
                header.skip().or_raise(|| ErrorKind::Corrupt)?
            };
        }
        exn::bail!(ErrorKind::MemberNotFound(name.to_string()))
    }

    fn extract_all(&mut self, destination: &Path) -> Result<u64> {
        let mut archive = Archive::new(&self.path).open_for_processing().or_raise(|| ErrorKind::Corrupt)?;
        let mut written = 0;
        while let Some(header) = archive.read_header().or_raise(|| ErrorKind::Corrupt)? {
            let entry = header.entry();
            let is_dir = entry.is_directory();
            let target = extraction_target(destination, &entry.filename.to_string_lossy());
            archive = match target {
                Some(target) if is_dir => {
                    create_dir_all(&target).or_raise(|| ErrorKind::Io)?;
                    header.skip().or_raise(|| ErrorKind::Corrupt)?
                },
                Some(target) => {
                    let (data, next) = header.read().or_raise(|| ErrorKind::Corrupt)?;
                    if let Some(parent) = target.parent() {
                        create_dir_all(parent).or_raise(|| ErrorKind::Io)?;
                    }
                    write(&target, data).or_raise(|| ErrorKind::Io)?;
                    written += 1;
                    next
                },
                None => header.skip().or_raise(|| ErrorKind::Corrupt)?,
            };
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArchiveKind;

    #[test]
    fn open_rejects_non_rar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.cbr");
        std::fs::write(&path, b"PK\x03\x04 this is a zip pretending").unwrap();
        let err = RarContainer::open(&path).err().unwrap();
        assert_eq!(*err, ErrorKind::Corrupt);
    }

    #[test]
    fn corrupt_rar_fails_inspection_and_repackaging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Berserk v1.cbr");
        std::fs::write(&path, b"\x00\x01 nothing like a rar header").unwrap();

        let err = crate::inspect(ArchiveKind::Rar, &path).unwrap_err();
        assert_eq!(*err, ErrorKind::Corrupt);
        let err = ArchiveKind::Rar.repackage(&path, Cursor::new(Vec::new())).unwrap_err();
        assert_eq!(*err, ErrorKind::Corrupt);
    }

    #[test]
    fn missing_rar_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let err = RarContainer::open(&dir.path().join("gone.cbr")).err().unwrap();
        assert_eq!(*err, ErrorKind::Corrupt);
    }
}
