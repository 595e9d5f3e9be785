use crate::backend::{Container, Member, extraction_target, write_member};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs::{File, create_dir_all};
use std::io::{BufReader, Read};
use std::path::Path;
use zip::ZipArchive;
use zip::result::ZipError;

pub(crate) struct ZipContainer {
    archive: ZipArchive<BufReader<File>>,
}

impl ZipContainer {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).or_raise(|| ErrorKind::Io)?;
        let archive = ZipArchive::new(BufReader::new(file)).or_raise(|| ErrorKind::Corrupt)?;
        Ok(Self { archive })
    }
}

impl Container for ZipContainer {
    fn members(&mut self) -> Result<Vec<Member>> {
        let mut members = Vec::with_capacity(self.archive.len());
        for index in 0..self.archive.len() {
            // Raw access reads the central directory only; nothing is inflated.
            let entry = self.archive.by_index_raw(index).or_raise(|| ErrorKind::Corrupt)?;
            members.push(Member {
                name: entry.name().to_string(),
                is_dir: entry.is_dir(),
            });
        }
        Ok(members)
    }

    fn open_member(&mut self, name: &str) -> Result<Box<dyn Read + '_>> {
        let entry = match self.archive.by_name(name) {
            Err(ZipError::FileNotFound) => exn::bail!(ErrorKind::MemberNotFound(name.to_string())),
            other => other.or_raise(|| ErrorKind::Corrupt)?,
        };
        Ok(Box::new(entry))
    }

    fn extract_all(&mut self, destination: &Path) -> Result<u64> {
        let mut written = 0;
        for index in 0..self.archive.len() {
            let mut entry = self.archive.by_index(index).or_raise(|| ErrorKind::Corrupt)?;
            let Some(target) = extraction_target(destination, entry.name()) else {
                continue;
            };
            if entry.is_dir() {
                create_dir_all(&target).or_raise(|| ErrorKind::Io)?;
                continue;
            }
            write_member(&target, &mut entry)?;
            written += 1;
        }
        Ok(written)
    }
}
