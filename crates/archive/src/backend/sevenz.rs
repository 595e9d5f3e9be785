use crate::backend::{Container, Member, extraction_target, write_member};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sevenz_rust::{Password, SevenZReader};
use std::fs::{File, create_dir_all};
use std::io::{self, Cursor, Read};
use std::path::Path;

pub(crate) struct SevenZipContainer {
    reader: SevenZReader<File>,
}

impl SevenZipContainer {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let reader = SevenZReader::open(path, Password::empty()).or_raise(|| ErrorKind::Corrupt)?;
        Ok(Self { reader })
    }
}

impl Container for SevenZipContainer {
    fn members(&mut self) -> Result<Vec<Member>> {
        Ok(self
            .reader
            .archive()
            .files
            .iter()
            .map(|entry| Member {
                name: entry.name().to_string(),
                is_dir: entry.is_directory(),
            })
            .collect())
    }

    fn open_member(&mut self, name: &str) -> Result<Box<dyn Read + '_>> {
        let mut found = None;
        // Solid 7z blocks have to be decoded in order, so entries before the
        // wanted one are drained rather than buffered.
        self.reader
            .for_each_entries(|entry, data| {
                if !entry.is_directory() && entry.name() == name {
                    let mut buf = Vec::new();
                    data.read_to_end(&mut buf)?;
                    found = Some(buf);
                    return Ok(false);
                }
                io::copy(data, &mut io::sink())?;
                Ok(true)
            })
            .or_raise(|| ErrorKind::Corrupt)?;
        match found {
            Some(buf) => Ok(Box::new(Cursor::new(buf))),
            None => exn::bail!(ErrorKind::MemberNotFound(name.to_string())),
        }
    }

    fn extract_all(&mut self, destination: &Path) -> Result<u64> {
        let mut written = 0;
        let mut failure = None;
        self.reader
            .for_each_entries(|entry, data| {
                let Some(target) = extraction_target(destination, entry.name()) else {
                    io::copy(data, &mut io::sink())?;
                    return Ok(true);
                };
                let outcome = if entry.is_directory() {
                    create_dir_all(&target).or_raise(|| ErrorKind::Io)
                } else {
                    write_member(&target, data)
                };
                match outcome {
                    Ok(()) => {
                        written += u64::from(!entry.is_directory());
                        Ok(true)
                    },
                    Err(e) => {
                        failure = Some(e);
                        Ok(false)
                    },
                }
            })
            .or_raise(|| ErrorKind::Corrupt)?;
        match failure {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }
}
