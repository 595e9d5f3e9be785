//! Page count and cover extraction.

use crate::ArchiveKind;
use crate::backend::Container;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::io::Read;
use std::path::Path;
use tracing::{debug, instrument};

/// Member extensions treated as pages when looking for a cover.
const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "webp", "gif", "bmp", "avif"];

/// Whether an archive member name looks like a raster image.
#[must_use]
pub fn is_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// The first image member of an archive, fully read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cover {
    /// Member name inside the archive, used for format sniffing.
    pub name: String,
    pub data: Vec<u8>,
}
impl Cover {
    /// Lower-cased extension of the member name.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    /// Number of non-directory members, whether or not they are images.
    pub page_count: u64,
    pub cover: Option<Cover>,
}

/// Open an archive, count its pages and pull out its cover.
///
/// Members are sorted by byte order (so `p10.jpg` sorts before `p2.jpg`) and
/// the first one with an image extension becomes the cover. Only that member
/// is decompressed.
#[instrument(fields(format = %kind))]
pub fn inspect(kind: ArchiveKind, path: &Path) -> Result<Inspection> {
    let mut container = kind.open(path)?;
    inspect_container(container.as_mut())
}

fn inspect_container(container: &mut dyn Container) -> Result<Inspection> {
    let mut names: Vec<String> = container
        .members()?
        .into_iter()
        .filter(|member| !member.is_dir)
        .map(|member| member.name)
        .collect();
    names.sort_unstable();
    let page_count = names.len() as u64;

    let cover = match names.into_iter().find(|name| is_image_name(name)) {
        Some(name) => {
            let mut data = Vec::new();
            container
                .open_member(&name)?
                .read_to_end(&mut data)
                .or_raise(|| ErrorKind::Corrupt)?;
            Some(Cover { name, data })
        },
        None => None,
    };
    debug!(page_count, cover = cover.as_ref().map(|c| c.name.as_str()), "inspected archive");
    Ok(Inspection { page_count, cover })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fixtures::write_zip;
    use rstest::rstest;

    #[rstest]
    #[case("001.jpg", true)]
    #[case("pages/001.JPEG", true)]
    #[case("cover.webp", true)]
    #[case("scan.avif", true)]
    #[case("ComicInfo.xml", false)]
    #[case("jpg", false)]
    #[case("folder/", false)]
    fn test_is_image_name(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_image_name(name), expected);
    }

    #[test]
    fn twenty_pages_cover_is_first_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("OnePiece - v1 c001.cbz");
        let names: Vec<String> = (1..=20).rev().map(|n| format!("{n:03}.jpg")).collect();
        let entries: Vec<(&str, &[u8])> = names.iter().map(|n| (n.as_str(), n.as_bytes())).collect();
        write_zip(&path, &entries);

        let inspection = inspect(ArchiveKind::Zip, &path).unwrap();
        assert_eq!(inspection.page_count, 20);
        let cover = inspection.cover.unwrap();
        assert_eq!(cover.name, "001.jpg");
        assert_eq!(cover.data, b"001.jpg");
        assert_eq!(cover.extension().as_deref(), Some("jpg"));
    }

    #[test]
    fn directories_are_not_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested.cbz");
        write_zip(&path, &[("ch1/", b""), ("ch1/b.png", b"b"), ("ch1/a.png", b"a"), ("info.txt", b"x")]);

        let inspection = inspect(ArchiveKind::Zip, &path).unwrap();
        assert_eq!(inspection.page_count, 3);
        assert_eq!(inspection.cover.unwrap().name, "ch1/a.png");
    }

    #[test]
    fn byte_order_not_natural_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("order.cbz");
        write_zip(&path, &[("p2.jpg", b"2"), ("p10.jpg", b"10"), ("a.jpg", b"a"), ("B.jpg", b"B")]);

        let inspection = inspect(ArchiveKind::Zip, &path).unwrap();
        // Upper case sorts before lower case, and "p10" before "p2".
        assert_eq!(inspection.cover.unwrap().name, "B.jpg");
    }

    #[test]
    fn page_count_without_any_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text.cbz");
        write_zip(&path, &[("readme.txt", b"hi"), ("ComicInfo.xml", b"<x/>")]);

        let inspection = inspect(ArchiveKind::Zip, &path).unwrap();
        assert_eq!(inspection.page_count, 2);
        assert!(inspection.cover.is_none());
    }

    #[test]
    fn corrupt_archive_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.cbz");
        std::fs::write(&path, b"PK\x03\x04 truncated").unwrap();
        assert!(inspect(ArchiveKind::Zip, &path).is_err());
    }
}
