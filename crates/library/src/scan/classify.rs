use luxi_archive::ArchiveKind;
use luxi_storage::FileInfo;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Directory names (anywhere in a path) that hold reader or tagger data
/// rather than comics. Matched case-insensitively.
pub const RESERVED_NAMES: &[&str] = &[".yacreaderlibrary", "cover", "covers"];

/// Extensions that turn a folder into an issue.
pub const LOOSE_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// What to do with one walked file. Paths are relative to the library root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Skip(SkipReason),
    /// The file is itself an issue.
    Archive {
        series: String,
        path: PathBuf,
        kind: ArchiveKind,
    },
    /// The file's directory is an issue. `image` is the page that triggered
    /// it, used for the preview.
    Folder {
        series: String,
        directory: PathBuf,
        image: PathBuf,
    },
}

impl Classification {
    pub fn series(&self) -> Option<&str> {
        match self {
            Self::Skip(_) => None,
            Self::Archive { series, .. } | Self::Folder { series, .. } => Some(series),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum SkipReason {
    #[display("inside a reserved directory")]
    Reserved,
    /// Files directly under the root have no series directory.
    #[display("not inside a series directory")]
    NoSeries,
    #[display("directory already catalogued this scan")]
    AlreadySeen,
    #[display("not a comic archive or page image")]
    Unsupported,
}

/// Classifies the files of one scan, remembering which image directories it
/// has already handed out so sibling pages collapse into a single issue.
///
/// The seen-set lives as long as the classifier and is not persisted: an
/// interrupted scan simply starts over, and the catalog's path uniqueness
/// keeps that from creating duplicates.
#[derive(Debug, Default)]
pub struct Classifier {
    seen: HashSet<PathBuf>,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&mut self, file: &FileInfo) -> Classification {
        let segments: Vec<&str> = file
            .path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();
        if segments.iter().any(|s| is_reserved(s)) {
            return Classification::Skip(SkipReason::Reserved);
        }
        let [series, .., _] = segments.as_slice() else {
            return Classification::Skip(SkipReason::NoSeries);
        };
        let series = (*series).to_string();
        let extension = file.extension.as_deref().unwrap_or_default();

        if let Some(kind) = ArchiveKind::from_extension(extension) {
            return Classification::Archive { series, path: file.path.clone(), kind };
        }
        if LOOSE_IMAGE_EXTENSIONS.contains(&extension) {
            let directory = file.path.parent().map(Path::to_path_buf).unwrap_or_default();
            if !self.seen.insert(directory.clone()) {
                return Classification::Skip(SkipReason::AlreadySeen);
            }
            return Classification::Folder { series, directory, image: file.path.clone() };
        }
        Classification::Skip(SkipReason::Unsupported)
    }
}

fn is_reserved(segment: &str) -> bool {
    RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::OffsetDateTime;

    fn file(path: &str) -> FileInfo {
        FileInfo::new(path, 0, OffsetDateTime::UNIX_EPOCH)
    }

    #[rstest]
    #[case("OnePiece/OnePiece - v1 c001.cbz", ArchiveKind::Zip)]
    #[case("Akira/Akira v01.CBR", ArchiveKind::Rar)]
    #[case("Akira/extras/Akira v01.7z", ArchiveKind::SevenZip)]
    fn test_archives(#[case] path: &str, #[case] kind: ArchiveKind) {
        let series = path.split('/').next().unwrap().to_string();
        assert_eq!(
            Classifier::new().classify(&file(path)),
            Classification::Archive { series, path: PathBuf::from(path), kind }
        );
    }

    #[rstest]
    #[case("Akira/.yacreaderlibrary/library.ydb")]
    #[case("Akira/Covers/001.jpg")]
    #[case("Akira/cover/001.jpg")]
    #[case("COVERS/Akira/v1.cbz")]
    fn test_reserved(#[case] path: &str) {
        assert_eq!(Classifier::new().classify(&file(path)), Classification::Skip(SkipReason::Reserved));
    }

    #[rstest]
    #[case("loose.cbz", SkipReason::NoSeries)]
    #[case("Akira/notes.txt", SkipReason::Unsupported)]
    #[case("Akira/page.gif", SkipReason::Unsupported)]
    fn test_skipped(#[case] path: &str, #[case] reason: SkipReason) {
        assert_eq!(Classifier::new().classify(&file(path)), Classification::Skip(reason));
    }

    #[test]
    fn test_sibling_images_collapse() {
        let mut classifier = Classifier::new();
        assert_eq!(
            classifier.classify(&file("Akira/Chapter 12/001.jpg")),
            Classification::Folder {
                series: "Akira".to_string(),
                directory: PathBuf::from("Akira/Chapter 12"),
                image: PathBuf::from("Akira/Chapter 12/001.jpg"),
            }
        );
        assert_eq!(
            classifier.classify(&file("Akira/Chapter 12/002.png")),
            Classification::Skip(SkipReason::AlreadySeen)
        );
        assert!(matches!(classifier.classify(&file("Akira/Chapter 13/001.jpg")), Classification::Folder { .. }));

        // A fresh scan starts with a fresh seen-set.
        assert!(matches!(
            Classifier::new().classify(&file("Akira/Chapter 12/002.png")),
            Classification::Folder { .. }
        ));
    }
}
