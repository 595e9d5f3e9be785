//! Path validation and confinement.
//!
//! Two different questions get asked about paths in a comic library:
//! whether a *relative* path (a listing result, an archive member name) stays
//! inside whatever root it is later joined onto, and whether an *absolute*
//! path pulled from the catalog still lives beneath its library root.
//! [`validate`] answers the first and [`confine`] the second.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Lexically resolve `.` and `..` without touching the filesystem.
///
/// Returns `None` if a `..` would climb above the first component, if a
/// component contains a null byte, or on a Windows prefix.
fn normalize(path: &Path) -> Option<Vec<&OsStr>> {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    return None;
                }
                components.push(s);
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => return None,
            Component::ParentDir => {
                components.pop()?;
            },
        }
    }
    Some(components)
}

/// Validates a relative storage path, ensuring it can't escape the root it is
/// joined onto (no `..` traversal).
///
/// > **Note:** This does **not** normalize backslashes or non-UTF8 bytes.
/// >           Null bytes are explicitly rejected.
///
/// # Returns
/// Returns the normalized path if valid, or [`InvalidPath`](crate::error::ErrorKind::InvalidPath)
/// if invalid.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use luxi_storage::validate_path;
/// assert!(validate_path("OnePiece/OnePiece - v1 c001.cbz").is_ok());
/// assert!(validate_path("a/../001.jpg").is_ok()); // (never leaves the root)
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("a/../../b").is_err());
/// assert!(validate_path("a\0b").is_err());
/// assert_eq!(
///     validate_path("wrong/../Akira/./ch1//001.jpg/").unwrap(),
///     Path::new("Akira/ch1/001.jpg")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    match normalize(path) {
        Some(components) if !components.is_empty() => Ok(components.into_iter().collect()),
        _ => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
    }
}

/// Check that the absolute `path` resolves beneath the absolute `root`.
///
/// Both sides are resolved lexically (symlinks are not followed) and compared
/// component by component, so `/comics-old/x.cbz` is not inside `/comics`.
/// The root itself counts as inside. Returns the normalized absolute path.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use luxi_storage::confine;
/// let root = Path::new("/comics");
/// assert!(confine("/comics/Akira/v1.cbz", root).is_ok());
/// assert!(confine("/comics/Akira/../../etc/passwd", root).is_err());
/// assert!(confine("/comics-old/Akira/v1.cbz", root).is_err());
/// ```
pub fn confine(path: impl AsRef<Path>, root: impl AsRef<Path>) -> Result<PathBuf> {
    let (path, root) = (path.as_ref(), root.as_ref());
    let outside = || ErrorKind::OutsideRoot(path.to_path_buf(), root.to_path_buf());
    if !path.is_absolute() || !root.is_absolute() {
        exn::bail!(outside());
    }
    let (Some(resolved), Some(resolved_root)) = (normalize(path), normalize(root)) else {
        exn::bail!(outside());
    };
    if !resolved.starts_with(&resolved_root) {
        exn::bail!(outside());
    }
    let mut absolute = PathBuf::from(Component::RootDir.as_os_str());
    absolute.extend(resolved);
    Ok(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("OnePiece/OnePiece - v1 c001.cbz", "OnePiece/OnePiece - v1 c001.cbz")]
    #[case("a//b//c", "a/b/c")]
    #[case("a/./b/./c", "a/b/c")]
    #[case("a/b/..", "a")]
    #[case("Akira/", "Akira")]
    #[case("Akira///", "Akira")]
    // Absolute archive member names are re-rooted rather than rejected.
    #[case("/001.jpg", "001.jpg")]
    fn test_valid_paths(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(validate(Path::new(path)).unwrap(), Path::new(expected));
    }

    #[rstest]
    #[case("../etc/passwd")]
    #[case("a/../../b")]
    #[case("..")]
    #[case("../..")]
    #[case("a\0b")]
    #[case("\0")]
    #[case("")]
    #[case(".")]
    #[case("./.")]
    #[case("//")]
    fn test_invalid_paths(#[case] path: &str) {
        assert!(validate(Path::new(path)).is_err());
    }

    #[rstest]
    #[case("/comics/Akira/v1.cbz", "/comics", "/comics/Akira/v1.cbz")]
    #[case("/comics/./Akira//v1.cbz", "/comics/", "/comics/Akira/v1.cbz")]
    #[case("/comics/Akira/../Berserk/v1.cbr", "/comics", "/comics/Berserk/v1.cbr")]
    #[case("/comics", "/comics", "/comics")]
    #[case("/comics/Akira", "/comics/x/..", "/comics/Akira")]
    fn test_confine_inside(#[case] path: &str, #[case] root: &str, #[case] expected: &str) {
        assert_eq!(confine(path, root).unwrap(), Path::new(expected));
    }

    #[rstest]
    #[case("/comics/../etc/passwd", "/comics")]
    #[case("/comics/Akira/../../etc/passwd", "/comics")]
    #[case("/comics-old/Akira/v1.cbz", "/comics")]
    #[case("/elsewhere/v1.cbz", "/comics")]
    #[case("comics/Akira/v1.cbz", "/comics")]
    #[case("/comics/Akira/v1.cbz", "comics")]
    #[case("/../../comics/../x", "/comics")]
    fn test_confine_outside(#[case] path: &str, #[case] root: &str) {
        let err = confine(path, root).unwrap_err();
        assert!(matches!(&*err, ErrorKind::OutsideRoot(..)));
    }
}
