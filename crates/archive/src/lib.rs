//! Comic archive handling with automatic format detection.
//!
//! Wraps the zip, RAR and 7-zip libraries behind a unified [`ArchiveKind`]
//! enum and a single [`Container`] capability, providing:
//!
//! - **Format detection** from file extensions ([`ArchiveKind::from_path`])
//! - **Inspection** of an archive for its page count and first page
//!   ([`inspect`]), reading only the one member it returns
//! - **Repackaging** of directories and foreign archives into zip, the one
//!   container every reader client understands ([`pack_directory`],
//!   [`ArchiveKind::repackage`])
//!
//! Everything here is blocking I/O. Async callers should run it inside
//! [`spawn_blocking`](https://docs.rs/tokio/latest/tokio/task/fn.spawn_blocking.html).

mod backend;
mod construct;
pub mod error;
mod inspect;
mod ops;
mod util;

pub use crate::backend::{Container, Member};
pub use crate::inspect::{Cover, Inspection, inspect, is_image_name};
pub use crate::ops::pack_directory;

/// A supported comic archive format.
///
/// Comic-specific extensions (`.cbz`, `.cbr`, `.cb7`) map onto the
/// underlying container format they are a rename of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    /// Zip (.zip, .cbz)
    Zip,
    /// RAR (.rar, .cbr)
    Rar,
    /// 7-zip (.7z, .cb7)
    SevenZip,
}

#[cfg(test)]
mod tests {
    use crate::ArchiveKind;

    #[test]
    fn only_zip_is_client_readable() {
        assert!(ArchiveKind::Zip.is_client_readable());
        assert!(!ArchiveKind::Rar.is_client_readable());
        assert!(!ArchiveKind::SevenZip.is_client_readable());
    }
}
