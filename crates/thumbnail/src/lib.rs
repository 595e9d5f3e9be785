pub mod error;
mod format;
mod render;

use crate::error::{ErrorKind, Result};
pub use crate::format::source_format;
pub use crate::render::Thumbnail;
use std::path::PathBuf;

/// Preview width in pixels unless configured otherwise.
pub const DEFAULT_WIDTH: u32 = 480;

/// Resizes page images into fixed-width JPEG previews.
#[derive(Debug, Clone, Copy)]
pub struct Thumbnailer {
    width: u32,
}
impl Thumbnailer {
    pub fn new(width: u32) -> Result<Self> {
        if width == 0 {
            exn::bail!(ErrorKind::InvalidWidth);
        }
        Ok(Self { width })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Where the preview for issue `id` lives, relative to the assets root.
    /// The same id always maps to the same file so rescans overwrite.
    pub fn preview_path(id: i64) -> PathBuf {
        PathBuf::from("previews").join(format!("{id}_preview.jpg"))
    }
}
impl Default for Thumbnailer {
    fn default() -> Self {
        Self { width: DEFAULT_WIDTH }
    }
}
impl TryFrom<u32> for Thumbnailer {
    type Error = error::Error;
    fn try_from(width: u32) -> std::result::Result<Self, Self::Error> {
        Thumbnailer::new(width)
    }
}
