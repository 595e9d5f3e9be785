use crate::error::{ErrorKind, Result};
use crate::{Thumbnailer, format::source_format};
use exn::{OptionExt, ResultExt};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::{debug, instrument};

/// An encoded JPEG preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

impl Thumbnailer {
    /// Target dimensions for a source of `width` x `height`: the configured
    /// width, and a height that keeps the aspect ratio (truncated, but never
    /// below one pixel).
    #[must_use]
    pub fn target_size(&self, width: u32, height: u32) -> (u32, u32) {
        let scaled = u64::from(self.width) * u64::from(height) / u64::from(width.max(1));
        (self.width, u32::try_from(scaled).unwrap_or(u32::MAX).max(1))
    }

    /// Decode `data` (format chosen by `extension`), resize it with
    /// nearest-neighbour sampling and encode the result as JPEG.
    #[instrument(skip(self, data), fields(size = data.len(), width = self.width))]
    pub fn render(&self, data: &[u8], extension: &str) -> Result<Thumbnail> {
        let format = source_format(extension).ok_or_raise(|| ErrorKind::UnsupportedFormat(extension.to_string()))?;
        let source = image::load_from_memory_with_format(data, format).or_raise(|| ErrorKind::Decode)?;
        let (width, height) = self.target_size(source.width(), source.height());
        // Nearest-neighbour: previews are small and scans are long.
        let resized = source.resize_exact(width, height, FilterType::Nearest);

        let mut jpeg = Vec::new();
        DynamicImage::ImageRgb8(resized.to_rgb8())
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .or_raise(|| ErrorKind::Encode)?;
        debug!(source_width = source.width(), source_height = source.height(), height, "rendered thumbnail");
        Ok(Thumbnail { width, height, jpeg })
    }
}
