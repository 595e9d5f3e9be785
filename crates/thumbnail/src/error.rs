//! Thumbnail Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A thumbnail error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for thumbnail operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source extension isn't one of the decodable raster formats.
    #[display("unsupported image format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// The source bytes could not be decoded as the format claimed.
    #[display("failed to decode image")]
    Decode,
    /// The preview could not be encoded as JPEG.
    #[display("failed to encode preview")]
    Encode,
    #[display("thumbnail width must be greater than zero")]
    InvalidWidth,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
