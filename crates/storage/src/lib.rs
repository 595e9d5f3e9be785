//! Filesystem access for comic libraries and asset directories.
//!
//! All paths handed to a [`StorageBackend`] are relative to its root and are
//! validated before touching the disk. Absolute paths that come back out of
//! the catalog are checked with [`confine`] instead.

pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::{LocalBackend, StorageBackend};
pub use crate::models::FileInfo;
pub use crate::path::{confine, validate as validate_path};
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
