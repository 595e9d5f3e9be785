//! Series metadata from a Jikan-compatible REST API.
//!
//! [`MetadataLookup`] is what the scanner talks to; [`JikanClient`] is the
//! only real implementation.

mod client;
pub mod error;

pub use crate::client::{JikanClient, best_match};
use crate::error::Result;
use async_trait::async_trait;
use luxi_extract::models::RawMetadata;

/// A source of series metadata and cover images.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    /// Search for a series by plain name, returning the best match if any.
    async fn find_series(&self, name: &str) -> Result<Option<RawMetadata>>;

    /// Download an image (a cover) in full.
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>>;
}
