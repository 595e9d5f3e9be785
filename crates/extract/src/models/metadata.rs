//! Series metadata, stored opaque and read through a typed view.
//!
//! The catalog keeps whatever JSON the lookup service returned for a series
//! untouched. Only the handful of fields this crate cares about are modelled;
//! everything else rides along in the raw payload.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::{Deserialize, Serialize};

/// The raw JSON payload as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMetadata(String);
impl RawMetadata {
    pub fn new(json: impl Into<String>) -> Self {
        Self(json.into())
    }

    pub fn from_value(value: &serde_json::Value) -> Self {
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Decode the typed view. Unknown fields are ignored and missing ones
    /// fall back to empty.
    pub fn view(&self) -> Result<SeriesMetadata> {
        serde_json::from_str(&self.0).or_raise(|| ErrorKind::InvalidMetadata(truncated(&self.0)))
    }
}
impl From<String> for RawMetadata {
    fn from(value: String) -> Self {
        Self(value)
    }
}

fn truncated(s: &str) -> String {
    s.chars().take(64).collect()
}

/// The parts of a lookup result that get read back out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesMetadata {
    #[serde(default)]
    pub mal_id: Option<u64>,
    #[serde(default)]
    pub titles: Vec<TitleVariant>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub images: Images,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleVariant {
    /// "Default", "Synonym", "Japanese", "English", ...
    #[serde(rename = "type", default)]
    pub kind: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Images {
    #[serde(default)]
    pub jpg: Option<ImageSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSet {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub large_image_url: Option<String>,
}

impl SeriesMetadata {
    /// The first listed title, which the lookup service uses as its default.
    pub fn primary_title(&self) -> Option<&str> {
        self.titles.first().map(|t| t.title.as_str())
    }

    /// Whether the primary title equals `name`, ignoring case.
    pub fn is_exact_match(&self, name: &str) -> bool {
        self.primary_title()
            .is_some_and(|title| title.to_lowercase() == name.to_lowercase())
    }

    /// Large JPEG cover URL, if the payload carries a non-empty one.
    pub fn cover_url(&self) -> Option<&str> {
        self.images
            .jpg
            .as_ref()
            .and_then(|jpg| jpg.large_image_url.as_deref())
            .filter(|url| !url.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "mal_id": 13,
        "url": "https://myanimelist.net/manga/13/One_Piece",
        "images": {
            "jpg": {
                "image_url": "https://cdn.example/13.jpg",
                "large_image_url": "https://cdn.example/13l.jpg"
            },
            "webp": { "image_url": "https://cdn.example/13.webp" }
        },
        "titles": [
            { "type": "Default", "title": "One Piece" },
            { "type": "Japanese", "title": "ONE PIECE" }
        ],
        "synopsis": "Gol D. Roger was known as the Pirate King.",
        "chapters": null
    }"#;

    #[test]
    fn view_reads_known_fields() {
        let view = RawMetadata::new(PAYLOAD).view().unwrap();
        assert_eq!(view.mal_id, Some(13));
        assert_eq!(view.primary_title(), Some("One Piece"));
        assert_eq!(view.cover_url(), Some("https://cdn.example/13l.jpg"));
        assert_eq!(view.titles[1].kind, "Japanese");
        assert!(view.synopsis.unwrap().starts_with("Gol D. Roger"));
    }

    #[test]
    fn view_tolerates_missing_fields() {
        let view = RawMetadata::new("{}").view().unwrap();
        assert_eq!(view, SeriesMetadata::default());
        assert_eq!(view.cover_url(), None);
        assert_eq!(view.primary_title(), None);
    }

    #[test]
    fn blank_cover_url_is_unusable() {
        let view = RawMetadata::new(r#"{"images":{"jpg":{"large_image_url":"  "}}}"#).view().unwrap();
        assert_eq!(view.cover_url(), None);
    }

    #[test]
    fn view_rejects_non_object() {
        let err = RawMetadata::new("42").view().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidMetadata(_)));
    }

    #[test]
    fn exact_match_ignores_case() {
        let view = RawMetadata::new(PAYLOAD).view().unwrap();
        assert!(view.is_exact_match("one piece"));
        assert!(view.is_exact_match("ONE PIECE"));
        assert!(!view.is_exact_match("One Piece Party"));
    }

    #[test]
    fn raw_round_trips_untouched() {
        let raw = RawMetadata::new(PAYLOAD);
        assert_eq!(raw.clone().into_inner(), PAYLOAD);
        let value: serde_json::Value = serde_json::from_str(PAYLOAD).unwrap();
        assert_eq!(RawMetadata::from_value(&value).view().unwrap(), raw.view().unwrap());
    }
}
