use crate::MetadataLookup;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use luxi_extract::models::{RawMetadata, SeriesMetadata};
use serde::Deserialize;
use tracing::{debug, instrument};

const USER_AGENT: &str = concat!("luxi/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

/// Client for the Jikan (MyAnimeList) v4 API, or anything shaped like it.
#[derive(Debug, Clone)]
pub struct JikanClient {
    http: reqwest::Client,
    base_url: String,
}

impl JikanClient {
    /// `base_url` is the API root, e.g. `https://api.jikan.moe/v4`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .or_raise(|| ErrorKind::Client)?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<reqwest::Response> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| ErrorKind::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Status(status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl MetadataLookup for JikanClient {
    #[instrument(skip(self))]
    async fn find_series(&self, name: &str) -> Result<Option<RawMetadata>> {
        let url = format!("{}/manga", self.base_url);
        let body: SearchResponse = self
            .get(&url, &[("q", name)])
            .await?
            .json()
            .await
            .or_raise(|| ErrorKind::InvalidResponse)?;
        debug!(results = body.data.len(), "metadata search complete");
        Ok(best_match(&body.data, name).map(RawMetadata::from_value))
    }

    #[instrument(skip(self))]
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self
            .get(url, &[])
            .await?
            .bytes()
            .await
            .map_err(|e| ErrorKind::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Pick the result whose primary title equals `name` (ignoring case), or
/// else the first result.
pub fn best_match<'a>(results: &'a [serde_json::Value], name: &str) -> Option<&'a serde_json::Value> {
    results
        .iter()
        .find(|result| {
            SeriesMetadata::deserialize(*result)
                .map(|view| view.is_exact_match(name))
                .unwrap_or(false)
        })
        .or_else(|| results.first())
}
