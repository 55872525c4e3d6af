use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::types::{CatalogMovie, DiscoverResponse};
use crate::config::CatalogConfig;

/// Read-only access to a movie catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Movies of one genre, most popular first.
    async fn discover(&self, genre_id: u32) -> Result<Vec<CatalogMovie>, CatalogError>;
}

/// Client for the TMDb v3 discover endpoint.
pub struct TmdbClient {
    client: Client,
    discover_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(config: &CatalogConfig, api_key: String) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.timeout())
            .build()
            .map_err(CatalogError::Client)?;

        let discover_url = format!("{}/discover/movie", config.base_url.trim_end_matches('/'));

        Ok(Self {
            client,
            discover_url,
            api_key,
        })
    }
}

#[async_trait]
impl CatalogSource for TmdbClient {
    async fn discover(&self, genre_id: u32) -> Result<Vec<CatalogMovie>, CatalogError> {
        debug!(genre_id, url = %self.discover_url, "Querying catalog");

        let genre = genre_id.to_string();
        let response = self
            .client
            .get(&self.discover_url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("with_genres", genre.as_str()),
                ("sort_by", "popularity.desc"),
            ])
            .send()
            .await
            // The request URL carries the api key, keep it out of errors.
            .map_err(|e| CatalogError::Request(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }

        let body: DiscoverResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Decode(e.without_url()))?;

        debug!(genre_id, count = body.results.len(), "Catalog responded");

        Ok(body.results)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),
    #[error("Catalog request failed: {0}")]
    Request(reqwest::Error),
    #[error("Catalog returned HTTP {0}")]
    Status(u16),
    #[error("Malformed catalog response: {0}")]
    Decode(reqwest::Error),
}
