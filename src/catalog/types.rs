use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::genre::Genre;

/// Body of the discover endpoint. Only the fields we use are modeled;
/// everything else in the payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverResponse {
    #[serde(default)]
    pub results: Vec<CatalogMovie>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogMovie {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
}

impl CatalogMovie {
    /// Poster path if present and not blank.
    pub fn poster(&self) -> Option<&str> {
        self.poster_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationItem {
    pub id: u64,
    pub title: String,
    pub poster_url: String,
    pub page_url: String,
    pub overview: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
}

impl RecommendationItem {
    pub fn year(&self) -> Option<i32> {
        use chrono::Datelike;
        self.release_date.map(|d| d.year())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    pub genre: Genre,
    pub items: Vec<RecommendationItem>,
    /// Set when the catalog could not be reached and the result is the
    /// empty fallback.
    pub degraded: bool,
}

impl Recommendations {
    pub fn genre_name(&self) -> &'static str {
        self.genre.name
    }
}
