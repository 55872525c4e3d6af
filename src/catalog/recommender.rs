use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

use super::genre::{genre_for, DEFAULT_GENRE};
use super::tmdb::CatalogSource;
use super::types::{CatalogMovie, RecommendationItem, Recommendations};
use crate::config::CatalogConfig;
use crate::vision::Emotion;

pub const NO_OVERVIEW: &str = "No description available";

/// Turns an emotion into a short list of popular movies of the matching
/// genre.
///
/// Catalog failures never reach the caller: they are logged and the result
/// degrades to an empty list under the default genre.
#[derive(Clone)]
pub struct GenreRecommender {
    source: Arc<dyn CatalogSource>,
    image_base_url: String,
    item_base_url: String,
    max_results: usize,
}

impl GenreRecommender {
    pub fn new(source: Arc<dyn CatalogSource>, config: &CatalogConfig) -> Self {
        Self {
            source,
            image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
            item_base_url: config.item_base_url.trim_end_matches('/').to_string(),
            max_results: config.max_results,
        }
    }

    pub async fn recommend(&self, emotion: Emotion) -> Recommendations {
        let genre = genre_for(emotion);

        match self.source.discover(genre.id).await {
            Ok(movies) => {
                let items = self.shape(movies);
                info!(
                    %emotion,
                    genre = genre.name,
                    count = items.len(),
                    "Fetched recommendations"
                );
                Recommendations {
                    genre,
                    items,
                    degraded: false,
                }
            }
            Err(e) => {
                warn!(%emotion, genre_id = genre.id, "Error fetching movies: {}", e);
                Recommendations {
                    genre: DEFAULT_GENRE,
                    items: Vec::new(),
                    degraded: true,
                }
            }
        }
    }

    /// Keeps movies with a poster, in upstream order, up to the limit.
    fn shape(&self, movies: Vec<CatalogMovie>) -> Vec<RecommendationItem> {
        movies
            .into_iter()
            .filter_map(|movie| {
                let poster = movie.poster()?.to_string();
                Some(self.to_item(movie, &poster))
            })
            .take(self.max_results)
            .collect()
    }

    fn to_item(&self, movie: CatalogMovie, poster: &str) -> RecommendationItem {
        let poster_url = if poster.starts_with('/') {
            format!("{}{}", self.image_base_url, poster)
        } else {
            format!("{}/{}", self.image_base_url, poster)
        };

        let release_date = movie
            .release_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

        RecommendationItem {
            id: movie.id,
            page_url: format!("{}/{}", self.item_base_url, movie.id),
            title: movie.title,
            poster_url,
            overview: movie.overview.unwrap_or_else(|| NO_OVERVIEW.to_string()),
            release_date,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::tmdb::{CatalogError, TmdbClient};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves a canned movie list and remembers the genres it was asked for.
    pub(crate) struct StubCatalog {
        pub movies: Vec<CatalogMovie>,
        pub requested: Mutex<Vec<u32>>,
    }

    impl StubCatalog {
        pub(crate) fn new(movies: Vec<CatalogMovie>) -> Self {
            Self {
                movies,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CatalogSource for StubCatalog {
        async fn discover(&self, genre_id: u32) -> Result<Vec<CatalogMovie>, CatalogError> {
            self.requested.lock().unwrap().push(genre_id);
            Ok(self.movies.clone())
        }
    }

    struct FailingCatalog;

    #[async_trait]
    impl CatalogSource for FailingCatalog {
        async fn discover(&self, _genre_id: u32) -> Result<Vec<CatalogMovie>, CatalogError> {
            Err(CatalogError::Status(503))
        }
    }

    pub(crate) fn movie(id: u64, poster: Option<&str>) -> CatalogMovie {
        CatalogMovie {
            id,
            title: format!("Movie {}", id),
            poster_path: poster.map(str::to_string),
            overview: Some(format!("Overview {}", id)),
            release_date: Some("1999-03-31".to_string()),
        }
    }

    fn recommender(source: Arc<dyn CatalogSource>) -> GenreRecommender {
        GenreRecommender::new(source, &CatalogConfig::default())
    }

    #[tokio::test]
    async fn test_filters_posterless_then_truncates() {
        // 20 results; every fourth one (ids 4, 8, 12, 16, 20) has no poster.
        let movies: Vec<CatalogMovie> = (1..=20)
            .map(|id| {
                if id % 4 == 0 {
                    movie(id, None)
                } else {
                    movie(id, Some(&format!("/p{}.jpg", id)))
                }
            })
            .collect();
        let expected: Vec<u64> = (1..=20).filter(|id| id % 4 != 0).collect();

        let recs = recommender(Arc::new(StubCatalog::new(movies)))
            .recommend(Emotion::Neutral)
            .await;

        assert_eq!(recs.genre_name(), "Drama");
        assert!(!recs.degraded);
        assert_eq!(recs.items.len(), 15);
        assert_eq!(recs.items.iter().map(|i| i.id).collect::<Vec<_>>(), expected);
        assert!(recs.items.iter().all(|i| !i.poster_url.is_empty()));
    }

    #[tokio::test]
    async fn test_never_more_than_limit() {
        let movies: Vec<CatalogMovie> = (1..=40).map(|id| movie(id, Some("/x.jpg"))).collect();
        let recs = recommender(Arc::new(StubCatalog::new(movies)))
            .recommend(Emotion::Fear)
            .await;
        assert_eq!(recs.items.len(), 15);
        assert_eq!(recs.items[0].id, 1);
        assert_eq!(recs.items[14].id, 15);
    }

    #[tokio::test]
    async fn test_item_fields() {
        let mut bare = movie(7, Some("/seven.jpg"));
        bare.overview = None;
        bare.release_date = Some("not a date".to_string());
        let full = movie(8, Some("/eight.jpg"));

        let recs = recommender(Arc::new(StubCatalog::new(vec![bare, full])))
            .recommend(Emotion::Angry)
            .await;

        assert_eq!(recs.genre.id, 28);
        let first = &recs.items[0];
        assert_eq!(first.poster_url, "https://image.tmdb.org/t/p/w500/seven.jpg");
        assert_eq!(first.page_url, "https://www.themoviedb.org/movie/7");
        assert_eq!(first.overview, NO_OVERVIEW);
        assert_eq!(first.release_date, None);

        let second = &recs.items[1];
        assert_eq!(second.overview, "Overview 8");
        assert_eq!(second.year(), Some(1999));
    }

    #[tokio::test]
    async fn test_requests_mapped_genre() {
        let stub = Arc::new(StubCatalog::new(vec![]));
        let rec = recommender(stub.clone());
        rec.recommend(Emotion::Sad).await;
        rec.recommend(Emotion::Unknown).await;
        assert_eq!(*stub.requested.lock().unwrap(), vec![10749, 35]);
    }

    #[tokio::test]
    async fn test_failure_degrades_to_comedy() {
        let recs = recommender(Arc::new(FailingCatalog))
            .recommend(Emotion::Disgust)
            .await;
        assert!(recs.items.is_empty());
        assert_eq!(recs.genre_name(), "Comedy");
        assert!(recs.degraded);
    }

    #[tokio::test]
    async fn test_connection_refused_degrades_to_comedy() {
        let config = CatalogConfig {
            base_url: "http://127.0.0.1:1/3".to_string(),
            connect_timeout_secs: 1,
            timeout_secs: 2,
            ..CatalogConfig::default()
        };
        let client = TmdbClient::new(&config, "k".to_string()).unwrap();
        let recs = GenreRecommender::new(Arc::new(client), &config)
            .recommend(Emotion::Surprise)
            .await;
        assert!(recs.items.is_empty());
        assert_eq!(recs.genre_name(), "Comedy");
    }
}
