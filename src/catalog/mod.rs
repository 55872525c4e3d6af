pub mod genre;
pub mod recommender;
pub mod tmdb;
pub mod types;

pub use genre::{genre_for, lookup, Genre, DEFAULT_GENRE, GENRE_TABLE};
pub use recommender::{GenreRecommender, NO_OVERVIEW};
pub use tmdb::{CatalogError, CatalogSource, TmdbClient};
pub use types::{CatalogMovie, DiscoverResponse, RecommendationItem, Recommendations};
