use axum::{
    extract::{DefaultBodyLimit, Request},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::catalog::{CatalogSource, GenreRecommender};
use crate::config::Config;
use crate::pipeline::RecommendationPipeline;
use crate::vision::{EmotionClassifier, EmotionModel};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<RecommendationPipeline>,
}

impl AppState {
    pub fn new(config: Config, pipeline: RecommendationPipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }

    /// Wires the pipeline from a loaded model and a catalog source.
    pub fn assemble(
        config: Config,
        model: Arc<dyn EmotionModel>,
        catalog: Arc<dyn CatalogSource>,
    ) -> Self {
        let classifier = EmotionClassifier::new(model);
        let recommender = GenreRecommender::new(catalog, &config.catalog);
        let pipeline =
            RecommendationPipeline::new(classifier, recommender, config.model.channel_order);
        Self::new(config, pipeline)
    }
}

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/recommend", post(crate::web::recommend_api))
        .route("/api/genres", get(crate::web::list_genres));

    Router::new()
        .route("/", get(crate::web::index))
        .route("/recommend", post(crate::web::recommend_page))
        .route("/healthz", get(crate::web::healthz))
        .route("/robots.txt", get(robots_txt_handler))
        .merge(api_routes)
        .fallback(fallback_handler)
        .layer(DefaultBodyLimit::max(state.config.upload.max_bytes))
        .layer(axum::middleware::from_fn(crate::middleware::log_request))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn robots_txt_handler() -> &'static str {
    "User-agent: *\nDisallow: /\n"
}

async fn fallback_handler(req: Request) -> impl IntoResponse {
    // CORS preflight for unknown paths
    if req.method() == axum::http::Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}
