use serde::Serialize;
use uuid::Uuid;

use crate::catalog::{Genre, RecommendationItem};
use crate::pipeline::PipelineOutcome;
use crate::vision::Emotion;

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub request_id: Uuid,
    pub emotion: Emotion,
    pub confidence: f32,
    pub genre: Genre,
    pub degraded: bool,
    pub movies: Vec<RecommendationItem>,
}

impl From<PipelineOutcome> for RecommendResponse {
    fn from(outcome: PipelineOutcome) -> Self {
        Self {
            request_id: outcome.request_id,
            emotion: outcome.prediction.emotion,
            confidence: outcome.prediction.confidence,
            genre: outcome.recommendations.genre,
            degraded: outcome.recommendations.degraded,
            movies: outcome.recommendations.items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenreEntry {
    pub emotion: Emotion,
    pub genre_id: u32,
    pub genre_name: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub kind: &'static str,
    pub error: String,
}
