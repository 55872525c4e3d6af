//! The request path: image bytes in, emotion and movie list out.
//!
//! Stages run strictly in order: decode and normalise, classify, recommend.
//! Decode and inference are CPU-bound and run on the blocking pool; the
//! catalog call is the only I/O.

use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::catalog::{GenreRecommender, Recommendations};
use crate::vision::{
    normalize_with, ChannelOrder, DecodeError, EmotionClassifier, InferenceError, Prediction,
};

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub request_id: Uuid,
    pub prediction: Prediction,
    pub recommendations: Recommendations,
}

#[derive(Clone)]
pub struct RecommendationPipeline {
    classifier: EmotionClassifier,
    recommender: GenreRecommender,
    channel_order: ChannelOrder,
}

impl RecommendationPipeline {
    pub fn new(
        classifier: EmotionClassifier,
        recommender: GenreRecommender,
        channel_order: ChannelOrder,
    ) -> Self {
        Self {
            classifier,
            recommender,
            channel_order,
        }
    }

    pub async fn run(&self, image: Vec<u8>) -> Result<PipelineOutcome, PipelineError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("pipeline", %request_id);

        async move {
            info!(bytes = image.len(), "Processing image");

            let prediction = self.classify(image).await?;
            info!(
                emotion = %prediction.emotion,
                confidence = prediction.confidence,
                "Predicted emotion"
            );

            let recommendations = self.recommender.recommend(prediction.emotion).await;

            Ok(PipelineOutcome {
                request_id,
                prediction,
                recommendations,
            })
        }
        .instrument(span)
        .await
    }

    async fn classify(&self, image: Vec<u8>) -> Result<Prediction, PipelineError> {
        let classifier = self.classifier.clone();
        let order = self.channel_order;

        tokio::task::spawn_blocking(move || -> Result<Prediction, PipelineError> {
            let tensor = normalize_with(&image, order)?;
            Ok(classifier.classify(&tensor)?)
        })
        .await
        .map_err(|e| InferenceError::Backend(format!("Inference task failed: {}", e)))?
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::recommender::tests::{movie, StubCatalog};
    use crate::config::CatalogConfig;
    use crate::vision::classifier::tests::FixedModel;
    use crate::vision::normalizer::tests::encode;
    use crate::vision::{Emotion, EmotionModel, ImageTensor};
    use image::{ImageFormat, Rgb, RgbImage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingModel(AtomicUsize);

    impl EmotionModel for CountingModel {
        fn predict(&self, _input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])
        }
    }

    fn face() -> Vec<u8> {
        encode(RgbImage::from_pixel(64, 64, Rgb([200, 150, 120])), ImageFormat::Png)
    }

    fn pipeline(model: Arc<dyn EmotionModel>, stub: Arc<StubCatalog>) -> RecommendationPipeline {
        RecommendationPipeline::new(
            EmotionClassifier::new(model),
            GenreRecommender::new(stub, &CatalogConfig::default()),
            ChannelOrder::Bgr,
        )
    }

    #[tokio::test]
    async fn test_happy_face_gets_comedy() {
        let stub = Arc::new(StubCatalog::new(vec![movie(1, Some("/1.jpg"))]));
        let model = Arc::new(FixedModel(vec![0.0, 0.0, 0.1, 0.8, 0.1, 0.0, 0.0]));

        let outcome = pipeline(model, stub.clone()).run(face()).await.unwrap();

        assert_eq!(outcome.prediction.emotion, Emotion::Happy);
        assert_eq!(outcome.recommendations.genre.id, 35);
        assert_eq!(outcome.recommendations.genre_name(), "Comedy");
        assert_eq!(outcome.recommendations.items.len(), 1);
        assert_eq!(*stub.requested.lock().unwrap(), vec![35]);
    }

    #[tokio::test]
    async fn test_decode_error_skips_inference() {
        let stub = Arc::new(StubCatalog::new(vec![]));
        let model = Arc::new(CountingModel(AtomicUsize::new(0)));

        let result = pipeline(model.clone(), stub.clone())
            .run(b"GIF89a-but-not-really".to_vec())
            .await;

        assert!(matches!(result, Err(PipelineError::Decode(_))));
        assert_eq!(model.0.load(Ordering::SeqCst), 0);
        assert!(stub.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inference_error_skips_catalog() {
        let stub = Arc::new(StubCatalog::new(vec![]));
        let model = Arc::new(FixedModel(vec![]));

        let result = pipeline(model, stub.clone()).run(face()).await;

        assert!(matches!(result, Err(PipelineError::Inference(_))));
        assert!(stub.requested.lock().unwrap().is_empty());
    }
}
