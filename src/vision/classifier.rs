use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use super::emotion::Emotion;
use super::normalizer::ImageTensor;

/// A pre-trained model producing one score per emotion label.
///
/// Implementations are loaded once at startup and shared read-only between
/// requests, so `predict` takes `&self`.
pub trait EmotionModel: Send + Sync {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub emotion: Emotion,
    pub confidence: f32,
    pub scores: Vec<f32>,
}

#[derive(Clone)]
pub struct EmotionClassifier {
    model: Arc<dyn EmotionModel>,
}

impl EmotionClassifier {
    pub fn new(model: Arc<dyn EmotionModel>) -> Self {
        Self { model }
    }

    /// Runs one forward pass and reduces the scores to a single label.
    pub fn classify(&self, input: &ImageTensor) -> Result<Prediction, InferenceError> {
        let scores = self.model.predict(input)?;

        if scores.len() != Emotion::LABELS.len() {
            warn!(
                expected = Emotion::LABELS.len(),
                actual = scores.len(),
                "Model output width does not match label count"
            );
        }

        let (index, confidence) = argmax(&scores)?;
        let emotion = Emotion::from_index(index);

        debug!(%emotion, index, confidence, "Classified image");

        Ok(Prediction {
            emotion,
            confidence,
            scores,
        })
    }
}

/// Index and value of the largest score. Ties resolve to the lowest index;
/// NaN scores never win.
pub fn argmax(scores: &[f32]) -> Result<(usize, f32), InferenceError> {
    if scores.is_empty() {
        return Err(InferenceError::EmptyOutput);
    }

    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if score <= b => {}
            _ => best = Some((i, score)),
        }
    }

    best.ok_or(InferenceError::InvalidScores)
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Model produced no scores")]
    EmptyOutput,
    #[error("Model produced no usable scores")]
    InvalidScores,
    #[error("Unexpected model output shape {0:?}")]
    OutputShape(Vec<usize>),
    #[error("Inference backend error: {0}")]
    Backend(String),
}
