use std::path::{Path, PathBuf};
use tracing::info;
use tract_onnx::prelude::*;

use super::classifier::{EmotionModel, InferenceError};
use super::normalizer::ImageTensor;

type Plan = TypedRunnableModel<TypedModel>;

/// Emotion model executed with tract from an ONNX export.
///
/// The network is loaded, shape-fixed to `(1, 48, 48, 3)` and optimised once;
/// afterwards it is only ever run, never mutated.
pub struct OnnxEmotionModel {
    plan: Plan,
    path: PathBuf,
}

impl OnnxEmotionModel {
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        if !path.is_file() {
            return Err(ModelLoadError::NotFound(path.to_path_buf()));
        }

        info!("Loading emotion model from {}", path.display());

        let shape: TVec<usize> = ImageTensor::SHAPE.iter().copied().collect();
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|m| m.with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), shape)))
            .and_then(|m| m.into_optimized())
            .and_then(|m| m.into_runnable())
            .map_err(|e| ModelLoadError::Invalid(path.to_path_buf(), e.to_string()))?;

        Ok(Self {
            plan,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EmotionModel for OnnxEmotionModel {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        let tensor = Tensor::from_shape(&input.shape(), input.as_slice())
            .map_err(|e| InferenceError::Backend(format!("Failed to build input tensor: {}", e)))?;

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| InferenceError::Backend(e.to_string()))?;

        let first = outputs
            .first()
            .ok_or_else(|| InferenceError::OutputShape(vec![]))?;
        let view = first
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::Backend(e.to_string()))?;

        // Expect one row of scores: (1, N) or a bare (N).
        match view.shape() {
            [_] | [1, _] => Ok(view.iter().copied().collect()),
            other => Err(InferenceError::OutputShape(other.to_vec())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("Model file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to load model {0}: {1}")]
    Invalid(PathBuf, String),
}
