pub mod classifier;
pub mod emotion;
pub mod normalizer;
pub mod onnx;

pub use classifier::{EmotionClassifier, EmotionModel, InferenceError, Prediction};
pub use emotion::Emotion;
pub use normalizer::{normalize, normalize_with, ChannelOrder, DecodeError, ImageTensor, INPUT_CHANNELS, INPUT_SIZE};
pub use onnx::{ModelLoadError, OnnxEmotionModel};
