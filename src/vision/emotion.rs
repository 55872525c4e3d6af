use serde::Serialize;
use std::fmt;

/// Output classes of the emotion model, in the order of its score vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Neutral,
    Sad,
    Surprise,
    Unknown,
}

impl Emotion {
    /// The labels the model can produce, indexed like its output.
    pub const LABELS: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Neutral,
        Emotion::Sad,
        Emotion::Surprise,
    ];

    /// Maps a model output index to its label. Indices past the label set
    /// yield `Unknown`.
    pub fn from_index(index: usize) -> Self {
        Self::LABELS.get(index).copied().unwrap_or(Emotion::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Angry => "Angry",
            Emotion::Disgust => "Disgust",
            Emotion::Fear => "Fear",
            Emotion::Happy => "Happy",
            Emotion::Neutral => "Neutral",
            Emotion::Sad => "Sad",
            Emotion::Surprise => "Surprise",
            Emotion::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_index() {
        assert_eq!(Emotion::from_index(0), Emotion::Angry);
        assert_eq!(Emotion::from_index(3), Emotion::Happy);
        assert_eq!(Emotion::from_index(6), Emotion::Surprise);
        assert_eq!(Emotion::from_index(7), Emotion::Unknown);
        assert_eq!(Emotion::from_index(usize::MAX), Emotion::Unknown);
    }

    #[test]
    fn test_display() {
        assert_eq!(Emotion::Sad.to_string(), "Sad");
        assert_eq!(Emotion::Unknown.to_string(), "Unknown");
    }
}
