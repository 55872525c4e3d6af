use serde::Serialize;

use crate::vision::Emotion;

/// A catalog genre: the id the discover endpoint filters on and its
/// display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Genre {
    pub id: u32,
    pub name: &'static str,
}

/// Used for any emotion without an entry of its own.
pub const DEFAULT_GENRE: Genre = Genre {
    id: 35,
    name: "Comedy",
};

/// One entry per model label.
pub static GENRE_TABLE: [(Emotion, Genre); 7] = [
    (Emotion::Angry, Genre { id: 28, name: "Action" }),
    (Emotion::Disgust, Genre { id: 27, name: "Horror" }),
    (Emotion::Fear, Genre { id: 9648, name: "Thriller" }),
    (Emotion::Happy, Genre { id: 35, name: "Comedy" }),
    (Emotion::Neutral, Genre { id: 18, name: "Drama" }),
    (Emotion::Sad, Genre { id: 10749, name: "Romance" }),
    (Emotion::Surprise, Genre { id: 878, name: "Sci-Fi" }),
];

/// Looks up the genre for an emotion, `None` if it has no entry.
pub fn lookup(emotion: Emotion) -> Option<Genre> {
    GENRE_TABLE
        .iter()
        .find(|(e, _)| *e == emotion)
        .map(|(_, genre)| *genre)
}

pub fn genre_for(emotion: Emotion) -> Genre {
    lookup(emotion).unwrap_or(DEFAULT_GENRE)
}
