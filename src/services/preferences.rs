use regex::Regex;
use std::sync::LazyLock;

use crate::models::{genres::*, EmotionLabel, GenreId, PreferenceFacts};

/// Natural-language keyword → genre ids. Every matching entry contributes, so compound
/// phrases and their constituents all fire.
const GENRE_KEYWORDS: &[(&str, &[GenreId])] = &[
    // Action & adventure
    ("action", &[ACTION]),
    ("adventure", &[ADVENTURE]),
    ("thriller", &[THRILLER]),
    ("superhero", &[ACTION, SCIENCE_FICTION]),
    ("spy", &[ACTION, THRILLER]),
    ("war", &[WAR]),
    // Comedy & light
    ("comedy", &[COMEDY]),
    ("funny", &[COMEDY]),
    ("humor", &[COMEDY]),
    ("laugh", &[COMEDY]),
    ("romantic comedy", &[COMEDY, ROMANCE]),
    ("family", &[FAMILY]),
    // Drama & emotional
    ("drama", &[DRAMA]),
    ("emotional", &[DRAMA]),
    ("sad", &[DRAMA]),
    ("tear jerker", &[DRAMA]),
    ("romance", &[ROMANCE]),
    ("love story", &[ROMANCE]),
    ("romantic", &[ROMANCE]),
    // Horror & suspense
    ("horror", &[HORROR]),
    ("scary", &[HORROR]),
    ("supernatural", &[HORROR]),
    ("mystery", &[MYSTERY]),
    ("suspense", &[THRILLER]),
    ("psychological", &[THRILLER, HORROR]),
    // Sci-fi & fantasy
    ("sci-fi", &[SCIENCE_FICTION]),
    ("science fiction", &[SCIENCE_FICTION]),
    ("fantasy", &[FANTASY]),
    ("magic", &[FANTASY]),
    ("space", &[SCIENCE_FICTION]),
    ("futuristic", &[SCIENCE_FICTION]),
    // Other
    ("crime", &[CRIME]),
    ("documentary", &[DOCUMENTARY]),
    ("animation", &[ANIMATION]),
    ("western", &[WESTERN]),
    ("music", &[MUSIC]),
    ("history", &[HISTORY]),
];

/// Mood word → emotion label. When several match, the one scanned last wins.
// Ordering here, not position in the message, decides which mood sticks. Kept as-is
// until product decides whether first-mentioned should win instead.
const MOOD_KEYWORDS: &[(&str, EmotionLabel)] = &[
    ("happy", EmotionLabel::Happy),
    ("joyful", EmotionLabel::Happy),
    ("upbeat", EmotionLabel::Happy),
    ("cheerful", EmotionLabel::Happy),
    ("sad", EmotionLabel::Sad),
    ("melancholy", EmotionLabel::Sad),
    ("blue", EmotionLabel::Sad),
    ("down", EmotionLabel::Sad),
    ("angry", EmotionLabel::Angry),
    ("frustrated", EmotionLabel::Angry),
    ("mad", EmotionLabel::Angry),
    ("furious", EmotionLabel::Angry),
    ("excited", EmotionLabel::Surprised),
    ("thrilled", EmotionLabel::Surprised),
    ("pumped", EmotionLabel::Surprised),
    ("scared", EmotionLabel::Fearful),
    ("nervous", EmotionLabel::Fearful),
    ("anxious", EmotionLabel::Fearful),
    ("disgusted", EmotionLabel::Disgusted),
    ("grossed out", EmotionLabel::Disgusted),
    ("neutral", EmotionLabel::Neutral),
    ("normal", EmotionLabel::Neutral),
    ("okay", EmotionLabel::Neutral),
];

const RATING_PHRASES: &[&str] = &["high rated", "good rating"];
const HIGH_RATING_THRESHOLD: f64 = 7.0;

static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("year pattern is valid"));

/// Extracts structured preferences from free text.
///
/// Only the kinds actually detected are set; nothing is defaulted.
pub fn extract_preferences(text: &str) -> PreferenceFacts {
    let text = text.to_lowercase();
    let mut facts = PreferenceFacts::default();

    let mut genres: Vec<GenreId> = Vec::new();
    for (keyword, ids) in GENRE_KEYWORDS {
        if text.contains(keyword) {
            for id in *ids {
                if !genres.contains(id) {
                    genres.push(*id);
                }
            }
        }
    }
    if !genres.is_empty() {
        facts.genres = Some(genres);
    }

    for (word, emotion) in MOOD_KEYWORDS {
        if text.contains(word) {
            facts.mood = Some(*emotion);
        }
    }

    facts.year = YEAR_PATTERN
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok());

    if RATING_PHRASES.iter().any(|phrase| text.contains(phrase)) {
        facts.min_rating = Some(HIGH_RATING_THRESHOLD);
    }

    tracing::debug!(
        genres = ?facts.genres,
        mood = ?facts.mood,
        year = ?facts.year,
        min_rating = ?facts.min_rating,
        "Extracted preferences"
    );

    facts
}
