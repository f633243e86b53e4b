use serde::Serialize;

use crate::models::{EmotionLabel, EmotionSignal, GenreId, PreferenceFacts};

/// Multiplier applied to the emotion matching the user's stated mood
pub const MOOD_BOOST: f64 = 1.3;

/// Normalised weight an emotion needs before it contributes genres
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.1;

/// Which signal ended up choosing the genre set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenreSource {
    Emotion,
    Preferences,
    Trending,
}

/// Result of combining the emotion signal with explicit preferences
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusedSignal {
    /// Emotions above the significance threshold with their normalised weights
    pub weights: Vec<(EmotionLabel, f64)>,
    /// Genre set to query, in first-seen order
    pub genres: Vec<GenreId>,
    pub source: GenreSource,
}

impl FusedSignal {
    pub fn weight_of(&self, emotion: EmotionLabel) -> Option<f64> {
        self.weights
            .iter()
            .find(|(label, _)| *label == emotion)
            .map(|(_, weight)| *weight)
    }

    /// Heaviest contributing emotion
    pub fn dominant(&self) -> Option<EmotionLabel> {
        self.weights
            .iter()
            .fold(None, |best: Option<(EmotionLabel, f64)>, (label, weight)| match best {
                Some((_, best_weight)) if best_weight >= *weight => best,
                _ => Some((*label, *weight)),
            })
            .map(|(label, _)| label)
    }
}

/// Drops neutral, boosts the stated mood and rescales the rest to sum to 1.
///
/// When every remaining weight is zero the result is all zeros.
pub fn normalized_weights(
    signal: &EmotionSignal,
    mood: Option<EmotionLabel>,
) -> Vec<(EmotionLabel, f64)> {
    let boosted: Vec<(EmotionLabel, f64)> = signal
        .iter()
        .filter(|(label, _)| *label != EmotionLabel::Neutral)
        .map(|(label, weight)| {
            if Some(label) == mood {
                (label, weight * MOOD_BOOST)
            } else {
                (label, weight)
            }
        })
        .collect();

    let total: f64 = boosted.iter().map(|(_, w)| w).sum();

    boosted
        .into_iter()
        .map(|(label, weight)| {
            let normalized = if total > 0.0 { weight / total } else { 0.0 };
            (label, normalized)
        })
        .collect()
}

/// Combines an optional emotion signal with the user's preferences into the genre set
/// that drives candidate fetching.
pub fn fuse(signal: Option<&EmotionSignal>, preferences: &PreferenceFacts) -> FusedSignal {
    if let Some(signal) = signal {
        let weights: Vec<(EmotionLabel, f64)> = normalized_weights(signal, preferences.mood)
            .into_iter()
            .filter(|(_, weight)| *weight > SIGNIFICANCE_THRESHOLD)
            .collect();

        let mut genres: Vec<GenreId> = Vec::new();
        for (label, _) in &weights {
            for genre in label.genres() {
                if !genres.contains(genre) {
                    genres.push(*genre);
                }
            }
        }

        if !genres.is_empty() {
            tracing::debug!(weights = ?weights, genres = ?genres, "Fused emotion signal");
            return FusedSignal {
                weights,
                genres,
                source: GenreSource::Emotion,
            };
        }
    }

    if preferences.has_genres() {
        return FusedSignal {
            weights: Vec::new(),
            genres: preferences.genre_ids().to_vec(),
            source: GenreSource::Preferences,
        };
    }

    FusedSignal {
        weights: Vec::new(),
        genres: Vec::new(),
        source: GenreSource::Trending,
    }
}
