use serde::{Deserialize, Serialize};

use super::{genre_names_joined, EmotionLabel, GenreId};

/// The kinds of preference a user can express
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PreferenceKind {
    Genres,
    Mood,
    Year,
    MinRating,
}

/// Structured preferences, either extracted from one message or accumulated over a
/// conversation. Each kind holds at most one value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceFacts {
    /// Genre ids without duplicates, in first-seen order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<GenreId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<EmotionLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
}

impl PreferenceFacts {
    /// Kinds that currently carry a value, in canonical order
    pub fn known_kinds(&self) -> Vec<PreferenceKind> {
        let mut kinds = Vec::new();
        if self.has_genres() {
            kinds.push(PreferenceKind::Genres);
        }
        if self.mood.is_some() {
            kinds.push(PreferenceKind::Mood);
        }
        if self.year.is_some() {
            kinds.push(PreferenceKind::Year);
        }
        if self.min_rating.is_some() {
            kinds.push(PreferenceKind::MinRating);
        }
        kinds
    }

    pub fn known_count(&self) -> usize {
        self.known_kinds().len()
    }

    pub fn is_empty(&self) -> bool {
        self.known_count() == 0
    }

    pub fn has_genres(&self) -> bool {
        self.genres.as_ref().is_some_and(|g| !g.is_empty())
    }

    pub fn genre_ids(&self) -> &[GenreId] {
        self.genres.as_deref().unwrap_or(&[])
    }

    /// Overlays every kind present in `newer`, keeping the rest
    pub fn merge(&mut self, newer: PreferenceFacts) {
        if newer.has_genres() {
            self.genres = newer.genres;
        }
        if newer.mood.is_some() {
            self.mood = newer.mood;
        }
        if newer.year.is_some() {
            self.year = newer.year;
        }
        if newer.min_rating.is_some() {
            self.min_rating = newer.min_rating;
        }
    }

    /// Display names of the known genres, e.g. `Comedy, Family`. Empty when none are known.
    pub fn genre_names(&self) -> String {
        genre_names_joined(self.genre_ids())
    }

    /// Known values for use in replies, e.g. `Horror, happy mood, from 1995`
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        let genres = self.genre_names();
        if !genres.is_empty() {
            parts.push(genres);
        }
        if let Some(mood) = self.mood {
            parts.push(format!("{} mood", mood));
        }
        if let Some(year) = self.year {
            parts.push(format!("from {}", year));
        }
        if let Some(min_rating) = self.min_rating {
            parts.push(format!("rated {}+", min_rating));
        }
        parts.join(", ")
    }
}
