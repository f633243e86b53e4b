use serde::Serialize;

use super::random::{choose, RandomSource};
use crate::models::{PreferenceFacts, QuestionCategory};

const GENRE_QUESTIONS: &[&str] = &[
    "What type of movies do you usually enjoy? (action, comedy, drama, horror, etc.)",
    "Are you in the mood for something specific like comedy, thriller, or romance?",
    "Do you prefer action-packed movies or something more relaxed?",
];

const MOOD_QUESTIONS: &[&str] = &[
    "How are you feeling right now?",
    "What's your current mood like?",
    "Are you looking for something uplifting or more serious?",
];

const SPECIFICS_QUESTIONS: &[&str] = &[
    "Any favorite actors or directors?",
    "Do you prefer newer movies or are you open to classics?",
    "Any particular rating preference? (family-friendly, mature themes, etc.)",
];

/// A clarifying question and the category it covers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedQuestion {
    pub category: QuestionCategory,
    pub text: &'static str,
}

fn phrasings(category: QuestionCategory) -> &'static [&'static str] {
    match category {
        QuestionCategory::Genres => GENRE_QUESTIONS,
        QuestionCategory::Mood => MOOD_QUESTIONS,
        QuestionCategory::Specifics => SPECIFICS_QUESTIONS,
    }
}

/// Picks the next clarifying question, or `None` when it is time to recommend.
///
/// Genres come first, then mood (only when no emotion signal is available), then
/// general specifics. Categories already asked are never repeated.
pub fn next_question(
    preferences: &PreferenceFacts,
    has_emotion_signal: bool,
    asked: &[QuestionCategory],
    random: &dyn RandomSource,
) -> Option<PlannedQuestion> {
    let category = if !preferences.has_genres() && !asked.contains(&QuestionCategory::Genres) {
        QuestionCategory::Genres
    } else if preferences.mood.is_none()
        && !has_emotion_signal
        && !asked.contains(&QuestionCategory::Mood)
    {
        QuestionCategory::Mood
    } else if !asked.contains(&QuestionCategory::Specifics) {
        QuestionCategory::Specifics
    } else {
        return None;
    };

    Some(PlannedQuestion {
        category,
        text: *choose(random, phrasings(category)),
    })
}
