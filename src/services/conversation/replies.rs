use crate::models::{ConversationPhase, EmotionLabel, PreferenceFacts};
use crate::services::random::{choose, RandomSource};

pub const RECOMMEND_NOW: &str = "Perfect! Let me find some great movies for you.";
pub const ENOUGH_INFORMATION: &str =
    "Great! I have enough information. Let me find some perfect movies for you.";
pub const QUESTIONS_EXHAUSTED: &str =
    "Perfect! I have enough information. Let me find some great movies for you.";
pub const CHANGE_GENRE: &str = "Sure! Let me find something completely different for you.";
pub const SHOW_MORE: &str = "Here are more great movies for you!";
pub const UPDATED_PREFERENCES: &str =
    "Perfect! Let me update your preferences and find new recommendations.";
pub const POSITIVE: &str = "Awesome! I'm glad you like the recommendations!\n\n\
    Would you like more movies similar to these, or shall we explore a different genre/mood?";
pub const SIMILAR: &str = "Here are more movies similar to your previous recommendations!";
pub const FOLLOW_UP_FALLBACK: &str = "Let me find some new recommendations for you!";
pub const FOLLOW_UP_PROMPT: &str =
    "What do you think? Would you like more recommendations or want to try a different genre?";
pub const NO_RESULTS: &str = "I'm having trouble finding movies that match your criteria. \
    Let me suggest some trending movies instead, or you can tell me different preferences!";
pub const CATALOG_UNAVAILABLE: &str = "Sorry, I couldn't reach the movie catalog just now. \
    Please try again in a moment, or tell me different preferences!";

const FALLBACKS: &[&str] = &[
    "I'm here to help you find great movies! Tell me what you're in the mood for.",
    "What kind of movie experience are you looking for today?",
    "I can recommend movies based on how you're feeling or your preferences. What sounds good?",
];

const GATHERING_CHIPS: &[&str] = &[
    "Comedy movies",
    "Action films",
    "Romance",
    "Horror",
    "Sci-Fi",
    "Recommend now",
];
const RECOMMENDING_CHIPS: &[&str] = &["Show more", "Different genre", "Similar movies", "Start over"];
const FOLLOW_UP_CHIPS: &[&str] = &["More like these", "Try different", "Action movies", "Comedy films"];

/// Quick-reply suggestions for the phase a conversation is in
pub fn suggestion_chips(phase: ConversationPhase) -> &'static [&'static str] {
    match phase {
        ConversationPhase::Greeting | ConversationPhase::GatheringPreferences => GATHERING_CHIPS,
        ConversationPhase::Recommending => RECOMMENDING_CHIPS,
        ConversationPhase::FollowUp => FOLLOW_UP_CHIPS,
    }
}

pub fn fallback(random: &dyn RandomSource) -> String {
    choose(random, FALLBACKS).to_string()
}

/// Opening line for a question, acknowledging any genres already known
pub fn question(preferences: &PreferenceFacts, question: &str) -> String {
    if preferences.is_empty() {
        return format!("I'd love to help! {}", question);
    }
    match preferences.genre_names() {
        genres if genres.is_empty() => format!("Got it! {}", question),
        genres => format!("Got it! I see you like {}. {}", genres, question),
    }
}

pub fn change_direction(question: &str) -> String {
    format!("Sure! Let's find something different. {}", question)
}

/// Genre names for "some X movies", or a neutral word when none resolve
fn movie_kind(preferences: &PreferenceFacts) -> String {
    match preferences.genre_names() {
        genres if genres.is_empty() => "new".to_string(),
        genres => genres,
    }
}

/// `Great choice! Let me find some Horror movies for you.`
pub fn new_genre(preferences: &PreferenceFacts) -> String {
    format!(
        "Great choice! Let me find some {} movies for you.",
        movie_kind(preferences)
    )
}

pub fn replaced_preferences(preferences: &PreferenceFacts) -> String {
    format!(
        "Excellent! Let me find some {} movies for you.",
        movie_kind(preferences)
    )
}

/// Full reply for a non-empty batch: the lead line, a summary of what drove it and the
/// follow-up prompt
pub fn batch_summary(
    lead: &str,
    count: usize,
    preferences: &PreferenceFacts,
    mood: Option<EmotionLabel>,
) -> String {
    let mut summary = format!("Found {} recommendations for you", count);
    if !preferences.is_empty() {
        summary.push_str(&format!(
            " based on your preferences ({})",
            preferences.describe()
        ));
    }
    if let Some(mood) = mood {
        summary.push_str(&format!(" and your current {} mood", mood));
    }
    summary.push('.');

    format!("{}\n\n{}\n\n{}", lead, summary, FOLLOW_UP_PROMPT)
}
