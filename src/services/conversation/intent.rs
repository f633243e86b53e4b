use crate::models::{ConversationPhase, PreferenceFacts};

const RECOMMEND_PHRASES: &[&str] = &["recommend", "suggest", "show me"];
const MORE_PHRASES: &[&str] = &["more", "different", "other"];
const KIND_PHRASES: &[&str] = &["genre", "type"];
const POSITIVE_PHRASES: &[&str] = &["like", "love", "great"];
const SIMILAR_PHRASES: &[&str] = &["similar", "more like"];
const CHANGE_PHRASES: &[&str] = &["different", "change"];

/// What the user is asking for in one message, relative to where the dialog is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    /// Skip the questions and recommend now
    RecommendNow,
    /// Something other than the current genre or type
    ChangeGenre,
    /// Another batch with the same preferences
    ShowMore,
    /// Liked the last batch
    Positive,
    /// More in the vein of the last batch
    Similar,
    /// Start gathering preferences again
    ChangeDirection,
    /// The message carries at least one preference
    NewPreferences,
    Unrecognised,
}

fn mentions_any(message: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| message.contains(phrase))
}

/// Classifies a lower-cased message.
///
/// Keyword checks run in a fixed priority per phase, so a message that matches several
/// groups resolves to the first one listed for that phase.
pub fn classify(phase: ConversationPhase, message: &str, facts: &PreferenceFacts) -> Intent {
    let carries_preferences = !facts.is_empty();

    match phase {
        ConversationPhase::Greeting | ConversationPhase::GatheringPreferences => {
            if mentions_any(message, RECOMMEND_PHRASES) {
                Intent::RecommendNow
            } else if carries_preferences {
                Intent::NewPreferences
            } else {
                Intent::Unrecognised
            }
        }
        ConversationPhase::Recommending => {
            if mentions_any(message, MORE_PHRASES) {
                if mentions_any(message, KIND_PHRASES) {
                    Intent::ChangeGenre
                } else {
                    Intent::ShowMore
                }
            } else if mentions_any(message, POSITIVE_PHRASES) {
                Intent::Positive
            } else if carries_preferences {
                Intent::NewPreferences
            } else {
                Intent::Unrecognised
            }
        }
        ConversationPhase::FollowUp => {
            if mentions_any(message, SIMILAR_PHRASES) {
                Intent::Similar
            } else if mentions_any(message, CHANGE_PHRASES) {
                Intent::ChangeDirection
            } else if carries_preferences {
                Intent::NewPreferences
            } else {
                Intent::Unrecognised
            }
        }
    }
}
