use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MovieId, PreferenceFacts};

/// Where a conversation currently is in the dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    Greeting,
    GatheringPreferences,
    Recommending,
    FollowUp,
}

/// Categories of clarifying question, in the order they are asked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    Genres,
    Mood,
    Specifics,
}

/// Everything remembered about one dialog between turns
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationState {
    pub id: String,
    pub phase: ConversationPhase,
    pub preferences: PreferenceFacts,
    pub asked_questions: Vec<QuestionCategory>,
    /// Ids from the latest non-empty recommendation batch
    pub last_recommended_ids: Vec<MovieId>,
    pub message_count: u32,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub last_message: Option<String>,
}

impl ConversationState {
    pub fn new(id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            phase: ConversationPhase::Greeting,
            preferences: PreferenceFacts::default(),
            asked_questions: Vec::new(),
            last_recommended_ids: Vec::new(),
            message_count: 0,
            created_at: now,
            last_activity_at: now,
            last_message: None,
        }
    }

    /// Generates a conversation key: `{user}-{unix millis}` for known users, a random
    /// UUID otherwise
    pub fn generate_id(user_id: Option<&str>) -> String {
        match user_id {
            Some(user) if !user.trim().is_empty() => {
                format!("{}-{}", user.trim(), Utc::now().timestamp_millis())
            }
            _ => Uuid::new_v4().to_string(),
        }
    }

    pub fn has_asked(&self, category: QuestionCategory) -> bool {
        self.asked_questions.contains(&category)
    }

    pub fn mark_asked(&mut self, category: QuestionCategory) {
        if !self.has_asked(category) {
            self.asked_questions.push(category);
        }
    }

    /// Records a processed message
    pub fn touch(&mut self, message: &str) {
        self.message_count += 1;
        self.last_activity_at = Utc::now();
        self.last_message = Some(message.to_string());
    }
}
