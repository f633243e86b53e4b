use serde::Serialize;
use std::sync::Arc;

use super::intent::{classify, Intent};
use super::replies;
use crate::{
    db::ConversationStore,
    error::{AppError, AppResult},
    models::{
        ConversationPhase, ConversationState, EmotionSignal, MovieId, PreferenceFacts,
        ScoredCandidate,
    },
    services::{
        preferences::extract_preferences,
        questions::next_question,
        random::RandomSource,
        recommendations::{RecommendationRequest, Recommender},
    },
};

/// How a turn changes the stored preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceUpdate {
    Keep,
    /// Overlay the extracted kinds
    Merge,
    /// Replace wholesale with what this message says, even if that is nothing
    Replace,
    /// Replace when the message names a genre, merge otherwise
    ReplaceIfGenres,
    /// Forget preferences and asked questions
    Clear,
}

/// What a turn does after updating preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Run the recommendation pipeline
    Fetch { force_new: bool },
    /// Recommend once two kinds are known or the questions run out, otherwise ask
    Gather,
    /// Ask a fresh clarifying question
    Ask,
    /// Thank the user and offer a choice
    Acknowledge,
    /// Reply with a generic prompt
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub update: PreferenceUpdate,
    pub step: Step,
    /// Phase entered when the turn does not fetch. Fetching always lands in Recommending.
    pub next: ConversationPhase,
}

const fn to(update: PreferenceUpdate, step: Step, next: ConversationPhase) -> Transition {
    Transition { update, step, next }
}

/// The dialog's transition table
pub fn transition(phase: ConversationPhase, intent: Intent) -> Transition {
    use ConversationPhase::*;
    use PreferenceUpdate::*;

    match (phase, intent) {
        (Greeting | GatheringPreferences, Intent::RecommendNow) => {
            to(Merge, Step::Fetch { force_new: false }, Recommending)
        }
        (Greeting | GatheringPreferences, _) => to(Merge, Step::Gather, GatheringPreferences),

        (Recommending, Intent::ChangeGenre) => {
            to(Replace, Step::Fetch { force_new: true }, Recommending)
        }
        (Recommending, Intent::ShowMore) => {
            to(Keep, Step::Fetch { force_new: true }, Recommending)
        }
        (Recommending, Intent::Positive) => to(Keep, Step::Acknowledge, FollowUp),
        (Recommending, Intent::NewPreferences) => {
            to(ReplaceIfGenres, Step::Fetch { force_new: false }, Recommending)
        }
        (Recommending, _) => to(Keep, Step::Fallback, Recommending),

        (FollowUp, Intent::Similar) => to(Keep, Step::Fetch { force_new: false }, Recommending),
        (FollowUp, Intent::ChangeDirection) => to(Clear, Step::Ask, GatheringPreferences),
        (FollowUp, Intent::NewPreferences) => {
            to(Replace, Step::Fetch { force_new: false }, Recommending)
        }
        (FollowUp, _) => to(Keep, Step::Fetch { force_new: false }, Recommending),
    }
}

/// Resolution of a turn's step
enum Outcome {
    Reply(String),
    Fetch { lead: String, force_new: bool },
}

/// One incoming chat message
#[derive(Debug, Clone, Default)]
pub struct ChatTurn {
    pub conversation_id: Option<String>,
    pub user_id: Option<String>,
    pub message: String,
    pub emotions: Option<EmotionSignal>,
    /// Caller asks for results disjoint from the previous batch
    pub force_new: bool,
}

/// The bot's answer to one turn
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub utterance: String,
    pub recommendations: Vec<ScoredCandidate>,
    pub conversation_id: String,
    pub state: ConversationPhase,
    pub preferences: PreferenceFacts,
    pub suggestion_chips: &'static [&'static str],
    pub has_emotion_data: bool,
}

/// Drives conversations turn by turn
pub struct ConversationEngine {
    store: Arc<ConversationStore>,
    recommender: Arc<Recommender>,
    random: Arc<dyn RandomSource>,
    limit: usize,
}

impl ConversationEngine {
    pub fn new(
        store: Arc<ConversationStore>,
        recommender: Arc<Recommender>,
        random: Arc<dyn RandomSource>,
        limit: usize,
    ) -> Self {
        Self {
            store,
            recommender,
            random,
            limit,
        }
    }

    /// Processes one message and stores the updated conversation.
    ///
    /// Input is validated before anything is read or written. An unreachable catalog never
    /// fails the turn; it produces an empty batch and an apology. Other errors propagate
    /// and leave the stored conversation untouched.
    pub async fn process_message(&self, turn: ChatTurn) -> AppResult<ChatReply> {
        let message = turn.message.trim();
        if message.is_empty() {
            return Err(AppError::Validation("Message must not be empty".to_string()));
        }
        let emotions = turn.emotions.filter(|signal| !signal.is_empty());
        let has_emotion_data = emotions.is_some();

        let mut state = match turn.conversation_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => self
                .store
                .get(id)
                .await
                .unwrap_or_else(|| ConversationState::new(id.to_string())),
            _ => ConversationState::new(ConversationState::generate_id(turn.user_id.as_deref())),
        };

        let lower = message.to_lowercase();
        let repeated = state.last_message.as_deref() == Some(message);
        let facts = extract_preferences(&lower);
        let intent = classify(state.phase, &lower, &facts);
        let Transition { update, step, next } = transition(state.phase, intent);

        tracing::debug!(
            conversation_id = %state.id,
            phase = ?state.phase,
            intent = ?intent,
            step = ?step,
            "Classified message"
        );

        let lead_for_new_preferences = match update {
            PreferenceUpdate::Keep => None,
            PreferenceUpdate::Merge => {
                state.preferences.merge(facts);
                None
            }
            PreferenceUpdate::Replace => {
                state.preferences = facts;
                Some(replies::replaced_preferences(&state.preferences))
            }
            PreferenceUpdate::ReplaceIfGenres => {
                if facts.has_genres() {
                    state.preferences = facts;
                    Some(replies::new_genre(&state.preferences))
                } else {
                    state.preferences.merge(facts);
                    Some(replies::UPDATED_PREFERENCES.to_string())
                }
            }
            PreferenceUpdate::Clear => {
                state.preferences = PreferenceFacts::default();
                state.asked_questions.clear();
                None
            }
        };

        let outcome = match step {
            Step::Fetch { force_new } => {
                let lead = match intent {
                    Intent::RecommendNow => replies::RECOMMEND_NOW.to_string(),
                    Intent::ChangeGenre => replies::CHANGE_GENRE.to_string(),
                    Intent::ShowMore => replies::SHOW_MORE.to_string(),
                    Intent::Similar => replies::SIMILAR.to_string(),
                    _ => lead_for_new_preferences
                        .unwrap_or_else(|| replies::FOLLOW_UP_FALLBACK.to_string()),
                };
                Outcome::Fetch { lead, force_new }
            }
            Step::Gather if state.preferences.known_count() >= 2 => Outcome::Fetch {
                lead: replies::ENOUGH_INFORMATION.to_string(),
                force_new: false,
            },
            Step::Gather | Step::Ask => {
                match next_question(
                    &state.preferences,
                    has_emotion_data,
                    &state.asked_questions,
                    self.random.as_ref(),
                ) {
                    Some(question) => {
                        state.mark_asked(question.category);
                        if step == Step::Ask {
                            Outcome::Reply(replies::change_direction(question.text))
                        } else {
                            Outcome::Reply(replies::question(&state.preferences, question.text))
                        }
                    }
                    None => Outcome::Fetch {
                        lead: replies::QUESTIONS_EXHAUSTED.to_string(),
                        force_new: false,
                    },
                }
            }
            Step::Acknowledge => Outcome::Reply(replies::POSITIVE.to_string()),
            Step::Fallback => Outcome::Reply(replies::fallback(self.random.as_ref())),
        };

        let mut recommendations = Vec::new();
        let utterance = match outcome {
            Outcome::Reply(text) => {
                state.phase = next;
                text
            }
            Outcome::Fetch { lead, force_new } => {
                let force_new = force_new || turn.force_new || repeated;
                let (text, batch) = self
                    .recommend(&mut state, emotions.as_ref(), &lead, force_new)
                    .await?;
                recommendations = batch;
                state.phase = ConversationPhase::Recommending;
                text
            }
        };

        state.touch(message);
        self.store.put(state.clone()).await;
        self.store.evict_overflow().await;

        tracing::info!(
            conversation_id = %state.id,
            phase = ?state.phase,
            messages = state.message_count,
            recommendations = recommendations.len(),
            "Chat turn processed"
        );

        Ok(ChatReply {
            utterance,
            recommendations,
            conversation_id: state.id,
            state: state.phase,
            suggestion_chips: replies::suggestion_chips(state.phase),
            preferences: state.preferences,
            has_emotion_data,
        })
    }

    /// Runs the pipeline for a turn and builds the reply around the outcome.
    ///
    /// The previous batch is only excluded on force-new turns. A non-empty batch replaces
    /// the remembered ids.
    async fn recommend(
        &self,
        state: &mut ConversationState,
        emotions: Option<&EmotionSignal>,
        lead: &str,
        force_new: bool,
    ) -> AppResult<(String, Vec<ScoredCandidate>)> {
        let exclude: &[MovieId] = if force_new {
            state.last_recommended_ids.as_slice()
        } else {
            &[]
        };

        let result = self
            .recommender
            .recommend(RecommendationRequest {
                preferences: &state.preferences,
                emotions,
                exclude,
                force_new,
                limit: self.limit,
            })
            .await;

        match result {
            Ok(batch) if batch.movies.is_empty() => {
                Ok((replies::NO_RESULTS.to_string(), Vec::new()))
            }
            Ok(batch) => {
                state.last_recommended_ids = batch.movies.iter().map(|m| m.id).collect();
                let mood = emotions.and(batch.fused.dominant());
                let text =
                    replies::batch_summary(lead, batch.movies.len(), &state.preferences, mood);
                Ok((text, batch.movies))
            }
            Err(e) if e.is_upstream() => {
                tracing::warn!(
                    conversation_id = %state.id,
                    error = %e,
                    "Recommendations unavailable for this turn"
                );
                Ok((replies::CATALOG_UNAVAILABLE.to_string(), Vec::new()))
            }
            Err(e) => Err(e),
        }
    }

    /// Forgets a conversation. Unknown ids are not an error.
    pub async fn reset_conversation(&self, conversation_id: &str) -> bool {
        let existed = self.store.remove(conversation_id).await;
        tracing::info!(
            conversation_id = %conversation_id,
            existed = existed,
            "Conversation reset"
        );
        existed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmotionLabel, QuestionCategory, RawMovie};
    use crate::services::providers::MockCandidateSource;
    use crate::services::random::FixedRandom;

    /// Twenty movies per page, ids unique across pages, tagged with the first genre asked for
    fn catalog_page(page: u32, genre: Option<u32>) -> Vec<RawMovie> {
        (1..=20)
            .map(|i| {
                let id = MovieId::from(page) * 100 + i;
                RawMovie {
                    id,
                    title: format!("Movie {}", id),
                    genre_ids: genre.into_iter().collect(),
                    overview: Some("Plot".to_string()),
                    vote_average: 7.5,
                    release_date: Some("2012-05-04".to_string()),
                    poster_path: Some(format!("/{}.jpg", id)),
                    backdrop_path: None,
                    popularity: 100.0 - i as f64,
                }
            })
            .collect()
    }

    fn healthy_source() -> MockCandidateSource {
        let mut source = MockCandidateSource::new();
        source
            .expect_discover()
            .returning(|q| Ok(catalog_page(q.page, q.genres.first().copied())));
        source
            .expect_trending()
            .returning(|limit| Ok(catalog_page(9, None).into_iter().take(limit).collect()));
        source
    }

    fn failing_source() -> MockCandidateSource {
        let mut source = MockCandidateSource::new();
        source
            .expect_discover()
            .returning(|_| Err(AppError::Upstream("TMDB returned status 500".to_string())));
        source
            .expect_trending()
            .returning(|_| Err(AppError::Upstream("TMDB returned status 500".to_string())));
        source
    }

    fn engine_with(source: MockCandidateSource) -> (ConversationEngine, Arc<ConversationStore>) {
        engine_with_random(source, FixedRandom { index: 0, value: 1 })
    }

    fn engine_with_random(
        source: MockCandidateSource,
        random: FixedRandom,
    ) -> (ConversationEngine, Arc<ConversationStore>) {
        let random: Arc<dyn RandomSource> = Arc::new(random);
        let store = Arc::new(ConversationStore::default());
        let recommender = Arc::new(Recommender::new(Arc::new(source), random.clone()));
        (
            ConversationEngine::new(store.clone(), recommender, random, 6),
            store,
        )
    }

    fn turn(conversation_id: Option<&str>, message: &str) -> ChatTurn {
        ChatTurn {
            conversation_id: conversation_id.map(str::to_string),
            user_id: Some("user-1".to_string()),
            message: message.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_transition_table_targets() {
        use ConversationPhase::*;
        assert_eq!(transition(Greeting, Intent::RecommendNow).next, Recommending);
        assert_eq!(transition(Greeting, Intent::Unrecognised).step, Step::Gather);
        assert_eq!(
            transition(Recommending, Intent::ShowMore).step,
            Step::Fetch { force_new: true }
        );
        assert_eq!(transition(Recommending, Intent::Positive).next, FollowUp);
        assert_eq!(transition(Recommending, Intent::Unrecognised).step, Step::Fallback);
        assert_eq!(
            transition(FollowUp, Intent::Similar).step,
            Step::Fetch { force_new: false }
        );
        assert_eq!(
            transition(FollowUp, Intent::ChangeDirection),
            Transition {
                update: PreferenceUpdate::Clear,
                step: Step::Ask,
                next: GatheringPreferences
            }
        );
        assert_eq!(
            transition(FollowUp, Intent::Unrecognised).step,
            Step::Fetch { force_new: false }
        );
        assert_eq!(
            transition(Recommending, Intent::ChangeGenre),
            Transition {
                update: PreferenceUpdate::Replace,
                step: Step::Fetch { force_new: true },
                next: Recommending
            }
        );
        assert_eq!(
            transition(FollowUp, Intent::NewPreferences),
            Transition {
                update: PreferenceUpdate::Replace,
                step: Step::Fetch { force_new: false },
                next: Recommending
            }
        );
    }

    #[tokio::test]
    async fn test_recommend_action_movies_in_one_turn() {
        let (engine, store) = engine_with(healthy_source());

        let reply = engine
            .process_message(turn(None, "recommend action movies"))
            .await
            .unwrap();

        assert_eq!(reply.state, ConversationPhase::Recommending);
        assert!(reply.preferences.genre_ids().contains(&28));
        assert_eq!(reply.recommendations.len(), 6);
        assert!(reply.conversation_id.starts_with("user-1-"));
        assert!(reply.utterance.starts_with(replies::RECOMMEND_NOW));
        assert_eq!(reply.suggestion_chips[0], "Show more");

        let stored = store.get(&reply.conversation_id).await.unwrap();
        assert_eq!(stored.message_count, 1);
        assert_eq!(stored.last_recommended_ids.len(), 6);
    }

    #[tokio::test]
    async fn test_gathering_asks_then_recommends() {
        let (engine, _) = engine_with(healthy_source());

        let first = engine.process_message(turn(Some("c1"), "hello")).await.unwrap();
        assert_eq!(first.state, ConversationPhase::GatheringPreferences);
        assert!(first.utterance.starts_with("I'd love to help! What type of movies"));
        assert!(first.recommendations.is_empty());

        let second = engine.process_message(turn(Some("c1"), "comedy")).await.unwrap();
        assert_eq!(second.state, ConversationPhase::GatheringPreferences);
        assert_eq!(
            second.utterance,
            "Got it! I see you like Comedy. How are you feeling right now?"
        );

        let third = engine
            .process_message(turn(Some("c1"), "I feel happy"))
            .await
            .unwrap();
        assert_eq!(third.state, ConversationPhase::Recommending);
        assert_eq!(third.preferences.mood, Some(EmotionLabel::Happy));
        assert!(third.utterance.starts_with(replies::ENOUGH_INFORMATION));
        assert_eq!(third.recommendations.len(), 6);
    }

    #[tokio::test]
    async fn test_emotion_signal_skips_mood_question() {
        let (engine, store) = engine_with(healthy_source());
        let mut first = turn(Some("c2"), "comedy");
        first.emotions = Some([(EmotionLabel::Happy, 0.9)].into_iter().collect());

        let reply = engine.process_message(first).await.unwrap();
        assert!(reply.has_emotion_data);
        assert!(reply.utterance.ends_with("Any favorite actors or directors?"));

        let stored = store.get("c2").await.unwrap();
        assert_eq!(stored.asked_questions, vec![QuestionCategory::Specifics]);
    }

    #[tokio::test]
    async fn test_show_more_excludes_previous_batch() {
        let (engine, _) = engine_with(healthy_source());

        let first = engine
            .process_message(turn(Some("c3"), "recommend action movies"))
            .await
            .unwrap();
        let second = engine
            .process_message(turn(Some("c3"), "show me more"))
            .await
            .unwrap();

        assert_eq!(second.state, ConversationPhase::Recommending);
        assert_eq!(second.recommendations.len(), 6);
        assert!(second.utterance.starts_with(replies::SHOW_MORE));
        for movie in &second.recommendations {
            assert!(first.recommendations.iter().all(|seen| seen.id != movie.id));
        }
    }

    #[tokio::test]
    async fn test_repeated_message_is_treated_as_force_new() {
        let (engine, _) = engine_with(healthy_source());

        let first = engine
            .process_message(turn(Some("c4"), "recommend horror"))
            .await
            .unwrap();
        let again = engine
            .process_message(turn(Some("c4"), "horror"))
            .await
            .unwrap();
        let repeat = engine
            .process_message(turn(Some("c4"), "horror"))
            .await
            .unwrap();

        // Without force-new the same page comes back
        assert_eq!(first.recommendations[0].id, again.recommendations[0].id);
        for movie in &repeat.recommendations {
            assert!(again.recommendations.iter().all(|seen| seen.id != movie.id));
        }
    }

    #[tokio::test]
    async fn test_positive_then_different_restarts_gathering() {
        let (engine, store) = engine_with(healthy_source());

        engine
            .process_message(turn(Some("c5"), "recommend a thriller"))
            .await
            .unwrap();
        let liked = engine
            .process_message(turn(Some("c5"), "I love these"))
            .await
            .unwrap();
        assert_eq!(liked.state, ConversationPhase::FollowUp);
        assert_eq!(liked.utterance, replies::POSITIVE);
        assert!(liked.recommendations.is_empty());

        let different = engine
            .process_message(turn(Some("c5"), "something different"))
            .await
            .unwrap();
        assert_eq!(different.state, ConversationPhase::GatheringPreferences);
        assert!(different.preferences.is_empty());
        assert!(different
            .utterance
            .starts_with("Sure! Let's find something different. What type of movies"));

        let stored = store.get("c5").await.unwrap();
        assert_eq!(stored.asked_questions, vec![QuestionCategory::Genres]);
    }

    #[tokio::test]
    async fn test_new_genre_replaces_preferences() {
        let (engine, _) = engine_with(healthy_source());

        engine
            .process_message(turn(Some("c6"), "recommend comedy from 1995"))
            .await
            .unwrap();
        let reply = engine
            .process_message(turn(Some("c6"), "horror instead"))
            .await
            .unwrap();

        assert_eq!(reply.preferences.genre_ids(), &[27]);
        assert_eq!(reply.preferences.year, None);
        assert!(reply
            .utterance
            .starts_with("Great choice! Let me find some Horror movies for you."));
    }

    #[tokio::test]
    async fn test_unrecognised_message_while_recommending_does_not_fetch() {
        let (engine, store) = engine_with(healthy_source());

        let first = engine
            .process_message(turn(Some("c7"), "recommend action"))
            .await
            .unwrap();
        let reply = engine.process_message(turn(Some("c7"), "hmm")).await.unwrap();

        assert_eq!(reply.state, ConversationPhase::Recommending);
        assert!(reply.recommendations.is_empty());
        assert!(reply.utterance.starts_with("I'm here to help you find great movies!"));

        let stored = store.get("c7").await.unwrap();
        let first_ids: Vec<MovieId> = first.recommendations.iter().map(|m| m.id).collect();
        assert_eq!(stored.last_recommended_ids, first_ids);
    }

    #[tokio::test]
    async fn test_upstream_failure_still_answers_and_commits() {
        let (engine, store) = engine_with(failing_source());

        let reply = engine
            .process_message(turn(Some("c8"), "recommend action movies"))
            .await
            .unwrap();

        assert!(reply.recommendations.is_empty());
        assert_eq!(reply.utterance, replies::CATALOG_UNAVAILABLE);
        assert_eq!(reply.state, ConversationPhase::Recommending);

        let stored = store.get("c8").await.unwrap();
        assert_eq!(stored.message_count, 1);
        assert!(stored.last_recommended_ids.is_empty());
    }

    fn ids(movies: &[ScoredCandidate]) -> Vec<MovieId> {
        movies.iter().map(|m| m.id).collect()
    }

    #[tokio::test]
    async fn test_different_genre_resets_preferences_and_excludes_last_batch() {
        let mut source = MockCandidateSource::new();
        source
            .expect_discover()
            .withf(|q| q.genres == vec![28] && q.year == Some(2014) && q.page == 1)
            .times(1)
            .returning(|q| Ok(catalog_page(q.page, Some(28))));
        // Force-new lands on the pinned page 3; ids overlap the first batch on purpose
        source
            .expect_discover()
            .withf(|q| q.genres == vec![35] && q.year.is_none() && q.page == 3)
            .times(1)
            .returning(|_| Ok(catalog_page(1, Some(35))));
        let (engine, store) = engine_with_random(source, FixedRandom { index: 0, value: 3 });

        let first = engine
            .process_message(turn(Some("c11"), "recommend action movies from 2014"))
            .await
            .unwrap();
        let reply = engine
            .process_message(turn(Some("c11"), "a different genre, comedy please"))
            .await
            .unwrap();

        assert_eq!(ids(&first.recommendations), vec![101, 102, 103, 104, 105, 106]);
        assert_eq!(
            reply.preferences,
            PreferenceFacts {
                genres: Some(vec![35]),
                ..Default::default()
            }
        );
        assert_eq!(ids(&reply.recommendations), vec![107, 108, 109, 110, 111, 112]);
        assert!(reply.utterance.starts_with(replies::CHANGE_GENRE));

        let stored = store.get("c11").await.unwrap();
        assert_eq!(stored.last_recommended_ids, ids(&reply.recommendations));
    }

    #[tokio::test]
    async fn test_new_preferences_after_follow_up_replace_instead_of_merge() {
        let mut source = MockCandidateSource::new();
        source
            .expect_discover()
            .withf(|q| q.genres == vec![35] && q.year == Some(2014))
            .times(1)
            .returning(|q| Ok(catalog_page(q.page, Some(35))));
        source
            .expect_discover()
            .withf(|q| q.genres == vec![27] && q.year.is_none() && q.page == 1)
            .times(1)
            .returning(|q| Ok(catalog_page(q.page, Some(27))));
        let (engine, _) = engine_with(source);

        engine
            .process_message(turn(Some("c12"), "recommend comedy from 2014"))
            .await
            .unwrap();
        let liked = engine
            .process_message(turn(Some("c12"), "I love these"))
            .await
            .unwrap();
        assert_eq!(liked.state, ConversationPhase::FollowUp);

        let reply = engine
            .process_message(turn(Some("c12"), "horror movies"))
            .await
            .unwrap();

        assert_eq!(reply.state, ConversationPhase::Recommending);
        assert_eq!(
            reply.preferences,
            PreferenceFacts {
                genres: Some(vec![27]),
                ..Default::default()
            }
        );
        assert_eq!(reply.recommendations.len(), 6);
        assert!(reply
            .utterance
            .starts_with("Excellent! Let me find some Horror movies for you."));
    }

    #[tokio::test]
    async fn test_unrecognised_follow_up_still_fetches() {
        let mut source = MockCandidateSource::new();
        source
            .expect_discover()
            .withf(|q| q.genres == vec![28] && q.page == 1)
            .times(2)
            .returning(|q| Ok(catalog_page(q.page, Some(28))));
        let (engine, _) = engine_with(source);

        engine
            .process_message(turn(Some("c13"), "recommend action"))
            .await
            .unwrap();
        engine
            .process_message(turn(Some("c13"), "I love these"))
            .await
            .unwrap();
        let reply = engine
            .process_message(turn(Some("c13"), "ok then"))
            .await
            .unwrap();

        assert_eq!(reply.state, ConversationPhase::Recommending);
        assert_eq!(reply.recommendations.len(), 6);
        assert_eq!(reply.preferences.genre_ids(), &[28]);
        assert!(reply.utterance.starts_with(replies::FOLLOW_UP_FALLBACK));
    }

    #[tokio::test]
    async fn test_similar_fetches_without_force_new() {
        let mut source = MockCandidateSource::new();
        // A force-new fetch would ask for the pinned page 3
        source
            .expect_discover()
            .withf(|q| q.genres == vec![28] && q.page == 1)
            .times(2)
            .returning(|q| Ok(catalog_page(q.page, Some(28))));
        let (engine, _) = engine_with_random(source, FixedRandom { index: 0, value: 3 });

        let first = engine
            .process_message(turn(Some("c14"), "recommend action"))
            .await
            .unwrap();
        engine
            .process_message(turn(Some("c14"), "I love these"))
            .await
            .unwrap();
        let reply = engine
            .process_message(turn(Some("c14"), "more like these"))
            .await
            .unwrap();

        assert_eq!(reply.state, ConversationPhase::Recommending);
        assert!(reply.utterance.starts_with(replies::SIMILAR));
        assert_eq!(ids(&reply.recommendations), ids(&first.recommendations));
    }

    #[tokio::test]
    async fn test_non_catalog_error_fails_the_turn() {
        let mut source = MockCandidateSource::new();
        source
            .expect_discover()
            .returning(|_| Err(AppError::Internal("response cache poisoned".to_string())));
        source.expect_trending().never();
        let (engine, store) = engine_with(source);

        let result = engine
            .process_message(turn(Some("c15"), "recommend action movies"))
            .await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        assert!(store.get("c15").await.is_none());
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected_without_state_change() {
        let (engine, store) = engine_with(healthy_source());

        let result = engine.process_message(turn(Some("c9"), "   ")).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(store.get("c9").await.is_none());
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let (engine, store) = engine_with(healthy_source());
        engine.process_message(turn(Some("c10"), "hello")).await.unwrap();

        assert!(engine.reset_conversation("c10").await);
        assert!(!engine.reset_conversation("c10").await);
        assert!(store.get("c10").await.is_none());

        let fresh = engine.process_message(turn(Some("c10"), "hello")).await.unwrap();
        assert_eq!(fresh.state, ConversationPhase::GatheringPreferences);
    }
}
