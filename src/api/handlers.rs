use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::AppState;
use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{genre_name, ConversationState, EmotionLabel, EmotionSignal, ScoredCandidate, GENRE_NAMES},
    services::{
        recommendations::{EmotionRecommendations, MixedRecommendations},
        ChatReply, ChatTurn,
    },
};

const DEFAULT_EMOTION_LIMIT: usize = 10;
const DEFAULT_MIX_LIMIT: usize = 9;
const MAX_LIMIT: usize = 20;

// Request/Response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageRequest {
    #[serde(default)]
    pub message: String,
    pub conversation_id: Option<String>,
    pub user_id: Option<String>,
    /// Emotion label to confidence in [0, 1]
    pub emotions: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub force_new: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequest {
    pub conversation_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub message: &'static str,
    pub new_conversation_id: String,
}

#[derive(Debug, Deserialize)]
pub struct EmotionRecommendationRequest {
    pub emotions: Option<BTreeMap<String, f64>>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixRecommendationRequest {
    pub emotion_mix: Option<BTreeMap<String, f64>>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieListResponse {
    pub movies: Vec<ScoredCandidate>,
    pub total_movies: usize,
}

impl From<Vec<ScoredCandidate>> for MovieListResponse {
    fn from(movies: Vec<ScoredCandidate>) -> Self {
        Self {
            total_movies: movies.len(),
            movies,
        }
    }
}

/// Clamps a requested page size to `1..=MAX_LIMIT`
fn clamp_limit(limit: Option<usize>, default: usize) -> usize {
    limit.unwrap_or(default).clamp(1, MAX_LIMIT)
}

fn parse_signal(raw: Option<BTreeMap<String, f64>>, field: &str) -> AppResult<EmotionSignal> {
    match raw {
        Some(raw) => EmotionSignal::from_raw(raw),
        None => Err(AppError::Validation(format!("{} data is required", field))),
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Processes one chat message
pub async fn chat_message(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<ChatMessageRequest>,
) -> AppResult<Json<ChatReply>> {
    let emotions = request.emotions.map(EmotionSignal::from_raw).transpose()?;

    tracing::info!(
        request_id = %request_id,
        conversation_id = ?request.conversation_id,
        has_emotions = emotions.is_some(),
        "Chat message received"
    );

    let reply = state
        .engine
        .process_message(ChatTurn {
            conversation_id: request.conversation_id,
            user_id: request.user_id,
            message: request.message,
            emotions,
            force_new: request.force_new,
        })
        .await?;

    Ok(Json(reply))
}

/// Forgets a conversation and hands out a fresh id
pub async fn reset_conversation(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<ResetRequest>,
) -> Json<ResetResponse> {
    if let Some(id) = request.conversation_id.as_deref() {
        state.engine.reset_conversation(id).await;
    }
    tracing::debug!(request_id = %request_id, "Reset handled");

    Json(ResetResponse {
        message: "Conversation reset successfully",
        new_conversation_id: ConversationState::generate_id(request.user_id.as_deref()),
    })
}

/// Recommendations for the dominant emotion of a signal
pub async fn recommend_by_emotion(
    State(state): State<AppState>,
    Json(request): Json<EmotionRecommendationRequest>,
) -> AppResult<Json<EmotionRecommendations>> {
    let signal = parse_signal(request.emotions, "Emotion")?;
    let limit = clamp_limit(request.limit, DEFAULT_EMOTION_LIMIT);
    let recommendations = state.recommender.by_dominant_emotion(&signal, limit).await?;
    Ok(Json(recommendations))
}

/// Scored recommendations for a blend of emotions
pub async fn recommend_by_mix(
    State(state): State<AppState>,
    Json(request): Json<MixRecommendationRequest>,
) -> AppResult<Json<MixedRecommendations>> {
    let signal = parse_signal(request.emotion_mix, "Emotion mix")?;
    let limit = clamp_limit(request.limit, DEFAULT_MIX_LIMIT);
    let recommendations = state.recommender.by_emotion_mix(&signal, limit).await?;
    Ok(Json(recommendations))
}

/// Movies for a single named emotion
pub async fn movies_by_emotion(
    State(state): State<AppState>,
    Path(emotion): Path<String>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Value>> {
    let emotion: EmotionLabel = emotion.parse()?;
    let movies = state
        .recommender
        .by_emotion(emotion, clamp_limit(params.limit, DEFAULT_EMOTION_LIMIT))
        .await?;

    Ok(Json(json!({
        "emotion": emotion,
        "genres": emotion.genres().iter().filter_map(|id| genre_name(*id)).collect::<Vec<_>>(),
        "totalMovies": movies.len(),
        "movies": movies,
    })))
}

/// Currently trending movies
pub async fn trending(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<MovieListResponse>> {
    let movies = state
        .recommender
        .trending(clamp_limit(params.limit, DEFAULT_EMOTION_LIMIT))
        .await?;
    Ok(Json(movies.into()))
}

/// Emotion labels the recommender understands and the genres behind them
pub async fn supported_emotions() -> Json<Value> {
    let emotions: Vec<Value> = EmotionLabel::recommendable()
        .map(|emotion| {
            json!({
                "emotion": emotion,
                "genreIds": emotion.genres(),
                "genres": emotion.genres().iter().filter_map(|id| genre_name(*id)).collect::<Vec<_>>(),
            })
        })
        .collect();

    let genre_names: BTreeMap<String, &str> = GENRE_NAMES
        .iter()
        .map(|(id, name)| (id.to_string(), *name))
        .collect();

    Json(json!({
        "emotions": emotions,
        "genreNames": genre_names,
        "excludedEmotions": [EmotionLabel::Neutral],
    }))
}
