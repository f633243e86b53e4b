use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use moodreel_api::{
    api::{create_router, AppState},
    db::ConversationStore,
    error::{AppError, AppResult},
    models::{DiscoverQuery, RawMovie},
    services::{CandidateSource, RandomSource},
};

/// First phrasing for every reply, page 1 for every force-new fetch
struct FirstChoice;

impl RandomSource for FirstChoice {
    fn index(&self, _len: usize) -> usize {
        0
    }

    fn between(&self, low: u32, _high: u32) -> u32 {
        low
    }
}

/// In-memory catalog: twenty movies per page, ids unique across pages
struct StaticCatalog {
    reachable: bool,
}

fn catalog_page(page: u32, genres: &[u32]) -> Vec<RawMovie> {
    (1..=20)
        .map(|i| {
            let id = u64::from(page) * 100 + i;
            RawMovie {
                id,
                title: format!("Catalog Movie {}", id),
                genre_ids: genres.to_vec(),
                overview: Some("A movie from the test catalog".to_string()),
                vote_average: 7.2,
                release_date: Some("2016-09-09".to_string()),
                poster_path: Some(format!("/poster{}.jpg", id)),
                backdrop_path: Some(format!("/backdrop{}.jpg", id)),
                popularity: 50.0 - i as f64,
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl CandidateSource for StaticCatalog {
    async fn discover(&self, query: &DiscoverQuery) -> AppResult<Vec<RawMovie>> {
        if !self.reachable {
            return Err(AppError::Upstream("TMDB API returned status 503".to_string()));
        }
        Ok(catalog_page(query.page, &query.genres))
    }

    async fn trending(&self, limit: usize) -> AppResult<Vec<RawMovie>> {
        if !self.reachable {
            return Err(AppError::Upstream("TMDB API returned status 503".to_string()));
        }
        Ok(catalog_page(50, &[35]).into_iter().take(limit).collect())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

fn create_test_server_with(reachable: bool) -> TestServer {
    let state = AppState::new(
        Arc::new(StaticCatalog { reachable }),
        Arc::new(FirstChoice),
        ConversationStore::default(),
        6,
    );
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

fn create_test_server() -> TestServer {
    create_test_server_with(true)
}

fn ids(movies: &Value) -> Vec<u64> {
    movies
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(!response.header("x-request-id").is_empty());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server();
    let request_id = "5f0c6d7e-8a9b-4c1d-9e2f-3a4b5c6d7e8f";

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static(request_id),
        )
        .await;

    assert_eq!(response.header("x-request-id"), request_id);
}

#[tokio::test]
async fn test_chat_recommend_in_one_turn() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/chat/message")
        .json(&json!({
            "message": "recommend action movies",
            "userId": "42"
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["state"], "recommending");
    assert_eq!(body["preferences"]["genres"], json!([28]));
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 6);
    assert_eq!(body["suggestionChips"][0], "Show more");
    assert_eq!(body["hasEmotionData"], false);
    assert!(body["conversationId"].as_str().unwrap().starts_with("42-"));

    let first = &body["recommendations"][0];
    assert_eq!(first["genre"], "Action");
    assert_eq!(first["recommendationReason"], "Based on your preferences");
    assert!(first["posterUrl"]
        .as_str()
        .unwrap()
        .starts_with("https://image.tmdb.org/t/p/w500/"));
}

#[tokio::test]
async fn test_chat_show_more_excludes_previous_batch() {
    let server = create_test_server();

    let first: Value = server
        .post("/api/v1/chat/message")
        .json(&json!({ "message": "recommend a comedy", "conversationId": "conv-more" }))
        .await
        .json();
    let second: Value = server
        .post("/api/v1/chat/message")
        .json(&json!({ "message": "show me more", "conversationId": "conv-more" }))
        .await
        .json();

    let seen = ids(&first["recommendations"]);
    let fresh = ids(&second["recommendations"]);
    assert_eq!(fresh.len(), 6);
    assert!(fresh.iter().all(|id| !seen.contains(id)));
}

#[tokio::test]
async fn test_chat_with_emotions_scores_movies() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/chat/message")
        .json(&json!({
            "message": "suggest something",
            "emotions": { "happy": 0.8, "neutral": 0.2 }
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["hasEmotionData"], true);
    let first = &body["recommendations"][0];
    assert_eq!(first["matchingEmotions"], json!(["happy"]));
    assert_eq!(first["recommendationReason"], "Recommended for your happy mood");
    assert!(body["utterance"]
        .as_str()
        .unwrap()
        .contains("your current happy mood"));
}

#[tokio::test]
async fn test_chat_rejects_empty_message() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/chat/message")
        .json(&json!({ "message": "   " }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_chat_rejects_malformed_emotions() {
    let server = create_test_server();

    let unknown = server
        .post("/api/v1/chat/message")
        .json(&json!({ "message": "hi", "emotions": { "bored": 0.5 } }))
        .await;
    unknown.assert_status(StatusCode::BAD_REQUEST);

    let out_of_range = server
        .post("/api/v1/chat/message")
        .json(&json!({ "message": "hi", "emotions": { "happy": 1.5 } }))
        .await;
    out_of_range.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_survives_catalog_outage() {
    let server = create_test_server_with(false);

    let response = server
        .post("/api/v1/chat/message")
        .json(&json!({ "message": "recommend horror" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["recommendations"], json!([]));
    assert!(body["utterance"].as_str().unwrap().starts_with("Sorry"));
}

#[tokio::test]
async fn test_reset_is_idempotent() {
    let server = create_test_server();

    server
        .post("/api/v1/chat/message")
        .json(&json!({ "message": "hello", "conversationId": "conv-reset" }))
        .await
        .assert_status_ok();

    for _ in 0..2 {
        let response = server
            .post("/api/v1/chat/reset")
            .json(&json!({ "conversationId": "conv-reset", "userId": "7" }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["message"], "Conversation reset successfully");
        assert!(body["newConversationId"].as_str().unwrap().starts_with("7-"));
    }
}

#[tokio::test]
async fn test_dominant_emotion_recommendations() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "emotions": { "happy": 0.7, "sad": 0.2, "neutral": 0.9 } }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["dominantEmotion"], "happy");
    assert_eq!(body["confidence"], 0.7);
    assert_eq!(
        body["recommendedGenres"],
        json!(["Comedy", "Family", "Music", "Animation"])
    );
    assert_eq!(body["movies"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_recommendations_require_emotions() {
    let server = create_test_server();
    let response = server.post("/api/v1/recommendations").json(&json!({})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_mixed_emotion_recommendations() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/recommendations/mix")
        .json(&json!({ "emotionMix": { "sad": 0.5, "angry": 0.5 } }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["analysisType"], "mixed_emotions");
    assert_eq!(body["emotionMix"]["sad"], 0.5);
    assert_eq!(body["emotionMix"]["angry"], 0.5);
    assert_eq!(body["movies"].as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn test_neutral_mix_falls_back_to_trending() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/recommendations/mix")
        .json(&json!({ "emotionMix": { "neutral": 1.0 } }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["analysisType"], "trending_fallback");
    assert_eq!(body["movies"][0]["emotionMatch"], "trending");
}

#[tokio::test]
async fn test_movies_by_emotion() {
    let server = create_test_server();

    let response = server.get("/api/v1/movies/emotion/angry?limit=4").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["emotion"], "angry");
    assert_eq!(body["totalMovies"], 4);
    assert_eq!(body["movies"][0]["recommendationReason"], "Movies for angry mood");

    server
        .get("/api/v1/movies/emotion/bored")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/api/v1/movies/emotion/neutral")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_trending_movies() {
    let server = create_test_server();

    let response = server.get("/api/v1/movies/trending?limit=3").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["totalMovies"], 3);
    assert_eq!(body["movies"][0]["recommendationReason"], "Currently trending");
}

#[tokio::test]
async fn test_trending_outage_is_bad_gateway() {
    let server = create_test_server_with(false);
    let response = server.get("/api/v1/movies/trending").await;
    response.assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_supported_emotions() {
    let server = create_test_server();

    let response = server.get("/api/v1/emotions/supported").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["emotions"].as_array().unwrap().len(), 6);
    assert_eq!(body["excludedEmotions"], json!(["neutral"]));
    assert_eq!(body["genreNames"]["28"], "Action");
}
