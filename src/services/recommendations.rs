use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use super::fusion::{fuse, FusedSignal, GenreSource};
use super::providers::CandidateSource;
use super::random::RandomSource;
use crate::{
    error::{AppError, AppResult},
    models::{
        genre_name, DiscoverQuery, EmotionLabel, EmotionSignal, GenreId, MovieId,
        PreferenceFacts, RawMovie, ScoredCandidate, SortOrder,
    },
};

/// Batch size for the conversational flow
pub const DEFAULT_LIMIT: usize = 6;

/// Force-new requests start from a random page in `1..=FORCE_NEW_MAX_PAGE`
const FORCE_NEW_MAX_PAGE: u32 = 5;

/// Below this many survivors of the exclusion filter, force-new requests fetch another page
const REFILL_MIN_RESULTS: usize = 3;

/// How many trending movies to pull when everything else came up empty
const TRENDING_POOL: usize = 20;

/// Accepted distance, in years, from a requested release year
const YEAR_TOLERANCE: i32 = 5;

const DIVERSITY_BONUS: f64 = 0.1;
const POPULARITY_WEIGHT: f64 = 0.001;

/// Input to the hybrid pipeline
#[derive(Debug, Clone, Copy)]
pub struct RecommendationRequest<'a> {
    pub preferences: &'a PreferenceFacts,
    pub emotions: Option<&'a EmotionSignal>,
    /// Ids the caller has already seen
    pub exclude: &'a [MovieId],
    pub force_new: bool,
    pub limit: usize,
}

/// Output of the hybrid pipeline
#[derive(Debug, Clone)]
pub struct RecommendationBatch {
    pub movies: Vec<ScoredCandidate>,
    pub fused: FusedSignal,
    /// Stage that produced the candidates; `None` when every stage came up empty
    pub stage: Option<GenreSource>,
}

/// A candidate with its emotion score, before presentation
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMovie {
    pub movie: RawMovie,
    pub emotion_score: f64,
    pub matching_emotions: Vec<EmotionLabel>,
}

impl RankedMovie {
    fn unscored(movie: RawMovie) -> Self {
        Self {
            movie,
            emotion_score: 0.0,
            matching_emotions: Vec::new(),
        }
    }

    pub fn rank_key(&self) -> f64 {
        self.emotion_score
            + DIVERSITY_BONUS * self.matching_emotions.len() as f64
            + POPULARITY_WEIGHT * self.movie.popularity
    }
}

/// Concatenates candidate lists and drops repeated ids; the first occurrence wins
pub fn merge_unique(lists: Vec<Vec<RawMovie>>) -> Vec<RawMovie> {
    let mut seen = HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter(|movie| seen.insert(movie.id))
        .collect()
}

/// Scores one movie against the fused emotion weights.
///
/// Every genre of the movie adds the weight of each weighted emotion whose genre table
/// contains it, so a movie can collect several contributions from one emotion.
pub fn score_movie(movie: RawMovie, fused: &FusedSignal) -> RankedMovie {
    let mut emotion_score = 0.0;
    let mut matching_emotions = Vec::new();

    for genre in &movie.genre_ids {
        for emotion in EmotionLabel::recommendable() {
            if !emotion.genres().contains(genre) {
                continue;
            }
            if let Some(weight) = fused.weight_of(emotion) {
                emotion_score += weight;
                if !matching_emotions.contains(&emotion) {
                    matching_emotions.push(emotion);
                }
            }
        }
    }

    RankedMovie {
        movie,
        emotion_score,
        matching_emotions,
    }
}

/// Scores and orders candidates by rank key, descending. Ties keep input order.
pub fn rank_candidates(movies: Vec<RawMovie>, fused: &FusedSignal) -> Vec<RankedMovie> {
    let mut ranked: Vec<RankedMovie> = movies.into_iter().map(|m| score_movie(m, fused)).collect();
    ranked.sort_by(|a, b| b.rank_key().total_cmp(&a.rank_key()));
    ranked
}

/// Drops candidates that miss the rating floor or the ±5 year window
fn passes_preference_filters(movie: &RawMovie, preferences: &PreferenceFacts) -> bool {
    if let Some(min_rating) = preferences.min_rating {
        if movie.vote_average < min_rating {
            return false;
        }
    }
    if let Some(year) = preferences.year {
        return movie
            .release_year()
            .is_some_and(|released| (released - year).abs() <= YEAR_TOLERANCE);
    }
    true
}

/// Candidates produced by one stage of the fallback chain
struct StageOutput {
    candidates: Vec<RankedMovie>,
    /// Every upstream call of the stage failed
    failed: bool,
}

/// Response for the dominant-emotion endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionRecommendations {
    pub dominant_emotion: EmotionLabel,
    pub confidence: f64,
    pub recommended_genres: Vec<&'static str>,
    pub movies: Vec<ScoredCandidate>,
    pub total_movies: usize,
}

/// Response for the mixed-emotion endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MixedRecommendations {
    /// Top emotions joined with " + "
    pub dominant_emotion: String,
    pub emotion_mix: BTreeMap<EmotionLabel, f64>,
    pub recommended_genres: Vec<&'static str>,
    pub movies: Vec<ScoredCandidate>,
    pub total_movies: usize,
    pub analysis_type: &'static str,
}

/// Hybrid recommendation engine over a candidate source
pub struct Recommender {
    source: Arc<dyn CandidateSource>,
    random: Arc<dyn RandomSource>,
}

impl Recommender {
    pub fn new(source: Arc<dyn CandidateSource>, random: Arc<dyn RandomSource>) -> Self {
        Self { source, random }
    }

    /// Runs the full pipeline: fusion, staged candidate fetching with fallback,
    /// exclusion, preference filters and truncation.
    ///
    /// Upstream failures are absorbed per fetch, and an upstream error is returned only when
    /// every stage that was attempted failed outright. Any other error propagates at once.
    pub async fn recommend(&self, request: RecommendationRequest<'_>) -> AppResult<RecommendationBatch> {
        let page = if request.force_new {
            self.random.between(1, FORCE_NEW_MAX_PAGE)
        } else {
            1
        };
        let fused = fuse(request.emotions, request.preferences);

        let mut attempted = 0;
        let mut failed = 0;
        let mut stage = None;
        let mut stage_genres: Vec<GenreId> = Vec::new();
        let mut candidates = Vec::new();

        if fused.source == GenreSource::Emotion {
            attempted += 1;
            let output = self.emotion_stage(&fused, page).await?;
            failed += usize::from(output.failed);
            if !output.candidates.is_empty() {
                stage = Some(GenreSource::Emotion);
                stage_genres = fused.genres.clone();
                candidates = output.candidates;
            }
        }

        if candidates.is_empty() && request.preferences.has_genres() {
            attempted += 1;
            let output = self.preference_stage(request.preferences, page).await?;
            failed += usize::from(output.failed);
            if !output.candidates.is_empty() {
                stage = Some(GenreSource::Preferences);
                stage_genres = request.preferences.genre_ids().to_vec();
                candidates = output.candidates;
            }
        }

        if candidates.is_empty() {
            attempted += 1;
            let output = self.trending_stage().await?;
            failed += usize::from(output.failed);
            if !output.candidates.is_empty() {
                stage = Some(GenreSource::Trending);
                // Refill pages stay on the fused genres when there are any
                stage_genres = fused.genres.clone();
                candidates = output.candidates;
            }
        }

        if candidates.is_empty() && failed == attempted {
            tracing::error!(stages = attempted, "Every candidate stage failed");
            return Err(AppError::Upstream(
                "No candidate source could be reached".to_string(),
            ));
        }

        let before_exclusion = candidates.len();
        candidates.retain(|c| !request.exclude.contains(&c.movie.id));
        let removed = before_exclusion - candidates.len();

        let needs_refill = candidates.len() < REFILL_MIN_RESULTS || removed * 2 > before_exclusion;
        if request.force_new && !request.exclude.is_empty() && needs_refill {
            let extra = self
                .refill(&stage_genres, request.preferences, page + 1)
                .await?;
            let mut appended = 0;
            for movie in extra {
                if request.exclude.contains(&movie.id)
                    || candidates.iter().any(|c| c.movie.id == movie.id)
                {
                    continue;
                }
                candidates.push(score_movie(movie, &fused));
                appended += 1;
            }
            tracing::debug!(removed = removed, appended = appended, "Refilled after exclusion");
        }

        candidates.retain(|c| passes_preference_filters(&c.movie, request.preferences));
        candidates.truncate(request.limit);

        let movies = candidates
            .into_iter()
            .map(|c| present(c, stage, &fused, request.preferences))
            .collect::<Vec<_>>();

        tracing::info!(
            stage = ?stage,
            page = page,
            force_new = request.force_new,
            excluded = removed,
            results = movies.len(),
            "Recommendations generated"
        );

        Ok(RecommendationBatch {
            movies,
            fused,
            stage,
        })
    }

    /// Fetches, logging and absorbing upstream failures as `None`
    async fn fetch_discover(&self, query: &DiscoverQuery) -> AppResult<Option<Vec<RawMovie>>> {
        match self.source.discover(query).await {
            Ok(movies) => Ok(Some(movies)),
            Err(e) if e.is_upstream() => {
                tracing::warn!(
                    error = %e,
                    genres = %query.genre_param(),
                    sort = %query.sort,
                    page = query.page,
                    "Candidate fetch failed"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Three concurrent fetches with different sort orders, merged and ranked
    async fn emotion_stage(&self, fused: &FusedSignal, page: u32) -> AppResult<StageOutput> {
        let [popular, newest, top_rated] =
            SortOrder::DIVERSE.map(|sort| DiscoverQuery::new(fused.genres.clone(), page, sort));

        let (popular, newest, top_rated) = tokio::join!(
            self.fetch_discover(&popular),
            self.fetch_discover(&newest),
            self.fetch_discover(&top_rated),
        );

        let results = [popular?, newest?, top_rated?];
        let failed = results.iter().all(Option::is_none);
        let merged = merge_unique(results.into_iter().flatten().collect());

        Ok(StageOutput {
            candidates: rank_candidates(merged, fused),
            failed,
        })
    }

    /// Single fetch filtered by the user's own genres, rating floor and year
    async fn preference_stage(
        &self,
        preferences: &PreferenceFacts,
        page: u32,
    ) -> AppResult<StageOutput> {
        let query = DiscoverQuery::new(
            preferences.genre_ids().to_vec(),
            page,
            SortOrder::for_page(page),
        )
        .with_min_rating(preferences.min_rating.unwrap_or(DiscoverQuery::DEFAULT_MIN_RATING))
        .with_year(preferences.year);

        let output = match self.fetch_discover(&query).await? {
            Some(movies) => StageOutput {
                candidates: movies.into_iter().map(RankedMovie::unscored).collect(),
                failed: false,
            },
            None => StageOutput {
                candidates: Vec::new(),
                failed: true,
            },
        };
        Ok(output)
    }

    async fn trending_stage(&self) -> AppResult<StageOutput> {
        match self.source.trending(TRENDING_POOL).await {
            Ok(movies) => Ok(StageOutput {
                candidates: movies.into_iter().map(RankedMovie::unscored).collect(),
                failed: false,
            }),
            Err(e) if e.is_upstream() => {
                tracing::warn!(error = %e, "Trending fetch failed");
                Ok(StageOutput {
                    candidates: Vec::new(),
                    failed: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// One more page for the same genre set
    async fn refill(
        &self,
        genres: &[GenreId],
        preferences: &PreferenceFacts,
        page: u32,
    ) -> AppResult<Vec<RawMovie>> {
        let query = DiscoverQuery::new(genres.to_vec(), page, SortOrder::for_page(page))
            .with_min_rating(preferences.min_rating.unwrap_or(DiscoverQuery::DEFAULT_MIN_RATING))
            .with_year(preferences.year);
        Ok(self.fetch_discover(&query).await?.unwrap_or_default())
    }

    /// Movies for the single strongest non-neutral emotion
    pub async fn by_dominant_emotion(
        &self,
        signal: &EmotionSignal,
        limit: usize,
    ) -> AppResult<EmotionRecommendations> {
        let dominant = signal.dominant();
        let confidence = signal.get(dominant).unwrap_or(0.0);
        tracing::info!(
            emotion = %dominant,
            confidence = confidence,
            "Dominant emotion detected"
        );

        let query = DiscoverQuery::new(dominant.genres().to_vec(), 1, SortOrder::Popularity);
        let movies: Vec<ScoredCandidate> = self
            .source
            .discover(&query)
            .await?
            .into_iter()
            .take(limit)
            .map(|movie| {
                ScoredCandidate::from_raw(
                    movie,
                    confidence,
                    vec![dominant],
                    format!("Recommended because you're feeling {}", dominant),
                    dominant.to_string(),
                )
            })
            .collect();

        Ok(EmotionRecommendations {
            dominant_emotion: dominant,
            confidence,
            recommended_genres: genre_names(dominant.genres()),
            total_movies: movies.len(),
            movies,
        })
    }

    /// Scored movies for a blend of emotions. Falls back to trending when no emotion
    /// is significant.
    pub async fn by_emotion_mix(
        &self,
        signal: &EmotionSignal,
        limit: usize,
    ) -> AppResult<MixedRecommendations> {
        let fused = fuse(Some(signal), &PreferenceFacts::default());

        if fused.source != GenreSource::Emotion {
            tracing::info!("No significant emotions, falling back to trending movies");
            let movies = self.trending(limit).await?;
            return Ok(MixedRecommendations {
                dominant_emotion: "trending".to_string(),
                emotion_mix: BTreeMap::new(),
                recommended_genres: Vec::new(),
                total_movies: movies.len(),
                movies,
                analysis_type: "trending_fallback",
            });
        }

        let output = self.emotion_stage(&fused, 1).await?;
        if output.failed {
            return Err(AppError::Upstream(
                "Failed to fetch candidates for emotion mix".to_string(),
            ));
        }

        let movies: Vec<ScoredCandidate> = output
            .candidates
            .into_iter()
            .take(limit)
            .map(|c| present(c, Some(GenreSource::Emotion), &fused, &PreferenceFacts::default()))
            .collect();

        let mut by_weight = fused.weights.clone();
        by_weight.sort_by(|a, b| b.1.total_cmp(&a.1));
        let dominant_emotion = by_weight
            .iter()
            .take(2)
            .map(|(label, _)| label.to_string())
            .collect::<Vec<_>>()
            .join(" + ");

        tracing::info!(
            emotions = %dominant_emotion,
            results = movies.len(),
            "Mixed emotion recommendations generated"
        );

        Ok(MixedRecommendations {
            dominant_emotion,
            emotion_mix: fused.weights.iter().copied().collect(),
            recommended_genres: genre_names(&fused.genres),
            total_movies: movies.len(),
            movies,
            analysis_type: "mixed_emotions",
        })
    }

    /// Popular movies for one named emotion
    pub async fn by_emotion(&self, emotion: EmotionLabel, limit: usize) -> AppResult<Vec<ScoredCandidate>> {
        if emotion == EmotionLabel::Neutral {
            return Err(AppError::Validation(
                "Neutral is not a supported emotion for recommendations".to_string(),
            ));
        }

        let query = DiscoverQuery::new(emotion.genres().to_vec(), 1, SortOrder::Popularity);
        let movies = self.source.discover(&query).await?;

        Ok(movies
            .into_iter()
            .take(limit)
            .map(|movie| {
                ScoredCandidate::from_raw(
                    movie,
                    0.0,
                    vec![emotion],
                    format!("Movies for {} mood", emotion),
                    emotion.to_string(),
                )
            })
            .collect())
    }

    /// Currently trending movies
    pub async fn trending(&self, limit: usize) -> AppResult<Vec<ScoredCandidate>> {
        let movies = self.source.trending(limit).await?;
        Ok(movies
            .into_iter()
            .take(limit)
            .map(|movie| {
                ScoredCandidate::from_raw(
                    movie,
                    0.0,
                    Vec::new(),
                    "Currently trending".to_string(),
                    "trending".to_string(),
                )
            })
            .collect())
    }
}

fn genre_names(ids: &[GenreId]) -> Vec<&'static str> {
    ids.iter().filter_map(|id| genre_name(*id)).collect()
}

/// Attaches the human-readable reason for a recommendation
fn present(
    ranked: RankedMovie,
    stage: Option<GenreSource>,
    fused: &FusedSignal,
    preferences: &PreferenceFacts,
) -> ScoredCandidate {
    let (reason, emotion_match) = match stage {
        Some(GenreSource::Emotion) => {
            let reason = match ranked.matching_emotions.as_slice() {
                [first, second, ..] => format!("Perfect for your {} and {} mood", first, second),
                [only] => format!("Recommended for your {} mood", only),
                [] => match fused.dominant() {
                    Some(dominant) => format!("Recommended for your {} mood", dominant),
                    None => "Recommended for your mood".to_string(),
                },
            };
            let matched = ranked
                .matching_emotions
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            (reason, matched)
        }
        Some(GenreSource::Preferences) => (
            "Based on your preferences".to_string(),
            preferences
                .mood
                .map(|m| m.to_string())
                .unwrap_or_else(|| "preference".to_string()),
        ),
        Some(GenreSource::Trending) | None => {
            ("Currently trending".to_string(), "trending".to_string())
        }
    };

    ScoredCandidate::from_raw(
        ranked.movie,
        ranked.emotion_score,
        ranked.matching_emotions,
        reason,
        emotion_match,
    )
}
