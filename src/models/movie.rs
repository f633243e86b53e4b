use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::{genre_names_joined, EmotionLabel, GenreId};

const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";
const BACKDROP_BASE_URL: &str = "https://image.tmdb.org/t/p/w1280";
const MOVIE_PAGE_BASE_URL: &str = "https://www.themoviedb.org/movie";

/// TMDB movie identifier
pub type MovieId = u64;

// ============================================================================
// TMDB API Types
// ============================================================================

/// A movie as returned by the TMDB list endpoints (discover, trending)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawMovie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub genre_ids: Vec<GenreId>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub popularity: f64,
}

impl RawMovie {
    /// Year of release, if TMDB supplied a parseable `YYYY-MM-DD` date
    pub fn release_year(&self) -> Option<i32> {
        self.release_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(|d| d.year())
    }
}

/// Paged list response from TMDB
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage {
    #[serde(default)]
    pub results: Vec<RawMovie>,
}

/// Sort orders understood by the TMDB discover endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Popularity,
    ReleaseDate,
    Rating,
    Revenue,
}

impl SortOrder {
    /// The three orders used to diversify the emotion-based candidate pool
    pub const DIVERSE: [SortOrder; 3] = [
        SortOrder::Popularity,
        SortOrder::ReleaseDate,
        SortOrder::Rating,
    ];

    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::Popularity => "popularity.desc",
            SortOrder::ReleaseDate => "release_date.desc",
            SortOrder::Rating => "vote_average.desc",
            SortOrder::Revenue => "revenue.desc",
        }
    }

    /// Order used for a given page of preference-based results, so paging through
    /// "more" requests also varies the ranking
    pub fn for_page(page: u32) -> SortOrder {
        const ROTATION: [SortOrder; 4] = [
            SortOrder::Popularity,
            SortOrder::Rating,
            SortOrder::ReleaseDate,
            SortOrder::Revenue,
        ];
        ROTATION[page as usize % ROTATION.len()]
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_param())
    }
}

/// Parameters for one discover call. Adult titles are never requested.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverQuery {
    pub genres: Vec<GenreId>,
    pub page: u32,
    pub sort: SortOrder,
    pub min_rating: f64,
    pub min_vote_count: u32,
    pub year: Option<i32>,
}

impl DiscoverQuery {
    pub const DEFAULT_MIN_RATING: f64 = 6.0;
    pub const DEFAULT_MIN_VOTE_COUNT: u32 = 100;

    pub fn new(genres: Vec<GenreId>, page: u32, sort: SortOrder) -> Self {
        Self {
            genres,
            page,
            sort,
            min_rating: Self::DEFAULT_MIN_RATING,
            min_vote_count: Self::DEFAULT_MIN_VOTE_COUNT,
            year: None,
        }
    }

    pub fn with_min_rating(mut self, min_rating: f64) -> Self {
        self.min_rating = min_rating;
        self
    }

    pub fn with_year(mut self, year: Option<i32>) -> Self {
        self.year = year;
        self
    }

    /// Comma-separated genre filter in TMDB format
    pub fn genre_param(&self) -> String {
        self.genres
            .iter()
            .map(|g| g.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Stable textual identity for cache keys
    pub fn fingerprint(&self) -> String {
        format!(
            "g={}|p={}|s={}|r={}|v={}|y={}",
            self.genre_param(),
            self.page,
            self.sort,
            self.min_rating,
            self.min_vote_count,
            self.year.map(|y| y.to_string()).unwrap_or_default()
        )
    }
}

// ============================================================================
// Recommendation output
// ============================================================================

/// A recommended movie, ready for the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    pub id: MovieId,
    pub title: String,
    /// Genre display names joined with ", "
    pub genre: String,
    pub description: Option<String>,
    pub rating: f64,
    pub release_date: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub movie_link: String,
    pub recommendation_reason: String,
    pub emotion_match: String,
    pub emotion_score: f64,
    pub matching_emotions: Vec<EmotionLabel>,
}

impl ScoredCandidate {
    pub fn from_raw(
        movie: RawMovie,
        emotion_score: f64,
        matching_emotions: Vec<EmotionLabel>,
        recommendation_reason: String,
        emotion_match: String,
    ) -> Self {
        Self {
            genre: genre_names_joined(&movie.genre_ids),
            poster_url: movie
                .poster_path
                .as_ref()
                .map(|p| format!("{}{}", POSTER_BASE_URL, p)),
            backdrop_url: movie
                .backdrop_path
                .as_ref()
                .map(|p| format!("{}{}", BACKDROP_BASE_URL, p)),
            movie_link: format!("{}/{}", MOVIE_PAGE_BASE_URL, movie.id),
            id: movie.id,
            title: movie.title,
            description: movie.overview,
            rating: movie.vote_average,
            release_date: movie.release_date,
            recommendation_reason,
            emotion_match,
            emotion_score,
            matching_emotions,
        }
    }
}
