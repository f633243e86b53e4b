/// Movie catalog abstraction
///
/// The recommender only ever talks to a catalog through this trait, so the TMDB adapter
/// can be swapped for an in-memory catalog in tests or another upstream later.
use crate::{
    error::AppResult,
    models::{DiscoverQuery, RawMovie},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for candidate movie sources
///
/// Implementations return upstream failures as `AppError::Upstream` or
/// `AppError::HttpClient`; callers decide whether to absorb them.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CandidateSource: Send + Sync {
    /// Fetch one page of movies matching every genre in the query
    async fn discover(&self, query: &DiscoverQuery) -> AppResult<Vec<RawMovie>>;

    /// Fetch currently trending movies, at most `limit`
    async fn trending(&self, limit: usize) -> AppResult<Vec<RawMovie>>;

    /// Source name for logging and debugging
    fn name(&self) -> &'static str;
}
