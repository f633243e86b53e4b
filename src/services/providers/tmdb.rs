/// TMDB (The Movie Database) catalog provider
///
/// API Flow:
/// 1. Candidates: /discover/movie with genre, sort, page and quality filters
/// 2. Fallback: /trending/movie/day
///
/// Responses are cached in Redis when a cache is configured; a cache outage only costs
/// the extra upstream calls.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{DiscoverQuery, RawMovie, TmdbPage},
    services::providers::CandidateSource,
};
use reqwest::Client as HttpClient;
use std::time::Duration;

const DISCOVER_CACHE_TTL: u64 = 21600; // 6 hours
const TRENDING_CACHE_TTL: u64 = 3600; // 1 hour

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Option<Cache>,
}

impl TmdbProvider {
    /// Creates a TMDB provider whose requests time out after `timeout`
    pub fn new(
        api_key: String,
        api_url: String,
        timeout: Duration,
        cache: Option<Cache>,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    /// Issues a GET against a TMDB list endpoint and returns its results
    async fn fetch_page(&self, path: &str, params: &[(&str, String)]) -> AppResult<Vec<RawMovie>> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                path = %path,
                status = %status,
                body = %body,
                "TMDB request failed"
            );
            return Err(AppError::Upstream(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        let page: TmdbPage = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                response = %response_text,
                "Failed to deserialize TMDB response"
            );
            AppError::Upstream(format!("Failed to parse TMDB response: {}", e))
        })?;

        Ok(page.results)
    }
}

#[async_trait::async_trait]
impl CandidateSource for TmdbProvider {
    async fn discover(&self, query: &DiscoverQuery) -> AppResult<Vec<RawMovie>> {
        cached!(
            self.cache,
            CacheKey::Discover(query.fingerprint()),
            DISCOVER_CACHE_TTL,
            async move {
                let mut params = vec![
                    ("with_genres", query.genre_param()),
                    ("sort_by", query.sort.as_param().to_string()),
                    ("page", query.page.to_string()),
                    ("vote_average.gte", query.min_rating.to_string()),
                    ("vote_count.gte", query.min_vote_count.to_string()),
                    ("include_adult", "false".to_string()),
                ];
                if let Some(year) = query.year {
                    params.push(("primary_release_year", year.to_string()));
                }

                let movies = self.fetch_page("/discover/movie", &params).await?;

                tracing::info!(
                    genres = %query.genre_param(),
                    sort = %query.sort,
                    page = query.page,
                    results = movies.len(),
                    provider = "tmdb",
                    "Discover completed"
                );

                Ok::<_, AppError>(movies)
            }
        )
    }

    async fn trending(&self, limit: usize) -> AppResult<Vec<RawMovie>> {
        let movies: Vec<RawMovie> = cached!(
            self.cache,
            CacheKey::Trending,
            TRENDING_CACHE_TTL,
            async move {
                let movies = self.fetch_page("/trending/movie/day", &[]).await?;
                tracing::info!(results = movies.len(), provider = "tmdb", "Trending fetched");
                Ok::<_, AppError>(movies)
            }
        )?;

        Ok(movies.into_iter().take(limit).collect())
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
