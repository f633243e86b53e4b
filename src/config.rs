use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB API key (v3 auth)
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Per-request timeout for catalog calls, in seconds
    #[serde(default = "default_tmdb_timeout_secs")]
    pub tmdb_timeout_secs: u64,

    /// Redis connection URL. Catalog responses are not cached when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by the CORS layer (comma-separated in the environment)
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Number of conversations kept in memory before eviction kicks in
    #[serde(default = "default_conversation_capacity")]
    pub conversation_capacity: usize,

    /// How many of the oldest conversations are dropped per eviction
    #[serde(default = "default_conversation_eviction_batch")]
    pub conversation_eviction_batch: usize,

    /// Size of a chat recommendation batch
    #[serde(default = "default_recommendation_limit")]
    pub recommendation_limit: usize,

    /// Fixed seed for reply wording and page selection
    #[serde(default)]
    pub random_seed: Option<u64>,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_timeout_secs() -> u64 {
    10
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_conversation_capacity() -> usize {
    1000
}

fn default_conversation_eviction_batch() -> usize {
    100
}

fn default_recommendation_limit() -> usize {
    6
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_iter(std::env::vars())
    }

    /// Load configuration from an explicit set of variables
    pub fn from_iter<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if config.conversation_eviction_batch == 0 {
            anyhow::bail!("CONVERSATION_EVICTION_BATCH must be greater than zero");
        }
        if config.recommendation_limit == 0 {
            anyhow::bail!("RECOMMENDATION_LIMIT must be greater than zero");
        }

        Ok(config)
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
