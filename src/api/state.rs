use std::sync::Arc;

use crate::config::Config;
use crate::db::ConversationStore;
use crate::services::{CandidateSource, ConversationEngine, RandomSource, Recommender};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConversationEngine>,
    pub recommender: Arc<Recommender>,
}

impl AppState {
    /// Wires the recommender and conversation engine over one candidate source
    pub fn new(
        source: Arc<dyn CandidateSource>,
        random: Arc<dyn RandomSource>,
        store: ConversationStore,
        recommendation_limit: usize,
    ) -> Self {
        let recommender = Arc::new(Recommender::new(source, random.clone()));
        let engine = Arc::new(ConversationEngine::new(
            Arc::new(store),
            recommender.clone(),
            random,
            recommendation_limit,
        ));

        Self {
            engine,
            recommender,
        }
    }

    pub fn from_config(
        config: &Config,
        source: Arc<dyn CandidateSource>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self::new(
            source,
            random,
            ConversationStore::new(
                config.conversation_capacity,
                config.conversation_eviction_batch,
            ),
            config.recommendation_limit,
        )
    }
}
