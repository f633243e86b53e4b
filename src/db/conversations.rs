use std::collections::{HashMap, VecDeque};

use tokio::sync::RwLock;

use crate::models::ConversationState;

/// In-memory, process-lifetime conversation storage
///
/// Bounded by capacity: once it holds more than `capacity` conversations, a call to
/// `evict_overflow` drops the `eviction_batch` oldest ones by first insertion. This is an
/// approximation of LRU; recency of use is not tracked.
pub struct ConversationStore {
    inner: RwLock<StoreInner>,
    capacity: usize,
    eviction_batch: usize,
}

#[derive(Default)]
struct StoreInner {
    conversations: HashMap<String, ConversationState>,
    /// Keys in first-insertion order
    insertion_order: VecDeque<String>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY, Self::DEFAULT_EVICTION_BATCH)
    }
}

impl ConversationStore {
    pub const DEFAULT_CAPACITY: usize = 1000;
    pub const DEFAULT_EVICTION_BATCH: usize = 100;

    pub fn new(capacity: usize, eviction_batch: usize) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            capacity,
            eviction_batch,
        }
    }

    /// Returns a copy of the stored conversation
    pub async fn get(&self, id: &str) -> Option<ConversationState> {
        self.inner.read().await.conversations.get(id).cloned()
    }

    /// Inserts or replaces a conversation. Replacing keeps the first insertion slot.
    pub async fn put(&self, state: ConversationState) {
        let mut inner = self.inner.write().await;
        let id = state.id.clone();
        if inner.conversations.insert(id.clone(), state).is_none() {
            inner.insertion_order.push_back(id);
        }
    }

    /// Removes a conversation, returning whether it existed
    pub async fn remove(&self, id: &str) -> bool {
        let mut inner = self.inner.write().await;
        if inner.conversations.remove(id).is_some() {
            inner.insertion_order.retain(|key| key != id);
            true
        } else {
            false
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.conversations.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops the oldest batch when the store has grown past capacity.
    ///
    /// Returns how many conversations were evicted.
    pub async fn evict_overflow(&self) -> usize {
        let mut inner = self.inner.write().await;
        if inner.conversations.len() <= self.capacity {
            return 0;
        }

        let mut evicted = 0;
        while evicted < self.eviction_batch {
            let Some(oldest) = inner.insertion_order.pop_front() else {
                break;
            };
            inner.conversations.remove(&oldest);
            evicted += 1;
        }

        tracing::info!(
            evicted = evicted,
            remaining = inner.conversations.len(),
            capacity = self.capacity,
            "Evicted oldest conversations"
        );

        evicted
    }
}
