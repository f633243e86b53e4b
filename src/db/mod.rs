pub mod conversations;
pub mod redis;

pub use conversations::ConversationStore;
pub use redis::create_redis_client;
pub use redis::Cache;
pub use redis::CacheKey;
pub use redis::CacheWriterHandle;
