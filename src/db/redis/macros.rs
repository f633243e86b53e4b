/// A macro to simplify read-through caching of catalog responses.
///
/// `$cache` is an `Option<Cache>`. With no cache configured the block simply runs.
/// Otherwise the cache is consulted first; on a miss (or an unreachable Redis) the block
/// computes the value, which is then written back in the background.
///
/// # Arguments
/// * `$cache`: `Option<Cache>` to read from and write to.
/// * `$key`: The `CacheKey` for the value.
/// * `$ttl`: The time-to-live (TTL) for the cached value in seconds.
/// * `$block`: A future producing `AppResult<T>`, awaited on a miss.
///
/// # Example
/// ```rust,ignore
/// let movies = cached!(self.cache, CacheKey::Trending, 3600, async move {
///     fetch_trending().await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match &$cache {
            Some(cache) => {
                if let Some(hit) = cache.lookup(&key).await {
                    Ok(hit)
                } else {
                    let value = $block.await?;
                    cache.set_in_background(&key, &value, $ttl);
                    Ok(value)
                }
            }
            None => $block.await,
        }
    }};
}
