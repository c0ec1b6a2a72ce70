/// A macro to simplify caching logic using Redis.
///
/// Checks the cache for the key; on a hit the cached value is returned, on a
/// miss the provided block computes the value, which is stored with the TTL
/// and returned.
///
/// # Arguments
/// * `$cache`: The cache instance, with `get_from_cache` and `store` methods.
/// * `$key`: The key to use for caching the value.
/// * `$ttl`: The time-to-live (TTL) for the cached value in seconds.
/// * `$block`: The block of code to execute if the value is not found in cache.
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get_from_cache(&$key).await? {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.store(&$key, &value, $ttl).await;
            Ok(value)
        }
    }};
}
