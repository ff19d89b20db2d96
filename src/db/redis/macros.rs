/// Read-through caching around an async block.
///
/// Returns the cached value for `$key` when present; otherwise awaits `$block`,
/// queues the result for a background write with `$ttl` seconds, and returns it.
/// A failed cache read is treated as a miss so Redis outages only cost latency.
///
/// ```rust,ignore
/// let movie: MovieRecord = cached!(self.cache, CacheKey::Movie(id), ttl, async {
///     self.fetch_movie_uncached(id).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get(&key).await {
            Ok(Some(hit)) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok(hit)
            }
            Ok(None) | Err(_) => {
                tracing::debug!(key = %key, "Cache miss");
                match $block.await {
                    Ok(value) => {
                        $cache.set_in_background(&key, &value, $ttl);
                        Ok(value)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }};
}
