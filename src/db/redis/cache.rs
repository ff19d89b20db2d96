use redis::AsyncCommands;
use redis::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;
use crate::models::MovieId;

/// Redis keys for catalog data
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Full movie record (details + credits + keywords)
    Movie(MovieId),
    /// TMDB movie genre list
    GenreList,
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Movie(id) => write!(f, "tmdb:movie:{}", id),
            CacheKey::GenreList => write!(f, "tmdb:genres"),
        }
    }
}

/// Opens a Redis client. No connection is made until first use.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

enum WriterCommand {
    Set {
        key: String,
        value: String,
        ttl: u64,
    },
    Shutdown,
}

/// Read-through cache over Redis with writes queued to a background task
///
/// Reads hit Redis directly; writes are pushed onto a channel so a slow Redis
/// never adds latency to a scoring request.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    writer: mpsc::UnboundedSender<WriterCommand>,
}

/// Flushes queued writes and stops the writer task
pub struct CacheWriterHandle {
    writer: mpsc::UnboundedSender<WriterCommand>,
    task: tokio::task::JoinHandle<()>,
}

impl CacheWriterHandle {
    pub async fn shutdown(self) {
        let _ = self.writer.send(WriterCommand::Shutdown);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task panicked");
        }
    }
}

impl Cache {
    /// Builds the cache and spawns its writer task. Must be called inside a tokio runtime.
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (writer, commands) = mpsc::unbounded_channel();
        let task = tokio::spawn(Self::run_writer(redis_client.clone(), commands));

        let cache = Self {
            redis_client,
            writer: writer.clone(),
        };

        (cache, CacheWriterHandle { writer, task })
    }

    async fn run_writer(client: Client, mut commands: mpsc::UnboundedReceiver<WriterCommand>) {
        tracing::debug!("Catalog cache writer started");

        // Commands are processed in order, so everything queued before
        // Shutdown has been written by the time the loop exits.
        while let Some(command) = commands.recv().await {
            match command {
                WriterCommand::Set { key, value, ttl } => {
                    if let Err(e) = Self::write(&client, &key, value, ttl).await {
                        tracing::warn!(key = %key, error = %e, "Catalog cache write failed");
                    }
                }
                WriterCommand::Shutdown => break,
            }
        }

        tracing::debug!("Catalog cache writer stopped");
    }

    async fn write(client: &Client, key: &str, value: String, ttl: u64) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key, value, ttl).await?;
        Ok(())
    }

    /// Returns the cached value for `key`, or `None` on a miss
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.to_string()).await?;

        cached
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error for {}: {}", key, e))
                })
            })
            .transpose()
    }

    /// Queues a write without waiting for Redis
    pub fn set_in_background<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let value = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Cache serialization error");
                return;
            }
        };

        let command = WriterCommand::Set {
            key: key.to_string(),
            value,
            ttl,
        };

        if self.writer.send(command).is_err() {
            tracing::warn!(key = %key, "Cache writer is gone, dropping write");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    #[test]
    fn test_cache_key_display_movie() {
        assert_eq!(CacheKey::Movie(27205).to_string(), "tmdb:movie:27205");
    }

    #[test]
    fn test_cache_key_display_genre_list() {
        assert_eq!(CacheKey::GenreList.to_string(), "tmdb:genres");
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_cache_miss() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, _handle) = Cache::new(client);

        let retrieved: Option<String> = cache.get(&CacheKey::Movie(-1)).await.unwrap();
        assert_eq!(retrieved, None);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis"]
    async fn test_queued_write_is_flushed_on_shutdown() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, handle) = Cache::new(client.clone());

        let key = CacheKey::Movie(-42);
        let value = vec!["Action".to_string(), "Drama".to_string()];
        cache.set_in_background(&key, &value, 60);

        handle.shutdown().await;

        let retrieved: Option<Vec<String>> = cache.get(&key).await.unwrap();
        assert_eq!(retrieved, Some(value));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(key.to_string()).await.unwrap();
    }
}
