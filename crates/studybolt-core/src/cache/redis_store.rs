use super::CacheStore;
use crate::error::{Result, StudyBoltError};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;

/// Redis-backed cache. The connection is opened on first use and shared
/// between requests; any failed or timed-out command drops it so the next
/// call reconnects.
pub struct RedisCache {
    client: redis::Client,
    connection: Mutex<Option<MultiplexedConnection>>,
    timeout: Duration,
}

impl RedisCache {
    /// Parse `url` without connecting. Connecting and every command are
    /// bounded by `timeout`.
    pub fn open(url: &str, timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| StudyBoltError::Config(format!("invalid redis url: {}", e)))?;
        Ok(Self {
            client,
            connection: Mutex::new(None),
            timeout,
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        if let Some(conn) = self.connection.lock().await.as_ref() {
            return Ok(conn.clone());
        }

        // The slot is not locked while connecting; a concurrent caller may
        // connect too, and the last one stored wins.
        let conn = self
            .bounded(self.client.get_multiplexed_async_connection())
            .await?;
        log::debug!("redis connection established");
        *self.connection.lock().await = Some(conn.clone());
        Ok(conn)
    }

    async fn bounded<T>(&self, op: impl Future<Output = redis::RedisResult<T>>) -> Result<T> {
        let err = match tokio::time::timeout(self.timeout, op).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e.into(),
            Err(_) => StudyBoltError::CacheUnavailable(format!(
                "redis did not respond within {:?}",
                self.timeout
            )),
        };
        self.reset().await;
        Err(err)
    }

    async fn reset(&self) {
        *self.connection.lock().await = None;
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    fn name(&self) -> &str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        self.bounded(conn.get::<_, Option<String>>(key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        // EX takes whole seconds and rejects zero.
        let seconds = ttl.as_secs().max(1);
        let mut conn = self.connection().await?;
        self.bounded(conn.set_ex::<_, _, ()>(key, value, seconds)).await
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        self.bounded(redis::cmd("PING").query_async::<_, String>(&mut conn))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::net::TcpListener;

    const SHORT: Duration = Duration::from_millis(250);

    /// Accepts connections and holds them open without ever replying.
    async fn silent_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("redis://{}/", addr)
    }

    #[test]
    fn rejects_malformed_url() {
        assert!(matches!(
            RedisCache::open("definitely not a url", SHORT),
            Err(StudyBoltError::Config(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_server_reports_unavailable() {
        let cache = RedisCache::open("redis://127.0.0.1:1/", SHORT).unwrap();
        assert!(matches!(
            cache.ping().await,
            Err(StudyBoltError::CacheUnavailable(_))
        ));
        assert!(cache.get("k").await.is_err());
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let cache = RedisCache::open(&silent_server().await, SHORT).unwrap();

        let ping = tokio::time::timeout(Duration::from_secs(5), cache.ping())
            .await
            .expect("ping should give up on its own");
        assert!(matches!(ping, Err(StudyBoltError::CacheUnavailable(_))));

        let get = tokio::time::timeout(Duration::from_secs(5), cache.get("k"))
            .await
            .expect("get should give up on its own");
        assert!(get.is_err());

        let set = tokio::time::timeout(
            Duration::from_secs(5),
            cache.set("k", "v", Duration::from_secs(60)),
        )
        .await
        .expect("set should give up on its own");
        assert!(set.is_err());
    }

    #[tokio::test]
    async fn stalled_calls_do_not_queue_behind_each_other() {
        let url = silent_server().await;
        let cache = std::sync::Arc::new(RedisCache::open(&url, SHORT).unwrap());

        let started = Instant::now();
        let calls: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.ping().await })
            })
            .collect();
        for call in calls {
            assert!(call.await.unwrap().is_err());
        }

        // Serialized, eight calls would take at least eight timeouts.
        assert!(started.elapsed() < SHORT * 6, "took {:?}", started.elapsed());
    }
}
