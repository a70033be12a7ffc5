//! Redis-backed bus for multi-process deployments.
//!
//! Each subscription is a Redis list `osw:{topic}:{subscription}`, and a
//! topic tracks its subscriptions in the set `osw:{topic}:subscriptions`.
//! Publishing pushes onto every subscription list; consumers poll with
//! `RPOP`, so concurrent consumers of one subscription compete.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::ConnectionManager;
use tracing::{debug, info};

use osw_core::QueueMessage;
use osw_core::error::AppError;
use osw_core::result::AppResult;
use osw_core::traits::bus::{MessageBus, MessageStream};

/// Pause between polls of an empty subscription list.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Pause after a failed poll before the error is surfaced.
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Redis list-backed topic bus.
#[derive(Clone)]
pub struct RedisBus {
    manager: ConnectionManager,
}

impl std::fmt::Debug for RedisBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBus").finish_non_exhaustive()
    }
}

impl RedisBus {
    /// Connect to the Redis server at `url`.
    pub async fn connect(url: &str) -> AppResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| AppError::external(format!("Redis connection failed: {e}")))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::external(format!("Redis connection failed: {e}")))?;
        info!("Connected to Redis bus");
        Ok(Self { manager })
    }

    fn subscriptions_key(topic: &str) -> String {
        format!("osw:{topic}:subscriptions")
    }

    fn queue_key(topic: &str, subscription: &str) -> String {
        format!("osw:{topic}:{subscription}")
    }
}

async fn pop(conn: &mut ConnectionManager, key: &str) -> AppResult<Option<Bytes>> {
    let popped: Option<Vec<u8>> = redis::cmd("RPOP")
        .arg(key)
        .query_async(conn)
        .await
        .map_err(|e| AppError::external(format!("Redis RPOP failed: {e}")))?;
    Ok(popped.map(Bytes::from))
}

#[async_trait]
impl MessageBus for RedisBus {
    fn provider_type(&self) -> &str {
        "redis"
    }

    async fn publish(&self, topic: &str, message: &QueueMessage) -> AppResult<()> {
        let body = crate::encode(message)?;
        let mut conn = self.manager.clone();

        let subscriptions: Vec<String> = redis::cmd("SMEMBERS")
            .arg(Self::subscriptions_key(topic))
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::external(format!("Redis SMEMBERS failed: {e}")))?;

        for subscription in &subscriptions {
            redis::cmd("LPUSH")
                .arg(Self::queue_key(topic, subscription))
                .arg(body.as_ref())
                .query_async::<i64>(&mut conn)
                .await
                .map_err(|e| AppError::external(format!("Redis LPUSH failed: {e}")))?;
        }

        debug!(
            topic,
            message_id = %message.message_id,
            delivered = subscriptions.len(),
            "Published message"
        );
        Ok(())
    }

    async fn subscribe(&self, topic: &str, subscription: &str) -> AppResult<MessageStream> {
        let mut conn = self.manager.clone();
        redis::cmd("SADD")
            .arg(Self::subscriptions_key(topic))
            .arg(subscription)
            .query_async::<i64>(&mut conn)
            .await
            .map_err(|e| AppError::external(format!("Redis SADD failed: {e}")))?;

        let key = Self::queue_key(topic, subscription);
        let stream = futures::stream::unfold((conn, key), |(mut conn, key)| async move {
            loop {
                match pop(&mut conn, &key).await {
                    Ok(Some(body)) => return Some((Ok(body), (conn, key))),
                    Ok(None) => tokio::time::sleep(POLL_INTERVAL).await,
                    Err(e) => {
                        tokio::time::sleep(ERROR_BACKOFF).await;
                        return Some((Err(e), (conn, key)));
                    }
                }
            }
        });
        Ok(Box::pin(stream))
    }
}
