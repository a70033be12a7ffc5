//! In-memory bus for single-process deployments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::debug;

use osw_core::QueueMessage;
use osw_core::result::AppResult;
use osw_core::traits::bus::{MessageBus, MessageStream};

/// One named subscription: a queue shared by all of its consumers.
#[derive(Debug, Clone)]
struct Subscription {
    tx: mpsc::UnboundedSender<Bytes>,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Bytes>>>,
}

impl Subscription {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }
}

/// In-memory topic bus.
///
/// Messages published to a topic with no subscriptions are dropped.
#[derive(Debug, Default)]
pub struct MemoryBus {
    /// Topic → subscription name → queue.
    topics: RwLock<HashMap<String, HashMap<String, Subscription>>>,
}

impl MemoryBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish raw bytes, bypassing envelope serialization.
    pub async fn publish_raw(&self, topic: &str, body: Bytes) -> usize {
        let topics = self.topics.read().await;
        let Some(subscriptions) = topics.get(topic) else {
            return 0;
        };
        let mut delivered = 0;
        for subscription in subscriptions.values() {
            if subscription.tx.send(body.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }
}

#[async_trait]
impl MessageBus for MemoryBus {
    fn provider_type(&self) -> &str {
        "memory"
    }

    async fn publish(&self, topic: &str, message: &QueueMessage) -> AppResult<()> {
        let body = crate::encode(message)?;
        let delivered = self.publish_raw(topic, body).await;
        debug!(topic, message_id = %message.message_id, delivered, "Published message");
        Ok(())
    }

    async fn subscribe(&self, topic: &str, subscription: &str) -> AppResult<MessageStream> {
        let rx = {
            let mut topics = self.topics.write().await;
            topics
                .entry(topic.to_string())
                .or_default()
                .entry(subscription.to_string())
                .or_insert_with(Subscription::new)
                .rx
                .clone()
        };

        let stream = futures::stream::unfold(rx, |rx| async move {
            let body = rx.lock().await.recv().await?;
            Some((Ok::<_, osw_core::AppError>(body), rx))
        });
        Ok(Box::pin(stream))
    }
}
