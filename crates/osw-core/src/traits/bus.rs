//! Message bus trait for pluggable topic backends.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::message::QueueMessage;
use crate::result::AppResult;

/// Stream of raw message bodies delivered to a subscription.
pub type MessageStream = Pin<Box<dyn Stream<Item = AppResult<Bytes>> + Send>>;

/// Publish/subscribe transport between the formatter and its producers.
///
/// Bodies are handed out raw so that a malformed message can be reported
/// by the consumer instead of killing the stream.
#[async_trait]
pub trait MessageBus: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "memory", "redis").
    fn provider_type(&self) -> &str;

    /// Publish one envelope to `topic`.
    async fn publish(&self, topic: &str, message: &QueueMessage) -> AppResult<()>;

    /// Open a named subscription on `topic`.
    ///
    /// Each subscription receives every message published after it was
    /// opened; concurrent consumers of the same subscription share them.
    async fn subscribe(&self, topic: &str, subscription: &str) -> AppResult<MessageStream>;
}
