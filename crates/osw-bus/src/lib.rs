//! # osw-bus
//!
//! Message bus providers for the OSW formatter. Topics fan out to named
//! subscriptions; consumers of one subscription compete for its messages.
//! The in-memory bus serves single-process deployments and tests; the Redis
//! bus (feature `redis-bus`) backs each subscription with a Redis list.

pub mod memory;
#[cfg(feature = "redis-bus")]
pub mod redis;

use std::sync::Arc;

use osw_core::config::{BusConfig, BusProvider};
use osw_core::error::AppError;
use osw_core::result::AppResult;
use osw_core::traits::bus::MessageBus;

pub use memory::MemoryBus;
#[cfg(feature = "redis-bus")]
pub use redis::RedisBus;

/// Build the bus selected by `config.provider`.
pub async fn connect(config: &BusConfig) -> AppResult<Arc<dyn MessageBus>> {
    match config.provider {
        BusProvider::Memory => Ok(Arc::new(MemoryBus::new())),
        #[cfg(feature = "redis-bus")]
        BusProvider::Redis => Ok(Arc::new(RedisBus::connect(&config.redis_url).await?)),
        #[cfg(not(feature = "redis-bus"))]
        BusProvider::Redis => Err(AppError::configuration(
            "bus.provider = \"redis\" requires the `redis-bus` feature",
        )),
    }
}

/// Serialize an envelope into the bytes put on the wire.
pub(crate) fn encode(message: &osw_core::QueueMessage) -> AppResult<bytes::Bytes> {
    serde_json::to_vec(message)
        .map(bytes::Bytes::from)
        .map_err(AppError::from)
}
