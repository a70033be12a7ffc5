//! Subscription loop: one supervised task per inbound message.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, watch};
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};

use osw_core::QueueMessage;
use osw_core::config::{BusConfig, WorkerConfig};
use osw_core::error::AppError;
use osw_core::result::AppResult;
use osw_core::traits::bus::{MessageBus, MessageStream};
use osw_entity::MessageKind;

use crate::executor::JobExecutor;

/// Pause after a failed receive before polling the subscription again.
const RECEIVE_BACKOFF: Duration = Duration::from_secs(1);

/// Classifies inbound messages and runs each on its own task.
///
/// At most `max_concurrent` jobs run at once; the loop waits for a free
/// slot before taking the next message off the subscription. On shutdown it
/// stops taking messages, waits up to `shutdown_grace` for running jobs,
/// then aborts the rest (whose workspaces are removed as their contexts
/// drop).
#[derive(Debug)]
pub struct MessageRouter {
    bus: Arc<dyn MessageBus>,
    executor: Arc<JobExecutor>,
    listening_topic: String,
    subscription: String,
    on_demand_marker: String,
    max_concurrent: usize,
    shutdown_grace: Duration,
}

impl MessageRouter {
    /// Build a router from the bus and worker configuration.
    pub fn new(
        bus: Arc<dyn MessageBus>,
        executor: Arc<JobExecutor>,
        bus_config: &BusConfig,
        worker_config: &WorkerConfig,
    ) -> Self {
        Self {
            bus,
            executor,
            listening_topic: bus_config.listening_topic.clone(),
            subscription: bus_config.subscription.clone(),
            on_demand_marker: bus_config.on_demand_marker.clone(),
            max_concurrent: bus_config.max_concurrent_messages.max(1),
            shutdown_grace: worker_config.shutdown_grace(),
        }
    }

    /// Open the subscription this router consumes.
    pub async fn open(&self) -> AppResult<MessageStream> {
        let stream = self
            .bus
            .subscribe(&self.listening_topic, &self.subscription)
            .await?;
        info!(
            topic = %self.listening_topic,
            subscription = %self.subscription,
            provider = self.bus.provider_type(),
            "Subscribed to listening topic"
        );
        Ok(stream)
    }

    /// Subscribe and serve until `shutdown` turns true.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> AppResult<()> {
        let stream = self.open().await?;
        self.serve(stream, shutdown).await
    }

    /// Serve an already opened subscription until `shutdown` turns true or
    /// the stream ends.
    pub async fn serve(
        &self,
        mut stream: MessageStream,
        mut shutdown: watch::Receiver<bool>,
    ) -> AppResult<()> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut jobs = JoinSet::new();

        info!(
            max_concurrent = self.max_concurrent,
            marker = %self.on_demand_marker,
            "Message router started"
        );

        loop {
            while let Some(finished) = jobs.try_join_next() {
                log_join(finished);
            }

            let permit = tokio::select! {
                _ = stopped(&mut shutdown) => break,
                permit = Arc::clone(&semaphore).acquire_owned() => permit
                    .map_err(|e| AppError::internal(format!("Job semaphore closed: {e}")))?,
            };

            let next = tokio::select! {
                _ = stopped(&mut shutdown) => break,
                next = stream.next() => next,
            };

            match next {
                Some(Ok(body)) => self.dispatch(body, permit, &mut jobs),
                Some(Err(e)) => {
                    warn!(error = %e, "Failed to receive message");
                    tokio::time::sleep(RECEIVE_BACKOFF).await;
                }
                None => {
                    warn!("Subscription closed");
                    break;
                }
            }
        }

        self.drain(jobs).await;
        Ok(())
    }

    fn dispatch(&self, body: Bytes, permit: OwnedSemaphorePermit, jobs: &mut JoinSet<()>) {
        let envelope = match QueueMessage::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(e) => match QueueMessage::recover(&body) {
                // The handler rejects it and reports the failure under its id.
                Some(envelope) => {
                    warn!(
                        message_id = %envelope.message_id,
                        code = e.code(),
                        error = %e,
                        "Received malformed envelope"
                    );
                    envelope
                }
                None => {
                    // No messageId means nobody to notify.
                    error!(code = e.code(), error = %e, "Dropping unaddressable message");
                    return;
                }
            },
        };

        let kind = MessageKind::classify(&envelope, &self.on_demand_marker);
        let Some(handler) = self.executor.handler(kind) else {
            error!(message_id = %envelope.message_id, %kind, "No handler registered");
            return;
        };

        info!(
            message_id = %envelope.message_id,
            message_type = %envelope.message_type,
            %kind,
            "Received message"
        );
        jobs.spawn(async move {
            let _permit = permit;
            handler.handle(envelope).await;
        });
    }

    async fn drain(&self, mut jobs: JoinSet<()>) {
        if jobs.is_empty() {
            info!("Message router stopped");
            return;
        }

        info!(
            in_flight = jobs.len(),
            grace_secs = self.shutdown_grace.as_secs(),
            "Waiting for in-flight jobs to complete"
        );
        let drained = tokio::time::timeout(self.shutdown_grace, async {
            while let Some(finished) = jobs.join_next().await {
                log_join(finished);
            }
        })
        .await;

        if drained.is_err() {
            warn!(remaining = jobs.len(), "Shutdown grace expired, aborting jobs");
            jobs.shutdown().await;
        }
        info!("Message router stopped");
    }
}

/// Resolve once shutdown is requested or its sender is gone.
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

fn log_join(result: Result<(), JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            error!(error = %e, "Job task panicked");
        } else {
            warn!(error = %e, "Job task was cancelled");
        }
    }
}
