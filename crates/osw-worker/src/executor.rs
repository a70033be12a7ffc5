//! Job executor: dispatches classified messages to their flow.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use osw_core::QueueMessage;
use osw_entity::MessageKind;

/// One job flow.
///
/// A handler owns the message from here on: it must publish exactly one
/// outcome for it (when an address can be recovered) and clean up after
/// itself. Nothing is returned because nothing above it can act on a
/// failure.
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// Message kind this handler processes.
    fn kind(&self) -> MessageKind;

    /// Run the job for `envelope` to completion.
    async fn handle(&self, envelope: QueueMessage);
}

/// Routes message kinds to registered handlers.
#[derive(Debug, Default)]
pub struct JobExecutor {
    handlers: HashMap<MessageKind, Arc<dyn JobHandler>>,
}

impl JobExecutor {
    /// Create an executor with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for its kind.
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let kind = handler.kind();
        info!("Registered job handler for kind '{}'", kind);
        self.handlers.insert(kind, handler);
    }

    /// Handler for `kind`.
    pub fn handler(&self, kind: MessageKind) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(&kind).cloned()
    }

    /// Check if a handler is registered for a kind.
    pub fn has_handler(&self, kind: MessageKind) -> bool {
        self.handlers.contains_key(&kind)
    }
}
