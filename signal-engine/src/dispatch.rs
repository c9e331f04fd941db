// Dispatch gateway interface
// Finalized events leave the engine here; persistence and notification
// are the gateway's concern

use anyhow::Result;
use common::SignalEvent;
use std::sync::Arc;

/// Receives finalized signal events. Dispatch is fire-and-forget from the
/// engine's point of view: failures are logged by the caller and never
/// retried by the lifecycle manager.
#[async_trait::async_trait]
pub trait DispatchGateway: Send + Sync {
    async fn dispatch(&self, event: &SignalEvent) -> Result<()>;
}

#[async_trait::async_trait]
impl<G: DispatchGateway + ?Sized> DispatchGateway for Arc<G> {
    async fn dispatch(&self, event: &SignalEvent) -> Result<()> {
        (**self).dispatch(event).await
    }
}

/// In-memory gateway for tests and development.
#[derive(Default)]
pub struct InMemoryGateway {
    events: tokio::sync::RwLock<Vec<SignalEvent>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<SignalEvent> {
        self.events.read().await.clone()
    }

    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

#[async_trait::async_trait]
impl DispatchGateway for InMemoryGateway {
    async fn dispatch(&self, event: &SignalEvent) -> Result<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }
}
