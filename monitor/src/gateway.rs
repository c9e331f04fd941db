// Logging dispatch gateway
// Renders finalized events into the service log; a delivery integration
// (Telegram, database) would slot in behind the same trait

use anyhow::Result;
use common::SignalEvent;
use signal_engine::DispatchGateway;
use tracing::{debug, info};

/// Gateway that emits every event as a structured log line.
pub struct LoggingGateway;

#[async_trait::async_trait]
impl DispatchGateway for LoggingGateway {
    async fn dispatch(&self, event: &SignalEvent) -> Result<()> {
        info!("signal event: {event}");
        debug!("signal event payload: {}", serde_json::to_string(event)?);
        Ok(())
    }
}
