// Signal monitor service
// Owns the engine and runs one decision cycle per polling interval

use crate::market_hours::MarketHours;
use crate::settings::MonitorConfig;
use crate::source::SnapshotSource;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use signal_engine::{EngineStatus, SignalEngine};
use tracing::{debug, error, info, warn};

/// Read-only monitor state for operators.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub cycle_count: u64,
    pub events_dispatched: u64,
    pub errors_count: u64,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub market_open_now: bool,
    pub engine: EngineStatus,
}

/// Polling daemon around the signal engine. Cycles are serialized by
/// construction: the monitor owns the engine and never runs two passes
/// concurrently.
pub struct SignalMonitor {
    engine: SignalEngine,
    source: Box<dyn SnapshotSource>,
    market_hours: MarketHours,
    config: MonitorConfig,
    cycle_count: u64,
    events_dispatched: u64,
    errors_count: u64,
    last_heartbeat: Option<DateTime<Utc>>,
}

impl SignalMonitor {
    pub fn new(
        engine: SignalEngine,
        source: Box<dyn SnapshotSource>,
        config: MonitorConfig,
    ) -> Result<Self> {
        let market_hours = config.market_hours()?;
        Ok(Self {
            engine,
            source,
            market_hours,
            config,
            cycle_count: 0,
            events_dispatched: 0,
            errors_count: 0,
            last_heartbeat: None,
        })
    }

    /// Run a single monitoring cycle at `now`; returns the number of
    /// events the engine emitted.
    pub async fn run_once(&mut self, now: DateTime<Utc>) -> Result<usize> {
        self.cycle_count += 1;
        self.last_heartbeat = Some(now);

        if self.config.market_hours_only && !self.market_hours.is_open(now) {
            debug!("Outside market hours, skipping cycle {}", self.cycle_count);
            return Ok(0);
        }

        let snapshots = self.source.fetch().await.context("snapshot fetch failed")?;
        let events = self.engine.run_cycle(&snapshots, now).await?;
        self.events_dispatched += events.len() as u64;
        Ok(events.len())
    }

    /// Run until the task is cancelled. Cycle failures are logged and
    /// backed off, never fatal to the loop.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Signal monitor started (interval {}s, market hours {})",
            self.config.poll_interval_secs,
            if self.config.market_hours_only { "enforced" } else { "ignored" }
        );

        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(self.config.poll_interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.run_once(Utc::now()).await {
                Ok(0) => debug!("Cycle {} emitted no events", self.cycle_count),
                Ok(emitted) => info!("Cycle {} emitted {emitted} events", self.cycle_count),
                Err(e) => {
                    self.errors_count += 1;
                    error!("Monitoring cycle failed: {e:#}");
                    if self.errors_count % 5 == 0 {
                        warn!("{} monitoring errors so far", self.errors_count);
                    }
                    // Pause beyond the normal interval to avoid a tight
                    // failure loop against a broken source.
                    let backoff = self.config.poll_interval_secs.min(60);
                    tokio::time::sleep(std::time::Duration::from_secs(backoff)).await;
                }
            }
        }
    }

    pub fn status(&self, now: DateTime<Utc>) -> MonitorStatus {
        MonitorStatus {
            cycle_count: self.cycle_count,
            events_dispatched: self.events_dispatched,
            errors_count: self.errors_count,
            last_heartbeat: self.last_heartbeat,
            market_open_now: self.market_hours.is_open(now),
            engine: self.engine.status(now),
        }
    }

    /// The engine, for config reloads and the query surface.
    pub fn engine(&self) -> &SignalEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SignalEngine {
        &mut self.engine
    }
}
