// Layered configuration
// A TOML file overlaid with environment variables, validated before use

use crate::market_hours::MarketHours;
use anyhow::{Context, Result};
use serde::Deserialize;
use signal_engine::SignalConfig;
use std::path::PathBuf;

/// Monitor loop settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between decision cycles.
    pub poll_interval_secs: u64,
    /// When true, cycles outside market hours are skipped entirely.
    pub market_hours_only: bool,
    pub market_open: String,
    pub market_close: String,
    /// Exchange UTC offset in minutes (330 = +05:30 for the NSE).
    pub utc_offset_minutes: i32,
    /// JSON file the snapshot source reads each cycle.
    pub snapshot_file: PathBuf,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 120,
            market_hours_only: true,
            market_open: "09:15".to_string(),
            market_close: "15:30".to_string(),
            utc_offset_minutes: 330,
            snapshot_file: PathBuf::from("data/snapshots.json"),
        }
    }
}

impl MonitorConfig {
    pub fn market_hours(&self) -> Result<MarketHours> {
        MarketHours::new(&self.market_open, &self.market_close, self.utc_offset_minutes)
    }
}

/// Full application configuration: engine thresholds plus monitor loop
/// settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub signal: SignalConfig,
    pub monitor: MonitorConfig,
}

impl AppConfig {
    /// Load from `<path>.toml` (optional) overlaid with
    /// `SIGNAL_MONITOR__*` environment variables, then validate. Invalid
    /// configuration aborts startup here, never mid-run.
    pub fn load(path: &str) -> Result<Self> {
        let layered = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("SIGNAL_MONITOR").separator("__"))
            .build()
            .context("failed to assemble configuration sources")?;

        let app: AppConfig = layered
            .try_deserialize()
            .context("configuration does not match the expected shape")?;

        app.signal
            .validate()
            .context("signal configuration rejected")?;
        app.monitor.market_hours().context("monitor configuration rejected")?;
        if app.monitor.poll_interval_secs == 0 {
            anyhow::bail!("monitor.poll_interval_secs must be at least 1");
        }
        Ok(app)
    }
}
