use anyhow::Result;
use monitor::{AppConfig, JsonFileSource, LoggingGateway, SignalMonitor};
use signal_engine::SignalEngine;
use tracing::{info, Level};
use tracing_subscriber::fmt;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    fmt().with_max_level(Level::INFO).init();

    let config_path =
        std::env::var("SIGNAL_MONITOR_CONFIG").unwrap_or_else(|_| "monitor".to_string());
    let app_config = AppConfig::load(&config_path)?;
    info!(
        "Configuration loaded (threshold {:.2}, cooldown {}m, {} signals/hour)",
        app_config.signal.confidence_threshold,
        app_config.signal.signal_cooldown_minutes,
        app_config.signal.max_signals_per_hour
    );

    let engine = SignalEngine::new(app_config.signal.clone(), Box::new(LoggingGateway))?;
    let source = Box::new(JsonFileSource::new(&app_config.monitor.snapshot_file));
    let mut monitor = SignalMonitor::new(engine, source, app_config.monitor)?;

    tokio::select! {
        result = monitor.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, stopping monitor");
            Ok(())
        }
    }
}
