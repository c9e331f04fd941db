// Signal monitoring service
// Drives the decision engine on a polling interval within market hours

pub mod gateway;
pub mod market_hours;
pub mod monitor;
pub mod settings;
pub mod source;

pub use gateway::LoggingGateway;
pub use market_hours::MarketHours;
pub use monitor::{MonitorStatus, SignalMonitor};
pub use settings::{AppConfig, MonitorConfig};
pub use source::{JsonFileSource, SnapshotSource, StaticSource};
