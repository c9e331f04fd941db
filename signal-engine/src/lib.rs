// Multi-Indicator Signal Decision & Lifecycle Engine
// Turns cleaned indicator snapshots into scored, rate-limited signal events

pub mod aggregator;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod evaluators;
pub mod lifecycle;
pub mod ratelimit;

pub use aggregator::{aggregate, SignalDecision};
pub use config::{
    OiAnalysis, OiConvention, PcrThresholds, PriceTargets, RsiLevels, SignalConfig,
};
pub use dispatch::{DispatchGateway, InMemoryGateway};
pub use engine::{EngineStatus, SignalEngine};
pub use error::EngineError;
pub use evaluators::{
    EvaluatorRegistry, IndicatorEvaluator, IndicatorVote, OiVolumeEvaluator, PcrEvaluator,
    RsiEvaluator,
};
pub use lifecycle::SignalTracker;
pub use ratelimit::RateLimiter;
