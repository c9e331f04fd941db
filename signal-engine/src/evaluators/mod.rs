// Indicator evaluators
// Pure functions from one snapshot to one directional vote, behind a registry

use crate::config::SignalConfig;
use crate::error::EngineError;
use common::{IndicatorSnapshot, SignalDirection};

pub mod oi_volume;
pub mod pcr;
pub mod rsi;

pub use oi_volume::OiVolumeEvaluator;
pub use pcr::PcrEvaluator;
pub use rsi::RsiEvaluator;

/// One evaluator's opinion on one snapshot. Ephemeral; lives only within
/// a single decision pass.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorVote {
    pub direction: SignalDirection,
    pub strength: f64,
    pub reason: String,
}

impl IndicatorVote {
    pub fn neutral(reason: impl Into<String>) -> Self {
        Self {
            direction: SignalDirection::Neutral,
            strength: 0.0,
            reason: reason.into(),
        }
    }

    /// Directional vote with strength clamped into [0, 1].
    pub fn directional(direction: SignalDirection, strength: f64, reason: impl Into<String>) -> Self {
        Self {
            direction,
            strength: strength.clamp(0.0, 1.0),
            reason: reason.into(),
        }
    }
}

/// Capability interface for indicator evaluators. Implementations are
/// pure: no side effects, deterministic given their configuration, and
/// they never return an error; malformed input degrades to a neutral
/// vote with a reason flagging it.
pub trait IndicatorEvaluator: Send + Sync {
    fn name(&self) -> &'static str;
    fn evaluate(&self, snapshot: &IndicatorSnapshot) -> IndicatorVote;
}

struct RegisteredEvaluator {
    evaluator: Box<dyn IndicatorEvaluator>,
    weight: f64,
}

/// Registry mapping evaluator name to (evaluator, weight). The aggregator
/// iterates this; nothing downstream hardcodes evaluator identities, so
/// new indicators plug in without touching the aggregation.
#[derive(Default)]
pub struct EvaluatorRegistry {
    entries: Vec<RegisteredEvaluator>,
}

impl EvaluatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the stock PCR / RSI / OI-volume registry from configuration.
    /// A weight map missing any registered evaluator is a configuration
    /// error surfaced at load time.
    pub fn from_config(config: &SignalConfig) -> Result<Self, EngineError> {
        let evaluators: Vec<Box<dyn IndicatorEvaluator>> = vec![
            Box::new(PcrEvaluator::new(config.pcr_thresholds.clone())),
            Box::new(RsiEvaluator::new(config.rsi_levels.clone())),
            Box::new(OiVolumeEvaluator::new(config.oi_analysis.clone())),
        ];

        let mut registry = Self::new();
        for evaluator in evaluators {
            let weight = config.weight_for(evaluator.name())?;
            registry = registry.register(evaluator, weight);
        }
        Ok(registry)
    }

    pub fn register(mut self, evaluator: Box<dyn IndicatorEvaluator>, weight: f64) -> Self {
        self.entries.push(RegisteredEvaluator { evaluator, weight });
        self
    }

    /// Run every registered evaluator against the snapshot.
    pub fn evaluate(&self, snapshot: &IndicatorSnapshot) -> Vec<(f64, IndicatorVote)> {
        self.entries
            .iter()
            .map(|entry| (entry.weight, entry.evaluator.evaluate(snapshot)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
