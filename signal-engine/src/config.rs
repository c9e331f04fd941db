// Signal configuration
// Thresholds and decision parameters, validated before any cycle uses them

use crate::error::EngineError;
use chrono::Duration;
use common::{OptionType, SignalDirection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// PCR decision thresholds. `buy_ce_max < neutral_range.0` and
/// `neutral_range.1 < buy_pe_min` must hold strictly so the strength ramp
/// between band edge and trigger is well defined.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PcrThresholds {
    /// PCR at or below this is a full-strength bullish reading.
    pub buy_ce_max: f64,
    /// PCR at or above this is a full-strength bearish reading.
    pub buy_pe_min: f64,
    /// Inclusive band in which PCR votes neutral.
    pub neutral_range: (f64, f64),
}

impl Default for PcrThresholds {
    fn default() -> Self {
        Self {
            buy_ce_max: 0.7,
            buy_pe_min: 1.3,
            neutral_range: (0.8, 1.2),
        }
    }
}

/// RSI oversold/overbought levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiLevels {
    pub oversold_max: f64,
    pub overbought_min: f64,
}

impl Default for RsiLevels {
    fn default() -> Self {
        Self {
            oversold_max: 30.0,
            overbought_min: 70.0,
        }
    }
}

/// How an open-interest build-up maps to a directional call.
///
/// The sign convention is deliberately configurable: `Momentum` reads
/// rising OI plus a volume spike as support for the option's own side,
/// `Contrarian` reads it as writers building positions against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OiConvention {
    Momentum,
    Contrarian,
}

impl OiConvention {
    /// Direction implied by OI rising (or falling) on the given option type.
    pub fn direction(&self, option_type: OptionType, oi_rising: bool) -> SignalDirection {
        let momentum = match (option_type, oi_rising) {
            (OptionType::Ce, true) | (OptionType::Pe, false) => SignalDirection::BuyCe,
            (OptionType::Pe, true) | (OptionType::Ce, false) => SignalDirection::BuyPe,
        };
        match self {
            OiConvention::Momentum => momentum,
            OiConvention::Contrarian => match momentum {
                SignalDirection::BuyCe => SignalDirection::BuyPe,
                SignalDirection::BuyPe => SignalDirection::BuyCe,
                SignalDirection::Neutral => SignalDirection::Neutral,
            },
        }
    }
}

/// Open-interest / volume analysis parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OiAnalysis {
    /// Absolute OI change (percent) considered significant.
    pub significant_change_pct: f64,
    /// Volume must reach `avg_volume * volume_spike_multiplier`.
    pub volume_spike_multiplier: f64,
    /// Strikes with less open interest than this vote neutral.
    pub min_oi_level: i64,
    pub convention: OiConvention,
}

impl Default for OiAnalysis {
    fn default() -> Self {
        Self {
            significant_change_pct: 15.0,
            volume_spike_multiplier: 2.0,
            min_oi_level: 10_000,
            convention: OiConvention::Momentum,
        }
    }
}

/// Entry/target/stop derivation for created signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceTargets {
    pub target_multiplier: f64,
    pub stop_loss_multiplier: f64,
    /// Entry floor used when the strike shows no traded premium.
    pub min_premium: f64,
}

impl Default for PriceTargets {
    fn default() -> Self {
        Self {
            target_multiplier: 1.33,
            stop_loss_multiplier: 0.8,
            min_premium: 50.0,
        }
    }
}

/// Full decision configuration. Hot-reloadable between cycles through
/// `SignalEngine::update_config`; every load path goes through
/// [`SignalConfig::validate`] first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub enabled: bool,
    pub pcr_thresholds: PcrThresholds,
    pub rsi_levels: RsiLevels,
    pub oi_analysis: OiAnalysis,
    /// Signal validity window; renewal extends it by the same amount.
    pub signal_cooldown_minutes: i64,
    pub confidence_threshold: f64,
    pub max_signals_per_hour: usize,
    /// Minimum confidence change for a renewal to produce a RENEW event.
    pub renewal_noise_margin: f64,
    /// Per-evaluator aggregation weights, keyed by evaluator name.
    pub weights: HashMap<String, f64>,
    pub price_targets: PriceTargets,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pcr_thresholds: PcrThresholds::default(),
            rsi_levels: RsiLevels::default(),
            oi_analysis: OiAnalysis::default(),
            signal_cooldown_minutes: 15,
            confidence_threshold: 0.7,
            max_signals_per_hour: 6,
            renewal_noise_margin: 0.05,
            weights: default_weights(),
            price_targets: PriceTargets::default(),
        }
    }
}

fn default_weights() -> HashMap<String, f64> {
    [("pcr", 1.0), ("rsi", 1.0), ("oi_volume", 1.0)]
        .into_iter()
        .map(|(name, weight)| (name.to_string(), weight))
        .collect()
}

impl SignalConfig {
    /// Cooldown as a chrono duration.
    pub fn cooldown(&self) -> Duration {
        Duration::minutes(self.signal_cooldown_minutes)
    }

    /// Weight configured for an evaluator; a missing entry is a
    /// configuration error, not a silent default.
    pub fn weight_for(&self, evaluator: &str) -> Result<f64, EngineError> {
        self.weights
            .get(evaluator)
            .copied()
            .ok_or_else(|| EngineError::config(format!("weights missing evaluator '{evaluator}'")))
    }

    /// Reject out-of-domain parameters before a cycle can see them.
    pub fn validate(&self) -> Result<(), EngineError> {
        let pcr = &self.pcr_thresholds;
        let (lo, hi) = pcr.neutral_range;
        if !(pcr.buy_ce_max > 0.0 && pcr.buy_ce_max < lo && lo <= hi && hi < pcr.buy_pe_min) {
            return Err(EngineError::config(format!(
                "pcr thresholds must satisfy 0 < buy_ce_max < neutral.0 <= neutral.1 < buy_pe_min, \
                 got buy_ce_max={}, neutral=({lo}, {hi}), buy_pe_min={}",
                pcr.buy_ce_max, pcr.buy_pe_min
            )));
        }

        let rsi = &self.rsi_levels;
        if !(rsi.oversold_max > 0.0 && rsi.oversold_max < rsi.overbought_min && rsi.overbought_min < 100.0)
        {
            return Err(EngineError::config(format!(
                "rsi levels must satisfy 0 < oversold_max < overbought_min < 100, \
                 got oversold_max={}, overbought_min={}",
                rsi.oversold_max, rsi.overbought_min
            )));
        }

        let oi = &self.oi_analysis;
        if oi.significant_change_pct <= 0.0 {
            return Err(EngineError::config(format!(
                "oi_analysis.significant_change_pct must be positive, got {}",
                oi.significant_change_pct
            )));
        }
        if oi.volume_spike_multiplier <= 0.0 {
            return Err(EngineError::config(format!(
                "oi_analysis.volume_spike_multiplier must be positive, got {}",
                oi.volume_spike_multiplier
            )));
        }
        if oi.min_oi_level < 0 {
            return Err(EngineError::config(format!(
                "oi_analysis.min_oi_level cannot be negative, got {}",
                oi.min_oi_level
            )));
        }

        if self.signal_cooldown_minutes <= 0 {
            return Err(EngineError::config(format!(
                "signal_cooldown_minutes must be positive, got {}",
                self.signal_cooldown_minutes
            )));
        }
        if !(self.confidence_threshold > 0.0 && self.confidence_threshold <= 1.0) {
            return Err(EngineError::config(format!(
                "confidence_threshold must be in (0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.max_signals_per_hour == 0 {
            return Err(EngineError::config(
                "max_signals_per_hour must be at least 1",
            ));
        }
        if !(0.0..1.0).contains(&self.renewal_noise_margin) {
            return Err(EngineError::config(format!(
                "renewal_noise_margin must be in [0, 1), got {}",
                self.renewal_noise_margin
            )));
        }

        for (name, weight) in &self.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(EngineError::config(format!(
                    "weight for '{name}' must be finite and non-negative, got {weight}"
                )));
            }
        }

        let targets = &self.price_targets;
        if targets.target_multiplier <= 0.0
            || targets.stop_loss_multiplier <= 0.0
            || !targets.min_premium.is_finite()
            || targets.min_premium < 0.0
        {
            return Err(EngineError::config(
                "price_targets multipliers must be positive and min_premium non-negative",
            ));
        }

        Ok(())
    }
}
