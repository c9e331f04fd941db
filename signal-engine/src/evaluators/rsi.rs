// Relative strength index evaluator

use crate::config::RsiLevels;
use crate::evaluators::{IndicatorEvaluator, IndicatorVote};
use common::{IndicatorSnapshot, SignalDirection};

/// Votes on RSI extremes. Oversold favors a bounce (call side), overbought
/// favors a pullback (put side); everything in between is neutral.
#[derive(Debug, Clone)]
pub struct RsiEvaluator {
    levels: RsiLevels,
}

impl RsiEvaluator {
    pub fn new(levels: RsiLevels) -> Self {
        Self { levels }
    }
}

impl IndicatorEvaluator for RsiEvaluator {
    fn name(&self) -> &'static str {
        "rsi"
    }

    fn evaluate(&self, snapshot: &IndicatorSnapshot) -> IndicatorVote {
        if let Err(e) = snapshot.validate() {
            return IndicatorVote::neutral(format!("rsi: invalid snapshot ({e})"));
        }

        let rsi = snapshot.rsi;
        if rsi < self.levels.oversold_max {
            let strength = (self.levels.oversold_max - rsi) / self.levels.oversold_max;
            IndicatorVote::directional(
                SignalDirection::BuyCe,
                strength,
                format!("RSI {rsi:.1} oversold (below {:.1})", self.levels.oversold_max),
            )
        } else if rsi > self.levels.overbought_min {
            let strength = (rsi - self.levels.overbought_min) / (100.0 - self.levels.overbought_min);
            IndicatorVote::directional(
                SignalDirection::BuyPe,
                strength,
                format!(
                    "RSI {rsi:.1} overbought (above {:.1})",
                    self.levels.overbought_min
                ),
            )
        } else {
            IndicatorVote::neutral(format!("RSI {rsi:.1} in neutral zone"))
        }
    }
}
