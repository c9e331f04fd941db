// Put-call ratio evaluator

use crate::config::PcrThresholds;
use crate::evaluators::{IndicatorEvaluator, IndicatorVote};
use common::{IndicatorSnapshot, SignalDirection};

/// Votes on the put-call ratio.
///
/// Inside the neutral band the vote is neutral with zero strength. Outside
/// it, strength ramps linearly from 0 at the band edge to 1 at the trigger
/// threshold (`buy_ce_max` on the bullish side, `buy_pe_min` on the
/// bearish side) and saturates beyond it, so strength is continuous rather
/// than a step at the trigger.
#[derive(Debug, Clone)]
pub struct PcrEvaluator {
    thresholds: PcrThresholds,
}

impl PcrEvaluator {
    pub fn new(thresholds: PcrThresholds) -> Self {
        Self { thresholds }
    }
}

impl IndicatorEvaluator for PcrEvaluator {
    fn name(&self) -> &'static str {
        "pcr"
    }

    fn evaluate(&self, snapshot: &IndicatorSnapshot) -> IndicatorVote {
        if let Err(e) = snapshot.validate() {
            return IndicatorVote::neutral(format!("pcr: invalid snapshot ({e})"));
        }

        let pcr = snapshot.pcr;
        let (band_lo, band_hi) = self.thresholds.neutral_range;

        if pcr < band_lo {
            let strength = (band_lo - pcr) / (band_lo - self.thresholds.buy_ce_max);
            IndicatorVote::directional(
                SignalDirection::BuyCe,
                strength,
                format!(
                    "PCR {pcr:.2} below neutral band (bullish trigger {:.2})",
                    self.thresholds.buy_ce_max
                ),
            )
        } else if pcr > band_hi {
            let strength = (pcr - band_hi) / (self.thresholds.buy_pe_min - band_hi);
            IndicatorVote::directional(
                SignalDirection::BuyPe,
                strength,
                format!(
                    "PCR {pcr:.2} above neutral band (bearish trigger {:.2})",
                    self.thresholds.buy_pe_min
                ),
            )
        } else {
            IndicatorVote::neutral(format!(
                "PCR {pcr:.2} inside neutral band ({band_lo:.2}-{band_hi:.2})"
            ))
        }
    }
}
