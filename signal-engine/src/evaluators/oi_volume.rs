// Open-interest / volume evaluator

use crate::config::OiAnalysis;
use crate::evaluators::{IndicatorEvaluator, IndicatorVote};
use common::IndicatorSnapshot;

/// Votes on open-interest build-up confirmed by a volume spike.
///
/// Strikes below the minimum OI level vote neutral regardless of the
/// change; thin markets produce noise, not signals. A qualifying move
/// needs both a significant OI change and volume at or above the
/// configured multiple of average volume; the direction mapping is the
/// configured [`OiConvention`](crate::config::OiConvention).
#[derive(Debug, Clone)]
pub struct OiVolumeEvaluator {
    params: OiAnalysis,
}

impl OiVolumeEvaluator {
    pub fn new(params: OiAnalysis) -> Self {
        Self { params }
    }
}

impl IndicatorEvaluator for OiVolumeEvaluator {
    fn name(&self) -> &'static str {
        "oi_volume"
    }

    fn evaluate(&self, snapshot: &IndicatorSnapshot) -> IndicatorVote {
        if let Err(e) = snapshot.validate() {
            return IndicatorVote::neutral(format!("oi_volume: invalid snapshot ({e})"));
        }

        if snapshot.oi < self.params.min_oi_level {
            return IndicatorVote::neutral(format!(
                "OI {} below liquidity floor {}",
                snapshot.oi, self.params.min_oi_level
            ));
        }

        let change = snapshot.oi_change_pct;
        if change.abs() < self.params.significant_change_pct {
            return IndicatorVote::neutral(format!(
                "OI change {change:+.1}% below significance {:.1}%",
                self.params.significant_change_pct
            ));
        }

        let volume_floor = snapshot.avg_volume * self.params.volume_spike_multiplier;
        if (snapshot.volume as f64) < volume_floor {
            return IndicatorVote::neutral(format!(
                "volume {} below spike floor {volume_floor:.0}",
                snapshot.volume
            ));
        }

        let rising = change > 0.0;
        let direction = self
            .params
            .convention
            .direction(snapshot.option_type, rising);
        let strength = (change.abs() / (2.0 * self.params.significant_change_pct)).min(1.0);

        IndicatorVote::directional(
            direction,
            strength,
            format!(
                "OI {change:+.1}% on {} with volume spike ({} vs avg {:.0})",
                snapshot.option_type, snapshot.volume, snapshot.avg_volume
            ),
        )
    }
}
