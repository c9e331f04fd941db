// Confidence aggregator
// Folds weighted evaluator votes into one directional call per snapshot

use crate::evaluators::IndicatorVote;
use common::SignalDirection;

/// Aggregate output for one snapshot. Ephemeral; the lifecycle manager
/// consumes it and it is discarded at the end of the cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDecision {
    pub direction: SignalDirection,
    pub confidence: f64,
    /// Reasons from evaluators that voted for the winning direction,
    /// ordered by descending strength. Keeps every emitted signal
    /// auditable back to the indicators that drove it.
    pub contributing_reasons: Vec<String>,
}

impl SignalDecision {
    /// Decision with no directional call.
    pub fn neutral() -> Self {
        Self {
            direction: SignalDirection::Neutral,
            confidence: 0.0,
            contributing_reasons: Vec::new(),
        }
    }

    /// Whether this decision clears the bar for creating or renewing a
    /// signal.
    pub fn qualifies(&self, confidence_threshold: f64) -> bool {
        self.direction != SignalDirection::Neutral && self.confidence >= confidence_threshold
    }
}

/// Combine weighted votes: the direction with the larger weighted strength
/// sum wins; an exact tie is ambiguity and yields no directional call.
/// Confidence is the winning sum normalized by the total weight of every
/// evaluator that voted non-neutral, clamped into [0, 1].
pub fn aggregate(votes: &[(f64, IndicatorVote)]) -> SignalDecision {
    let mut ce_sum = 0.0;
    let mut pe_sum = 0.0;
    let mut voted_weight = 0.0;

    for (weight, vote) in votes {
        match vote.direction {
            SignalDirection::BuyCe => {
                ce_sum += weight * vote.strength;
                voted_weight += weight;
            }
            SignalDirection::BuyPe => {
                pe_sum += weight * vote.strength;
                voted_weight += weight;
            }
            SignalDirection::Neutral => {}
        }
    }

    if voted_weight <= 0.0 {
        return SignalDecision::neutral();
    }

    let direction = if ce_sum > pe_sum {
        SignalDirection::BuyCe
    } else if pe_sum > ce_sum {
        SignalDirection::BuyPe
    } else {
        // Equal weighted sums: ambiguity must not produce a call.
        return SignalDecision::neutral();
    };

    let winning_sum = ce_sum.max(pe_sum);
    let confidence = (winning_sum / voted_weight).clamp(0.0, 1.0);

    let mut winners: Vec<&IndicatorVote> = votes
        .iter()
        .filter(|(_, vote)| vote.direction == direction)
        .map(|(_, vote)| vote)
        .collect();
    winners.sort_by(|a, b| {
        b.strength
            .partial_cmp(&a.strength)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    SignalDecision {
        direction,
        confidence,
        contributing_reasons: winners.into_iter().map(|v| v.reason.clone()).collect(),
    }
}
