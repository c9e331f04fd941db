// Signal lifecycle manager
// Owns the tracked-signal table, the only state that survives across cycles

use crate::aggregator::SignalDecision;
use crate::config::SignalConfig;
use crate::error::EngineError;
use chrono::{DateTime, Utc};
use common::{ExpiryReason, PriceLevels, SignalEvent, SignalEventKind, SignalKey, TrackedSignal};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};

/// Expired signals kept per key for the query surface.
const HISTORY_CAP: usize = 32;

/// Per-key decision applied once per cycle.
enum Action {
    CreateIfQualifies,
    ExpireThenCreate,
    Renew,
    Flip,
    Hold,
}

/// Key-indexed table of tracked signals behind a single mutation boundary.
/// The tracker is the exclusive owner of this state for the process
/// lifetime; all writes happen on one logical thread of control, which is
/// what keeps the one-active-signal-per-key invariant trivially true.
#[derive(Default)]
pub struct SignalTracker {
    active: HashMap<SignalKey, TrackedSignal>,
    history: HashMap<SignalKey, VecDeque<TrackedSignal>>,
}

impl SignalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the latest decision for one key, returning the lifecycle
    /// events it produced. CREATE events returned here are not yet
    /// rate-limited; the engine decides admission afterwards.
    pub fn apply(
        &mut self,
        key: &SignalKey,
        decision: &SignalDecision,
        levels: PriceLevels,
        now: DateTime<Utc>,
        config: &SignalConfig,
    ) -> Vec<SignalEvent> {
        let qualifies = decision.qualifies(config.confidence_threshold);

        let action = match self.active.get(key) {
            None => Action::CreateIfQualifies,
            // A decision arriving at or past expires_at cannot renew: the
            // signal expires first, then the key is eligible again.
            Some(signal) if signal.is_expired_at(now) => Action::ExpireThenCreate,
            Some(signal) if qualifies && decision.direction == signal.direction => Action::Renew,
            Some(_) if qualifies => Action::Flip,
            Some(_) => Action::Hold,
        };

        let mut events = Vec::new();
        match action {
            Action::CreateIfQualifies => {
                if qualifies {
                    events.push(self.create(key, decision, levels, now, config));
                }
            }
            Action::ExpireThenCreate => {
                events.extend(self.expire(key, ExpiryReason::CooldownElapsed, now));
                if qualifies {
                    events.push(self.create(key, decision, levels, now, config));
                }
            }
            Action::Renew => {
                events.extend(self.renew(key, decision, now, config));
            }
            Action::Flip => {
                events.extend(self.expire(key, ExpiryReason::DirectionFlip, now));
                events.push(self.create(key, decision, levels, now, config));
            }
            Action::Hold => {
                // A sub-threshold or neutral reading does not close an
                // in-force signal; it stays valid until natural expiry.
                debug!(
                    "Holding {key}: decision {} (confidence {:.2}) below renewal bar",
                    decision.direction, decision.confidence
                );
            }
        }
        events
    }

    /// Expire every remaining signal whose validity window has elapsed.
    /// Covers keys that received no snapshot this cycle.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> Vec<SignalEvent> {
        let elapsed: Vec<SignalKey> = self
            .active
            .iter()
            .filter(|(_, signal)| signal.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        elapsed
            .iter()
            .filter_map(|key| self.expire(key, ExpiryReason::CooldownElapsed, now))
            .collect()
    }

    /// Verify table invariants before a cycle mutates anything. A
    /// violation here is a programming error and must abort the cycle
    /// rather than be repaired by guessing.
    pub fn check_consistency(&self) -> Result<(), EngineError> {
        for (key, signal) in &self.active {
            if !signal.is_active {
                return Err(EngineError::state(format!(
                    "inactive signal in active table for {key}"
                )));
            }
            if &signal.key != key {
                return Err(EngineError::state(format!(
                    "signal keyed under {key} carries key {}",
                    signal.key
                )));
            }
        }
        for (key, archived) in &self.history {
            if archived.iter().any(|signal| signal.is_active) {
                return Err(EngineError::state(format!(
                    "active signal in archive for {key}"
                )));
            }
        }
        Ok(())
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Read-only view of currently active signals.
    pub fn list_active(&self) -> Vec<TrackedSignal> {
        self.active.values().cloned().collect()
    }

    /// Archived (expired) signals for a key, oldest first.
    pub fn history(&self, key: &SignalKey) -> Vec<TrackedSignal> {
        self.history
            .get(key)
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn create(
        &mut self,
        key: &SignalKey,
        decision: &SignalDecision,
        levels: PriceLevels,
        now: DateTime<Utc>,
        config: &SignalConfig,
    ) -> SignalEvent {
        let signal = TrackedSignal::open(
            key.clone(),
            decision.direction,
            decision.confidence,
            levels,
            now,
            config.cooldown(),
        );
        info!(
            "Created {} signal for {key} (confidence {:.2}, expires {})",
            signal.direction, signal.confidence, signal.expires_at
        );
        let event = Self::event(
            SignalEventKind::Create,
            &signal,
            decision.contributing_reasons.clone(),
            now,
        );
        self.active.insert(key.clone(), signal);
        event
    }

    fn renew(
        &mut self,
        key: &SignalKey,
        decision: &SignalDecision,
        now: DateTime<Utc>,
        config: &SignalConfig,
    ) -> Option<SignalEvent> {
        let signal = self.active.get_mut(key)?;
        let previous_confidence = signal.confidence;

        signal.confidence = decision.confidence;
        signal.last_renewed_at = now;
        signal.expires_at = now + config.cooldown();
        signal.renewed_count += 1;
        debug!(
            "Renewed {key} (#{}), valid until {}",
            signal.renewed_count, signal.expires_at
        );

        // The validity extension above is unconditional; only the outward
        // RENEW notification is gated on a meaningful confidence move.
        if (decision.confidence - previous_confidence).abs() > config.renewal_noise_margin {
            Some(Self::event(
                SignalEventKind::Renew,
                signal,
                decision.contributing_reasons.clone(),
                now,
            ))
        } else {
            None
        }
    }

    fn expire(
        &mut self,
        key: &SignalKey,
        reason: ExpiryReason,
        now: DateTime<Utc>,
    ) -> Option<SignalEvent> {
        let mut signal = self.active.remove(key)?;
        signal.is_active = false;
        info!("Expired {} signal for {key}: {reason}", signal.direction);

        let event = Self::event(
            SignalEventKind::Expire,
            &signal,
            vec![reason.to_string()],
            now,
        );

        let ring = self.history.entry(key.clone()).or_default();
        ring.push_back(signal);
        if ring.len() > HISTORY_CAP {
            ring.pop_front();
        }
        Some(event)
    }

    fn event(
        kind: SignalEventKind,
        signal: &TrackedSignal,
        reasons: Vec<String>,
        now: DateTime<Utc>,
    ) -> SignalEvent {
        SignalEvent {
            signal_id: signal.id,
            kind,
            key: signal.key.clone(),
            direction: signal.direction,
            confidence: signal.confidence,
            reasons,
            levels: signal.levels,
            timestamp: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use common::{OptionType, SignalDirection};
    use rust_decimal_macros::dec;

    fn key() -> SignalKey {
        SignalKey::new("NIFTY", dec!(21000), OptionType::Ce)
    }

    fn levels() -> PriceLevels {
        PriceLevels {
            entry_price: dec!(142.5),
            target_price: dec!(189.53),
            stop_loss: dec!(114.0),
        }
    }

    fn decision(direction: SignalDirection, confidence: f64) -> SignalDecision {
        SignalDecision {
            direction,
            confidence,
            contributing_reasons: vec!["test reason".to_string()],
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_subthreshold_decision_creates_nothing() {
        let mut tracker = SignalTracker::new();
        let config = SignalConfig::default();
        let events = tracker.apply(
            &key(),
            &decision(SignalDirection::BuyCe, 0.5),
            levels(),
            t0(),
            &config,
        );
        assert!(events.is_empty());
        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn test_qualifying_decision_creates_signal() {
        let mut tracker = SignalTracker::new();
        let config = SignalConfig::default();
        let events = tracker.apply(
            &key(),
            &decision(SignalDirection::BuyCe, 0.8),
            levels(),
            t0(),
            &config,
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, SignalEventKind::Create);
        assert_eq!(events[0].reasons, vec!["test reason"]);

        let active = tracker.list_active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].expires_at, t0() + Duration::minutes(15));
        assert_eq!(active[0].renewed_count, 0);
    }

    #[test]
    fn test_renewal_extends_expiry_even_without_renew_event() {
        let mut tracker = SignalTracker::new();
        let config = SignalConfig::default();
        tracker.apply(&key(), &decision(SignalDirection::BuyCe, 0.8), levels(), t0(), &config);

        // Same confidence five minutes later: inside the noise margin, so
        // no RENEW event, but the validity window must still move.
        let t1 = t0() + Duration::minutes(5);
        let events = tracker.apply(&key(), &decision(SignalDirection::BuyCe, 0.8), levels(), t1, &config);
        assert!(events.is_empty());

        let signal = &tracker.list_active()[0];
        assert_eq!(signal.expires_at, t1 + Duration::minutes(15));
        assert!(signal.expires_at > t0() + Duration::minutes(15));
        assert_eq!(signal.renewed_count, 1);
        assert_eq!(signal.last_renewed_at, t1);
    }

    #[test]
    fn test_renewal_with_confidence_move_emits_renew() {
        let mut tracker = SignalTracker::new();
        let config = SignalConfig::default();
        tracker.apply(&key(), &decision(SignalDirection::BuyCe, 0.72), levels(), t0(), &config);

        let t1 = t0() + Duration::minutes(5);
        let events = tracker.apply(&key(), &decision(SignalDirection::BuyCe, 0.9), levels(), t1, &config);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, SignalEventKind::Renew);
        assert!((events[0].confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_direction_flip_expires_then_creates() {
        let mut tracker = SignalTracker::new();
        let config = SignalConfig::default();
        tracker.apply(&key(), &decision(SignalDirection::BuyCe, 0.8), levels(), t0(), &config);
        let first_id = tracker.list_active()[0].id;

        let t1 = t0() + Duration::minutes(5);
        let events = tracker.apply(&key(), &decision(SignalDirection::BuyPe, 0.85), levels(), t1, &config);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, SignalEventKind::Expire);
        assert_eq!(events[0].reasons, vec!["direction_flip"]);
        assert_eq!(events[1].kind, SignalEventKind::Create);

        let active = tracker.list_active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].direction, SignalDirection::BuyPe);
        assert_eq!(active[0].renewed_count, 0);
        assert_ne!(active[0].id, first_id);

        // The flipped-out signal lands in the archive.
        assert_eq!(tracker.history(&key()).len(), 1);
        assert!(!tracker.history(&key())[0].is_active);
    }

    #[test]
    fn test_subthreshold_dip_holds_until_natural_expiry() {
        let mut tracker = SignalTracker::new();
        let config = SignalConfig::default();
        tracker.apply(&key(), &decision(SignalDirection::BuyCe, 0.8), levels(), t0(), &config);

        let t1 = t0() + Duration::minutes(5);
        let events = tracker.apply(&key(), &decision(SignalDirection::BuyCe, 0.3), levels(), t1, &config);
        assert!(events.is_empty());

        let signal = &tracker.list_active()[0];
        // No renewal happened: window unchanged from creation.
        assert_eq!(signal.expires_at, t0() + Duration::minutes(15));
        assert_eq!(signal.renewed_count, 0);
    }

    #[test]
    fn test_sweep_expires_exactly_at_window_end() {
        let mut tracker = SignalTracker::new();
        let config = SignalConfig::default();
        tracker.apply(&key(), &decision(SignalDirection::BuyCe, 0.8), levels(), t0(), &config);

        // One microsecond before the window ends: still active.
        let just_before = t0() + Duration::minutes(15) - Duration::microseconds(1);
        assert!(tracker.sweep(just_before).is_empty());
        assert_eq!(tracker.active_count(), 1);

        let at_expiry = t0() + Duration::minutes(15) + Duration::microseconds(1);
        let events = tracker.sweep(at_expiry);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, SignalEventKind::Expire);
        assert_eq!(events[0].reasons, vec!["cooldown_elapsed"]);
        assert_eq!(tracker.active_count(), 0);
        assert_eq!(tracker.history(&key()).len(), 1);
    }

    #[test]
    fn test_late_decision_expires_then_recreates_same_cycle() {
        let mut tracker = SignalTracker::new();
        let config = SignalConfig::default();
        tracker.apply(&key(), &decision(SignalDirection::BuyCe, 0.8), levels(), t0(), &config);

        let late = t0() + Duration::minutes(20);
        let events = tracker.apply(&key(), &decision(SignalDirection::BuyCe, 0.8), levels(), late, &config);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, SignalEventKind::Expire);
        assert_eq!(events[0].reasons, vec!["cooldown_elapsed"]);
        assert_eq!(events[1].kind, SignalEventKind::Create);

        let signal = &tracker.list_active()[0];
        assert_eq!(signal.renewed_count, 0);
        assert_eq!(signal.created_at, late);
    }

    #[test]
    fn test_one_active_signal_per_key_across_arbitrary_cycles() {
        let mut tracker = SignalTracker::new();
        let config = SignalConfig::default();
        let directions = [
            SignalDirection::BuyCe,
            SignalDirection::BuyPe,
            SignalDirection::BuyCe,
            SignalDirection::Neutral,
            SignalDirection::BuyPe,
        ];

        let mut now = t0();
        for direction in directions {
            now += Duration::minutes(4);
            tracker.apply(&key(), &decision(direction, 0.85), levels(), now, &config);
            tracker.sweep(now);
            assert!(tracker.active_count() <= 1);
            assert!(tracker.check_consistency().is_ok());
        }
    }

    #[test]
    fn test_consistency_check_catches_corrupted_state() {
        let mut tracker = SignalTracker::new();
        let config = SignalConfig::default();
        tracker.apply(&key(), &decision(SignalDirection::BuyCe, 0.8), levels(), t0(), &config);

        tracker.active.get_mut(&key()).unwrap().is_active = false;
        assert!(matches!(
            tracker.check_consistency(),
            Err(EngineError::StateConsistency(_))
        ));
    }
}
