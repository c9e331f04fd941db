// Signal engine
// One decision pass per fetch cycle: evaluate, aggregate, update lifecycle,
// rate-limit, dispatch

use crate::aggregator::aggregate;
use crate::config::{PriceTargets, SignalConfig};
use crate::dispatch::DispatchGateway;
use crate::error::EngineError;
use crate::evaluators::EvaluatorRegistry;
use crate::lifecycle::SignalTracker;
use crate::ratelimit::RateLimiter;
use chrono::{DateTime, Utc};
use common::{IndicatorSnapshot, PriceLevels, SignalEvent, SignalEventKind, SignalKey, TrackedSignal};
use rust_decimal::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Read-only engine status for the monitor and dashboard collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub enabled: bool,
    pub active_signals: usize,
    pub rate_limit_remaining: usize,
    pub confidence_threshold: f64,
    pub cooldown_minutes: i64,
}

/// The multi-indicator decision engine. Owns the tracked-signal table for
/// the process lifetime; the scheduler must serialize `run_cycle` calls,
/// which single ownership of `&mut self` already enforces in-process.
pub struct SignalEngine {
    config: SignalConfig,
    registry: EvaluatorRegistry,
    tracker: SignalTracker,
    limiter: RateLimiter,
    gateway: Box<dyn DispatchGateway>,
}

impl SignalEngine {
    /// Build an engine, rejecting invalid configuration before any cycle
    /// can run with it.
    pub fn new(config: SignalConfig, gateway: Box<dyn DispatchGateway>) -> Result<Self, EngineError> {
        config.validate()?;
        let registry = EvaluatorRegistry::from_config(&config)?;
        let limiter = RateLimiter::hourly(config.max_signals_per_hour);
        Ok(Self {
            config,
            registry,
            tracker: SignalTracker::new(),
            limiter,
            gateway,
        })
    }

    /// Hot-reload configuration between cycles. Validation happens before
    /// anything is swapped, so a bad reload leaves the engine running on
    /// the previous configuration.
    pub fn update_config(&mut self, config: SignalConfig) -> Result<(), EngineError> {
        config.validate()?;
        let registry = EvaluatorRegistry::from_config(&config)?;
        self.limiter.set_max(config.max_signals_per_hour);
        self.registry = registry;
        self.config = config;
        info!("Signal configuration reloaded");
        Ok(())
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Run one decision pass over the cycle's snapshots (at most one per
    /// key, deduplicated upstream). Returns every event the cycle
    /// produced, after rate limiting, in emission order.
    pub async fn run_cycle(
        &mut self,
        snapshots: &[IndicatorSnapshot],
        now: DateTime<Utc>,
    ) -> Result<Vec<SignalEvent>, EngineError> {
        if !self.config.enabled {
            debug!("Signal generation disabled, skipping cycle");
            return Ok(Vec::new());
        }

        // Invariants are checked before any mutation; past this point the
        // decision path is infallible, so a cycle either completes fully
        // or aborts here with prior state untouched.
        self.tracker.check_consistency()?;

        let mut events = Vec::new();
        for snapshot in snapshots {
            let key = snapshot.key();
            let votes = self.registry.evaluate(snapshot);
            let decision = aggregate(&votes);
            debug!(
                "Decision for {key}: {} confidence {:.2}",
                decision.direction, decision.confidence
            );

            let levels = price_levels(snapshot, &self.config.price_targets);
            events.extend(self.tracker.apply(&key, &decision, levels, now, &self.config));
        }
        events.extend(self.tracker.sweep(now));

        // Only CREATEs are capped. A suppressed signal stays tracked
        // internally; suppression changes what the outside world is told,
        // not what the engine believes.
        for event in &mut events {
            if event.kind == SignalEventKind::Create && !self.limiter.admit(now) {
                event.kind = SignalEventKind::Suppressed;
                event.reasons.push(format!(
                    "suppressed by rate limit ({} per hour)",
                    self.config.max_signals_per_hour
                ));
            }
        }

        for event in &events {
            if let Err(e) = self.gateway.dispatch(event).await {
                warn!("Failed to dispatch {event}: {e}");
            }
        }

        if !events.is_empty() {
            info!(
                "Cycle produced {} events, {} active signals",
                events.len(),
                self.tracker.active_count()
            );
        }
        Ok(events)
    }

    /// Currently active signals, read-only.
    pub fn list_active_signals(&self) -> Vec<TrackedSignal> {
        self.tracker.list_active()
    }

    /// Archived signals for a key, oldest first.
    pub fn signal_history(&self, key: &SignalKey) -> Vec<TrackedSignal> {
        self.tracker.history(key)
    }

    pub fn status(&self, now: DateTime<Utc>) -> EngineStatus {
        EngineStatus {
            enabled: self.config.enabled,
            active_signals: self.tracker.active_count(),
            rate_limit_remaining: self.limiter.remaining(now),
            confidence_threshold: self.config.confidence_threshold,
            cooldown_minutes: self.config.signal_cooldown_minutes,
        }
    }
}

/// Entry/target/stop for a newly created signal. The traded premium is the
/// entry; a strike with no premium falls back to the configured floor.
fn price_levels(snapshot: &IndicatorSnapshot, targets: &PriceTargets) -> PriceLevels {
    let entry = if snapshot.last_price.is_finite() && snapshot.last_price > 0.0 {
        snapshot.last_price
    } else {
        targets.min_premium
    };

    let to_decimal = |value: f64| Decimal::from_f64(value).unwrap_or_default().round_dp(2);
    PriceLevels {
        entry_price: to_decimal(entry),
        target_price: to_decimal(entry * targets.target_multiplier),
        stop_loss: to_decimal(entry * targets.stop_loss_multiplier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::InMemoryGateway;
    use chrono::{Duration, TimeZone};
    use common::OptionType;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, 10, 0, 0).unwrap()
    }

    fn snapshot(strike: Decimal, pcr: f64, rsi: f64, oi_change_pct: f64) -> IndicatorSnapshot {
        IndicatorSnapshot {
            symbol: "NIFTY".to_string(),
            strike,
            option_type: OptionType::Ce,
            pcr,
            rsi,
            oi: 120_000,
            oi_change_pct,
            volume: 40_000,
            avg_volume: 15_000.0,
            last_price: 142.5,
            timestamp: t0(),
        }
    }

    /// PCR below trigger, RSI oversold, OI building with a volume spike.
    fn bullish_snapshot(strike: Decimal) -> IndicatorSnapshot {
        snapshot(strike, 0.65, 25.0, 20.0)
    }

    fn engine_with_gateway(config: SignalConfig) -> (SignalEngine, Arc<InMemoryGateway>) {
        let gateway = Arc::new(InMemoryGateway::new());
        let engine = SignalEngine::new(config, Box::new(gateway.clone())).unwrap();
        (engine, gateway)
    }

    fn test_config() -> SignalConfig {
        SignalConfig {
            confidence_threshold: 0.6,
            ..SignalConfig::default()
        }
    }

    #[tokio::test]
    async fn test_multi_indicator_agreement_creates_signal() {
        let (mut engine, gateway) = engine_with_gateway(test_config());

        let events = engine
            .run_cycle(&[bullish_snapshot(dec!(21000))], t0())
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, SignalEventKind::Create);
        assert_eq!(events[0].direction, common::SignalDirection::BuyCe);
        assert!(events[0].confidence > 0.6);
        // Reasons cite each agreeing indicator, strongest first.
        assert_eq!(events[0].reasons.len(), 3);
        assert!(events[0].reasons[0].contains("PCR"));

        assert_eq!(gateway.events().await.len(), 1);
        assert_eq!(engine.list_active_signals().len(), 1);
    }

    #[tokio::test]
    async fn test_all_neutral_indicators_create_nothing() {
        let (mut engine, gateway) = engine_with_gateway(test_config());

        // PCR in band, RSI mid-range, OI change below significance.
        let events = engine
            .run_cycle(&[snapshot(dec!(21000), 0.9, 50.0, 5.0)], t0())
            .await
            .unwrap();

        assert!(events.is_empty());
        assert!(gateway.events().await.is_empty());
        assert!(engine.list_active_signals().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_suppresses_third_create_but_tracks_it() {
        let config = SignalConfig {
            max_signals_per_hour: 2,
            ..test_config()
        };
        let (mut engine, gateway) = engine_with_gateway(config);

        let snapshots = vec![
            bullish_snapshot(dec!(21000)),
            bullish_snapshot(dec!(21050)),
            bullish_snapshot(dec!(21100)),
        ];
        let events = engine.run_cycle(&snapshots, t0()).await.unwrap();

        let creates = events
            .iter()
            .filter(|e| e.kind == SignalEventKind::Create)
            .count();
        let suppressed: Vec<_> = events
            .iter()
            .filter(|e| e.kind == SignalEventKind::Suppressed)
            .collect();
        assert_eq!(creates, 2);
        assert_eq!(suppressed.len(), 1);
        assert!(suppressed[0]
            .reasons
            .iter()
            .any(|r| r.contains("rate limit")));

        // Suppression is notification-only: all three are tracked.
        assert_eq!(engine.list_active_signals().len(), 3);
        assert_eq!(gateway.events().await.len(), 3);
    }

    #[tokio::test]
    async fn test_expire_events_are_never_rate_limited() {
        let config = SignalConfig {
            max_signals_per_hour: 1,
            ..test_config()
        };
        let (mut engine, _gateway) = engine_with_gateway(config);

        engine
            .run_cycle(&[bullish_snapshot(dec!(21000))], t0())
            .await
            .unwrap();

        // Past expiry with no snapshots: the EXPIRE must come through even
        // though the hourly CREATE budget is spent.
        let events = engine
            .run_cycle(&[], t0() + Duration::minutes(16))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, SignalEventKind::Expire);
    }

    #[tokio::test]
    async fn test_repeat_decision_extends_validity_without_new_events() {
        let (mut engine, gateway) = engine_with_gateway(test_config());

        engine
            .run_cycle(&[bullish_snapshot(dec!(21000))], t0())
            .await
            .unwrap();
        gateway.clear().await;

        let t1 = t0() + Duration::minutes(5);
        let events = engine
            .run_cycle(&[bullish_snapshot(dec!(21000))], t1)
            .await
            .unwrap();

        // Identical confidence: no RENEW notification...
        assert!(events.is_empty());
        assert!(gateway.events().await.is_empty());

        // ...but the validity window still moved forward.
        let active = engine.list_active_signals();
        assert_eq!(active[0].expires_at, t1 + Duration::minutes(15));
        assert_eq!(active[0].renewed_count, 1);
    }

    #[tokio::test]
    async fn test_price_levels_follow_premium_and_multipliers() {
        let (mut engine, _gateway) = engine_with_gateway(test_config());

        let events = engine
            .run_cycle(&[bullish_snapshot(dec!(21000))], t0())
            .await
            .unwrap();

        let levels = events[0].levels;
        assert_eq!(levels.entry_price, dec!(142.50));
        // 142.5 * 1.33 = 189.525, within a cent after float conversion.
        assert!((levels.target_price - dec!(189.53)).abs() <= dec!(0.01));
        assert_eq!(levels.stop_loss, dec!(114.00)); // 142.5 * 0.8
    }

    #[tokio::test]
    async fn test_invalid_reload_keeps_previous_config() {
        let (mut engine, _gateway) = engine_with_gateway(test_config());

        let bad = SignalConfig {
            signal_cooldown_minutes: 0,
            ..SignalConfig::default()
        };
        assert!(engine.update_config(bad).is_err());
        assert_eq!(engine.config().signal_cooldown_minutes, 15);
        assert_eq!(engine.config().confidence_threshold, 0.6);
    }

    #[tokio::test]
    async fn test_disabled_engine_skips_cycles() {
        let config = SignalConfig {
            enabled: false,
            ..test_config()
        };
        let (mut engine, gateway) = engine_with_gateway(config);

        let events = engine
            .run_cycle(&[bullish_snapshot(dec!(21000))], t0())
            .await
            .unwrap();
        assert!(events.is_empty());
        assert!(gateway.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_status_reports_active_and_rate_budget() {
        let config = SignalConfig {
            max_signals_per_hour: 6,
            ..test_config()
        };
        let (mut engine, _gateway) = engine_with_gateway(config);

        engine
            .run_cycle(&[bullish_snapshot(dec!(21000))], t0())
            .await
            .unwrap();

        let status = engine.status(t0());
        assert!(status.enabled);
        assert_eq!(status.active_signals, 1);
        assert_eq!(status.rate_limit_remaining, 5);
        assert_eq!(status.cooldown_minutes, 15);
    }
}
