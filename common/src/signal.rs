// Tracked signal state
// The only entity that persists across decision cycles

use crate::instrument::SignalKey;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Directional call for a strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalDirection {
    BuyCe,
    BuyPe,
    Neutral,
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalDirection::BuyCe => write!(f, "BUY_CE"),
            SignalDirection::BuyPe => write!(f, "BUY_PE"),
            SignalDirection::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Why an active signal was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryReason {
    CooldownElapsed,
    DirectionFlip,
}

impl fmt::Display for ExpiryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiryReason::CooldownElapsed => write!(f, "cooldown_elapsed"),
            ExpiryReason::DirectionFlip => write!(f, "direction_flip"),
        }
    }
}

/// Entry, target and stop prices stamped on a signal at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevels {
    pub entry_price: Decimal,
    pub target_price: Decimal,
    pub stop_loss: Decimal,
}

/// A signal the engine is currently tracking (or has archived), keyed by
/// `(symbol, strike, option_type)`.
///
/// Invariants: at most one active signal per key; `expires_at` equals
/// `last_renewed_at + cooldown` and never decreases while active; a
/// direction flip closes the signal instead of mutating its direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedSignal {
    pub id: Uuid,
    pub key: SignalKey,
    pub direction: SignalDirection,
    pub confidence: f64,
    pub levels: PriceLevels,
    pub created_at: DateTime<Utc>,
    pub last_renewed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub renewed_count: u32,
    pub is_active: bool,
}

impl TrackedSignal {
    /// Open a new signal valid for `cooldown` from `now`.
    pub fn open(
        key: SignalKey,
        direction: SignalDirection,
        confidence: f64,
        levels: PriceLevels,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            key,
            direction,
            confidence,
            levels,
            created_at: now,
            last_renewed_at: now,
            expires_at: now + cooldown,
            renewed_count: 0,
            is_active: true,
        }
    }

    /// Whether the validity window has elapsed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
