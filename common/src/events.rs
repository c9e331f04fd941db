// Signal events
// Finalized lifecycle events pushed to the dispatch gateway

use crate::instrument::SignalKey;
use crate::signal::{PriceLevels, SignalDirection};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Event type emitted by the lifecycle manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalEventKind {
    Create,
    Renew,
    Expire,
    /// A CREATE that was withheld from notification by the rate limiter.
    /// The signal is still tracked internally.
    Suppressed,
}

impl fmt::Display for SignalEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalEventKind::Create => write!(f, "CREATE"),
            SignalEventKind::Renew => write!(f, "RENEW"),
            SignalEventKind::Expire => write!(f, "EXPIRE"),
            SignalEventKind::Suppressed => write!(f, "SUPPRESSED"),
        }
    }
}

/// One finalized signal event. The dispatch gateway maps these to
/// persistence and notification; the engine never calls either directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalEvent {
    /// Id of the tracked signal this event refers to.
    pub signal_id: Uuid,
    pub kind: SignalEventKind,
    pub key: SignalKey,
    pub direction: SignalDirection,
    pub confidence: f64,
    /// Indicator reasons in descending strength order, plus lifecycle
    /// annotations (expiry cause, suppression note).
    pub reasons: Vec<String>,
    pub levels: PriceLevels,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for SignalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} confidence={:.2}",
            self.kind, self.key, self.direction, self.confidence
        )
    }
}
