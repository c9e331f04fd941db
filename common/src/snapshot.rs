// Indicator snapshot
// One cleaned market observation per (symbol, strike, option type) and cycle

use crate::instrument::{OptionType, SignalKey};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A snapshot field outside its declared domain. The engine treats this
/// as degraded input, never as a reason to abort a cycle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapshotError {
    #[error("{field} is not finite")]
    NonFinite { field: &'static str },
    #[error("{field} out of domain: {value}")]
    OutOfDomain { field: &'static str, value: f64 },
}

/// Immutable indicator snapshot produced by the external data pipeline.
///
/// `pcr` and `rsi` are computed upstream for the instrument's underlying;
/// `oi`, `volume` and `last_price` belong to the individual strike. The
/// pipeline deduplicates snapshots by key within a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub symbol: String,
    pub strike: Decimal,
    pub option_type: OptionType,
    pub pcr: f64,
    pub rsi: f64,
    pub oi: i64,
    pub oi_change_pct: f64,
    pub volume: i64,
    pub avg_volume: f64,
    pub last_price: f64,
    pub timestamp: DateTime<Utc>,
}

impl IndicatorSnapshot {
    /// Key this snapshot is tracked under.
    pub fn key(&self) -> SignalKey {
        SignalKey::new(self.symbol.clone(), self.strike, self.option_type)
    }

    /// Check every field against its declared domain, returning the first
    /// violation. Upstream validation is the pipeline's job, but consumers
    /// stay defensive and degrade to a neutral vote on bad input.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        Self::finite("pcr", self.pcr)?;
        Self::finite("rsi", self.rsi)?;
        Self::finite("oi_change_pct", self.oi_change_pct)?;
        Self::finite("avg_volume", self.avg_volume)?;
        Self::finite("last_price", self.last_price)?;

        if self.pcr < 0.0 {
            return Err(SnapshotError::OutOfDomain {
                field: "pcr",
                value: self.pcr,
            });
        }
        if !(0.0..=100.0).contains(&self.rsi) {
            return Err(SnapshotError::OutOfDomain {
                field: "rsi",
                value: self.rsi,
            });
        }
        if self.oi < 0 {
            return Err(SnapshotError::OutOfDomain {
                field: "oi",
                value: self.oi as f64,
            });
        }
        if self.volume < 0 {
            return Err(SnapshotError::OutOfDomain {
                field: "volume",
                value: self.volume as f64,
            });
        }
        if self.avg_volume < 0.0 {
            return Err(SnapshotError::OutOfDomain {
                field: "avg_volume",
                value: self.avg_volume,
            });
        }
        if self.last_price < 0.0 {
            return Err(SnapshotError::OutOfDomain {
                field: "last_price",
                value: self.last_price,
            });
        }
        Ok(())
    }

    fn finite(field: &'static str, value: f64) -> Result<(), SnapshotError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(SnapshotError::NonFinite { field })
        }
    }
}
