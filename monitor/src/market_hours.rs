// Market hours gate
// The engine only sees cycles while the exchange is open

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset, NaiveTime, Utc};

/// Trading session window in exchange-local time.
#[derive(Debug, Clone, Copy)]
pub struct MarketHours {
    open: NaiveTime,
    close: NaiveTime,
    offset: FixedOffset,
}

impl MarketHours {
    /// Build from "HH:MM" open/close strings and a UTC offset in minutes
    /// (330 for the NSE's +05:30).
    pub fn new(open: &str, close: &str, utc_offset_minutes: i32) -> Result<Self> {
        let open = NaiveTime::parse_from_str(open, "%H:%M")
            .with_context(|| format!("invalid market open time '{open}'"))?;
        let close = NaiveTime::parse_from_str(close, "%H:%M")
            .with_context(|| format!("invalid market close time '{close}'"))?;
        if open >= close {
            return Err(anyhow!("market open {open} must precede close {close}"));
        }
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60)
            .ok_or_else(|| anyhow!("invalid utc offset {utc_offset_minutes} minutes"))?;
        Ok(Self { open, close, offset })
    }

    /// Whether the session is open at the given instant.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.offset).time();
        self.open <= local && local <= self.close
    }
}
