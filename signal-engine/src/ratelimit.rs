// Rate limiter
// Sliding-window cap on externally visible CREATE events

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use tracing::debug;

/// Sliding-count limiter over a trailing window. Unlike fixed buckets, a
/// burst straddling a boundary cannot be double-permitted: every admit
/// call prunes against `now - window` before counting.
#[derive(Debug)]
pub struct RateLimiter {
    max_per_window: usize,
    window: Duration,
    admitted: VecDeque<DateTime<Utc>>,
}

impl RateLimiter {
    pub fn new(max_per_window: usize, window: Duration) -> Self {
        Self {
            max_per_window,
            window,
            admitted: VecDeque::new(),
        }
    }

    /// Limiter over a trailing hour, the signal engine's notification cap.
    pub fn hourly(max_per_hour: usize) -> Self {
        Self::new(max_per_hour, Duration::hours(1))
    }

    /// Try to admit one event at `now`. Admission is recorded; a denied
    /// event leaves the window untouched.
    pub fn admit(&mut self, now: DateTime<Utc>) -> bool {
        self.prune(now);
        if self.admitted.len() < self.max_per_window {
            self.admitted.push_back(now);
            true
        } else {
            debug!(
                "Rate limit reached: {} events in trailing {}m",
                self.admitted.len(),
                self.window.num_minutes()
            );
            false
        }
    }

    /// Admissions left in the window ending at `now`.
    pub fn remaining(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.window;
        let in_window = self.admitted.iter().filter(|t| **t > cutoff).count();
        self.max_per_window.saturating_sub(in_window)
    }

    /// Adjust the cap on a config reload; the recorded window is kept so a
    /// reload cannot re-open a window that was already spent.
    pub fn set_max(&mut self, max_per_window: usize) {
        self.max_per_window = max_per_window;
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        while self.admitted.front().is_some_and(|t| *t <= cutoff) {
            self.admitted.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 6, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_cap_applies_within_window() {
        let mut limiter = RateLimiter::hourly(2);
        assert!(limiter.admit(t0()));
        assert!(limiter.admit(t0() + Duration::minutes(10)));
        assert!(!limiter.admit(t0() + Duration::minutes(20)));
        assert_eq!(limiter.remaining(t0() + Duration::minutes(20)), 0);
    }

    #[test]
    fn test_window_slides_rather_than_buckets() {
        let mut limiter = RateLimiter::hourly(2);
        assert!(limiter.admit(t0()));
        assert!(limiter.admit(t0() + Duration::minutes(50)));

        // 61 minutes after the first admit, only the second one remains in
        // the window, so one slot is free again.
        let later = t0() + Duration::minutes(61);
        assert!(limiter.admit(later));

        // The two recent admits still block a fourth inside their hour.
        assert!(!limiter.admit(later + Duration::minutes(5)));
    }

    #[test]
    fn test_denied_event_does_not_consume_window() {
        let mut limiter = RateLimiter::hourly(1);
        assert!(limiter.admit(t0()));
        assert!(!limiter.admit(t0() + Duration::minutes(1)));
        // The denial above must not push the free slot further out.
        assert!(limiter.admit(t0() + Duration::minutes(61)));
    }

    #[test]
    fn test_set_max_keeps_spent_window() {
        let mut limiter = RateLimiter::hourly(1);
        assert!(limiter.admit(t0()));
        limiter.set_max(2);
        assert!(limiter.admit(t0() + Duration::minutes(1)));
        assert!(!limiter.admit(t0() + Duration::minutes(2)));
    }
}
