//! Tick data model.
//!
//! A tick is one beat of the signal clock: a sequence number plus the
//! wall-clock instant at which the beat fired. Each tick drives exactly one
//! emission cycle and is never reused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One beat of the signal clock.
///
/// # Example
///
/// ```
/// use shared::models::Tick;
///
/// let tick = Tick::now(0);
/// assert_eq!(tick.seq, 0);
/// assert!(tick.unix_nanos() > 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    /// Monotonically increasing sequence number, starting at 0.
    pub seq: u64,

    /// Wall-clock instant at which this tick fired.
    pub timestamp: DateTime<Utc>,
}

impl Tick {
    /// Creates a tick with the given sequence number and timestamp.
    #[must_use]
    pub fn new(seq: u64, timestamp: DateTime<Utc>) -> Self {
        Self { seq, timestamp }
    }

    /// Creates a tick with the given sequence number, stamped with the
    /// current wall-clock time.
    #[must_use]
    pub fn now(seq: u64) -> Self {
        Self::new(seq, Utc::now())
    }

    /// Returns the tick's timestamp as nanoseconds since the Unix epoch.
    ///
    /// Saturates at `i64::MAX` for dates past the year 2262.
    #[must_use]
    pub fn unix_nanos(&self) -> i64 {
        self.timestamp.timestamp_nanos_opt().unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_tick_now() {
        let tick = Tick::now(7);
        assert_eq!(tick.seq, 7);
        assert!(tick.timestamp <= Utc::now());
    }

    #[test]
    fn test_tick_unix_nanos() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let tick = Tick::new(3, timestamp);

        assert_eq!(tick.unix_nanos(), timestamp.timestamp_nanos_opt().unwrap());
    }

    #[test]
    fn test_tick_sequence_ordering() {
        let first = Tick::now(0);
        let second = Tick::now(1);

        assert!(second.seq > first.seq);
        assert!(second.timestamp >= first.timestamp);
    }

    #[test]
    fn test_tick_serialization() {
        let tick = Tick::now(42);
        let json = serde_json::to_string(&tick).unwrap();
        let deserialized: Tick = serde_json::from_str(&json).unwrap();

        assert_eq!(tick, deserialized);
    }
}
