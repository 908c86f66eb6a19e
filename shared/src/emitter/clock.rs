//! The one-second signal clock.
//!
//! Produces a lazy, infinite, non-restartable sequence of ticks. The first
//! tick is available immediately; later ticks arrive approximately one
//! period apart with no compensation for drift (a late tick delays all
//! subsequent ticks rather than bunching them up).

use crate::models::Tick;
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Tick source driving all emission.
///
/// # Example
///
/// ```
/// use shared::emitter::SignalClock;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let mut clock = SignalClock::new(Duration::from_millis(10));
/// let first = clock.tick().await;
/// let second = clock.tick().await;
///
/// assert_eq!(first.seq, 0);
/// assert_eq!(second.seq, 1);
/// # });
/// ```
#[derive(Debug)]
pub struct SignalClock {
    interval: Interval,
    seq: u64,
}

impl SignalClock {
    /// Creates a clock with the given period between ticks.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval, seq: 0 }
    }

    /// Creates the standard one-tick-per-second clock.
    #[must_use]
    pub fn per_second() -> Self {
        Self::new(Duration::from_secs(1))
    }

    /// Waits for the next beat and returns its tick.
    ///
    /// The sequence number increases by exactly 1 per call and never
    /// restarts.
    pub async fn tick(&mut self) -> Tick {
        self.interval.tick().await;
        let tick = Tick::now(self.seq);
        self.seq += 1;
        tick
    }
}
