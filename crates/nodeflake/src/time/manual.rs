use std::sync::Arc;

use portable_atomic::{AtomicU64, Ordering};

use crate::{
    error::Result,
    time::{Granularity, TimeSource},
};

/// A deterministic clock that only moves when told to.
///
/// Clones share the same reading, so a test can hand one copy to a generator
/// and keep another to drive time forward (or backward) from outside.
///
/// ```
/// use nodeflake::{ManualClock, TimeSource};
///
/// let clock = ManualClock::new(42);
/// let handle = clock.clone();
///
/// handle.advance(3);
/// assert_eq!(clock.current_ticks().unwrap(), 45);
/// ```
#[derive(Clone, Debug)]
pub struct ManualClock {
    ticks: Arc<AtomicU64>,
    granularity: Granularity,
}

impl ManualClock {
    /// A millisecond clock frozen at `ticks`.
    pub fn new(ticks: u64) -> Self {
        Self {
            ticks: Arc::new(AtomicU64::new(ticks)),
            granularity: Granularity::Milliseconds,
        }
    }

    /// Returns this clock with a different tick length.
    #[must_use]
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Sets the reading to `ticks`.
    pub fn set(&self, ticks: u64) {
        self.ticks.store(ticks, Ordering::Release);
    }

    /// Moves the reading forward by `ticks`.
    pub fn advance(&self, ticks: u64) {
        self.ticks.fetch_add(ticks, Ordering::AcqRel);
    }

    /// The current reading.
    pub fn get(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }
}

impl TimeSource for ManualClock {
    fn current_ticks(&self) -> Result<u64> {
        Ok(self.get())
    }

    fn granularity(&self) -> Granularity {
        self.granularity
    }
}

/// A deterministic clock that advances by one tick on every reading.
///
/// Every ID drawn from a generator on this clock lands in a fresh tick, so it
/// never exhausts and never blocks.
#[derive(Debug)]
pub struct StepClock {
    next: AtomicU64,
}

impl StepClock {
    /// A clock whose first reading is `start`.
    pub const fn new(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl TimeSource for StepClock {
    fn current_ticks(&self) -> Result<u64> {
        Ok(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_shares_reading_across_clones() {
        let clock = ManualClock::new(10);
        let handle = clock.clone();
        handle.set(6);
        assert_eq!(clock.current_ticks().unwrap(), 6);
        handle.advance(4);
        assert_eq!(clock.get(), 10);
    }

    #[test]
    fn step_clock_counts_up() {
        let clock = StepClock::new(7);
        let readings: Vec<u64> = (0..3).map(|_| clock.current_ticks().unwrap()).collect();
        assert_eq!(readings, [7, 8, 9]);
    }
}
