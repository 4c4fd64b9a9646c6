use core::time::Duration;
use std::time::{Instant, SystemTime};

use crate::{
    error::{Error, Result},
    time::{Granularity, TimeSource, UNIX_EPOCH},
};

/// A monotonic time source that returns elapsed time since construction,
/// offset from a user-defined epoch.
///
/// The wall clock is read exactly once, when the clock is built, to anchor it
/// to the epoch. Every later reading adds the [`Instant`] elapsed since then,
/// so the clock never goes backward even if the system time is adjusted
/// externally. The trade-off is drift: a long-running process slowly
/// diverges from wall time as the anchor ages.
///
/// Clones share the same anchor.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    start: Instant,
    anchor: Duration,
    granularity: Granularity,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// A millisecond clock anchored to the Unix epoch.
    ///
    /// Same as [`MonotonicClock::try_with_epoch`] with [`UNIX_EPOCH`], except
    /// that a system time before 1970 anchors the clock at tick 0 instead of
    /// failing. Ticks still advance with the elapsed [`Instant`].
    pub fn new() -> Self {
        Self::try_with_epoch(UNIX_EPOCH).unwrap_or_else(|_e| {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_e, "system time unavailable, anchoring clock at tick 0");
            Self {
                start: Instant::now(),
                anchor: Duration::ZERO,
                granularity: Granularity::Milliseconds,
            }
        })
    }

    /// A millisecond clock using `epoch` as its origin (t = 0), specified as
    /// a [`Duration`] since 1970-01-01 UTC.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockUnavailable`] if the current system time is
    /// earlier than `epoch`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::{Duration, SystemTime, UNIX_EPOCH};
    /// use nodeflake::{MonotonicClock, TimeSource};
    ///
    /// let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
    /// let clock = MonotonicClock::try_with_epoch(now).unwrap();
    ///
    /// std::thread::sleep(Duration::from_millis(5));
    /// assert!(clock.current_ticks().unwrap() >= 5);
    /// ```
    pub fn try_with_epoch(epoch: Duration) -> Result<Self> {
        let start = Instant::now();
        let system_now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|e| Error::ClockUnavailable {
                reason: format!("system time is before the Unix epoch: {e}"),
            })?;
        let anchor = system_now
            .checked_sub(epoch)
            .ok_or_else(|| Error::ClockUnavailable {
                reason: format!(
                    "system time {}ms is before the configured epoch {}ms",
                    system_now.as_millis(),
                    epoch.as_millis()
                ),
            })?;

        Ok(Self {
            start,
            anchor,
            granularity: Granularity::Milliseconds,
        })
    }

    /// Returns this clock with a different tick length.
    #[must_use]
    pub const fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }
}

impl TimeSource for MonotonicClock {
    fn current_ticks(&self) -> Result<u64> {
        Ok(self
            .granularity
            .from_duration(self.anchor + self.start.elapsed()))
    }

    fn granularity(&self) -> Granularity {
        self.granularity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_goes_backward() {
        let clock = MonotonicClock::new();
        let mut last = clock.current_ticks().unwrap();
        for _ in 0..10_000 {
            let now = clock.current_ticks().unwrap();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn new_is_anchored_to_the_unix_epoch() {
        let explicit = MonotonicClock::try_with_epoch(UNIX_EPOCH).unwrap();
        let default = MonotonicClock::new();
        let a = explicit.current_ticks().unwrap();
        let b = default.current_ticks().unwrap();
        assert!(a.abs_diff(b) <= 50, "{a} vs {b}");
        assert_eq!(default.granularity(), Granularity::Milliseconds);
    }

    #[test]
    fn rejects_future_epoch() {
        let future = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            + Duration::from_secs(60);
        assert!(matches!(
            MonotonicClock::try_with_epoch(future),
            Err(Error::ClockUnavailable { .. })
        ));
    }
}
