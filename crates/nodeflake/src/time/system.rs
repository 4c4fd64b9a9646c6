use core::time::Duration;
use std::time::SystemTime;

use crate::{
    error::{Error, Result},
    time::{Granularity, TimeSource, UNIX_EPOCH},
};

/// A wall-clock time source reading [`SystemTime`] on every call.
///
/// Ticks are counted from a configurable epoch (the Unix epoch by default).
/// Rebasing the epoch closer to the present leaves more of the 42-bit
/// timestamp field for the future.
///
/// The wall clock may be adjusted by NTP or an operator. When that moves it
/// backwards the generator reports [`Error::ClockRegression`] instead of
/// issuing IDs that could collide. Use [`MonotonicClock`] if you would rather
/// never observe a regression.
///
/// [`MonotonicClock`]: crate::MonotonicClock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemClock {
    epoch: Duration,
    granularity: Granularity,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    /// A millisecond clock counting from the Unix epoch.
    pub const fn new() -> Self {
        Self::with_epoch(UNIX_EPOCH)
    }

    /// A millisecond clock counting from `epoch`, given as a [`Duration`]
    /// since 1970-01-01 UTC.
    pub const fn with_epoch(epoch: Duration) -> Self {
        Self {
            epoch,
            granularity: Granularity::Milliseconds,
        }
    }

    /// Returns this clock with a different tick length.
    #[must_use]
    pub const fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// The configured epoch.
    pub const fn epoch(&self) -> Duration {
        self.epoch
    }
}

impl TimeSource for SystemClock {
    fn current_ticks(&self) -> Result<u64> {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_err(|e| Error::ClockUnavailable {
                reason: format!("system time is before the Unix epoch: {e}"),
            })?;
        let elapsed = now
            .checked_sub(self.epoch)
            .ok_or_else(|| Error::ClockUnavailable {
                reason: format!(
                    "system time {}ms is before the configured epoch {}ms",
                    now.as_millis(),
                    self.epoch.as_millis()
                ),
            })?;
        Ok(self.granularity.from_duration(elapsed))
    }

    fn granularity(&self) -> Granularity {
        self.granularity
    }
}
