use core::time::Duration;

use crate::error::Result;

/// Unix epoch: Thursday, January 1, 1970 00:00:00 UTC
pub const UNIX_EPOCH: Duration = Duration::from_millis(0);

/// Custom epoch: Wednesday, January 1, 2025 00:00:00 UTC
pub const CUSTOM_EPOCH: Duration = Duration::from_millis(1_735_689_600_000);

/// The length of one clock tick.
///
/// Granularity is a deployment choice: millisecond ticks give finer ordering,
/// second ticks stretch the 42-bit timestamp field much further into the
/// future at the cost of `max_sequence` IDs per second.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// One tick per millisecond.
    #[default]
    Milliseconds,
    /// One tick per second.
    Seconds,
}

impl Granularity {
    /// Number of ticks in one second.
    pub const fn ticks_per_second(self) -> u64 {
        match self {
            Self::Milliseconds => 1_000,
            Self::Seconds => 1,
        }
    }

    /// Converts a tick count into a [`Duration`].
    pub const fn to_duration(self, ticks: u64) -> Duration {
        match self {
            Self::Milliseconds => Duration::from_millis(ticks),
            Self::Seconds => Duration::from_secs(ticks),
        }
    }

    /// Converts a [`Duration`] into whole ticks, rounding down.
    ///
    /// Saturates at `u64::MAX`, which no valid timestamp can reach.
    pub fn from_duration(self, dur: Duration) -> u64 {
        match self {
            Self::Milliseconds => u64::try_from(dur.as_millis()).unwrap_or(u64::MAX),
            Self::Seconds => dur.as_secs(),
        }
    }
}

/// A source of ticks elapsed since some epoch.
///
/// This abstraction allows you to plug in a real system clock, a monotonic
/// timer, or a deterministic clock in tests. The generator calls it once per
/// attempt while holding its lock, so implementations must be cheap and must
/// not block.
///
/// # Example
///
/// ```
/// use nodeflake::{Result, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_ticks(&self) -> Result<u64> {
///         Ok(1234)
///     }
/// }
///
/// assert_eq!(FixedTime.current_ticks().unwrap(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the number of ticks elapsed since the configured epoch.
    ///
    /// # Errors
    ///
    /// Implementations backed by hardware or the OS may fail to produce a
    /// reading; they should return [`Error::ClockUnavailable`].
    ///
    /// [`Error::ClockUnavailable`]: crate::Error::ClockUnavailable
    fn current_ticks(&self) -> Result<u64>;

    /// The length of one tick. Defaults to milliseconds.
    fn granularity(&self) -> Granularity {
        Granularity::Milliseconds
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_ticks(&self) -> Result<u64> {
        (**self).current_ticks()
    }

    fn granularity(&self) -> Granularity {
        (**self).granularity()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn current_ticks(&self) -> Result<u64> {
        (**self).current_ticks()
    }

    fn granularity(&self) -> Granularity {
        (**self).granularity()
    }
}
