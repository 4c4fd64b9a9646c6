use core::{cmp::Ordering, time::Duration};

#[cfg(feature = "parking-lot")]
use parking_lot::{Mutex, MutexGuard};
#[cfg(not(feature = "parking-lot"))]
use std::sync::{Mutex, MutexGuard};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::{Error, Result},
    generator::SequenceStatus,
    id::SnowflakeId,
    time::TimeSource,
};

/// How long [`SequenceCounter::next`] sleeps when a tick is exhausted, unless
/// configured otherwise.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, Default)]
struct CounterState {
    timestamp: u64,
    iteration: u16,
}

/// Hands out `(timestamp, iteration)` pairs, each strictly greater than every
/// pair it handed out before.
///
/// The pair lives behind a single mutex. The clock is read while the lock is
/// held, so the reading and the state update are atomic with respect to other
/// callers, and the order in which callers acquire the lock is the numeric
/// order of the pairs they get back.
///
/// At most `max_sequence` iterations are issued per tick, numbered from 1.
/// Once a tick is exhausted, [`Self::next`] releases the lock, sleeps for the
/// configured back-off and tries again, until the clock moves on. A clock
/// that never advances therefore blocks callers forever; wrap calls in your
/// own timeout if you need bounded latency.
///
/// A reading lower than the last issued tick is reported as
/// [`Error::ClockRegression`] and leaves the state untouched.
#[derive(Debug)]
pub struct SequenceCounter<T> {
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<Mutex<CounterState>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Mutex<CounterState>,
    clock: T,
    max_sequence: u16,
    backoff: Duration,
}

impl<T> SequenceCounter<T>
where
    T: TimeSource,
{
    /// Creates a counter starting at tick zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SequenceRange`] unless `1 <= max_sequence <= 16383`.
    pub fn new(clock: T, max_sequence: u16) -> Result<Self> {
        if max_sequence == 0 || max_sequence > SnowflakeId::MAX_ITERATION {
            return Err(Error::SequenceRange {
                requested: max_sequence,
                max: SnowflakeId::MAX_ITERATION,
            });
        }
        Ok(Self::from_parts(clock, max_sequence, DEFAULT_BACKOFF))
    }

    pub(crate) fn from_parts(clock: T, max_sequence: u16, backoff: Duration) -> Self {
        debug_assert!(max_sequence > 0 && max_sequence <= SnowflakeId::MAX_ITERATION);
        Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(Mutex::new(CounterState::default())),
            #[cfg(not(feature = "cache-padded"))]
            state: Mutex::new(CounterState::default()),
            clock,
            max_sequence,
            backoff,
        }
    }

    /// Sets how long to sleep between retries on an exhausted tick.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// The clock this counter reads.
    pub const fn clock(&self) -> &T {
        &self.clock
    }

    /// The largest iteration issued within one tick.
    pub const fn max_sequence(&self) -> u16 {
        self.max_sequence
    }

    /// How long [`SequenceCounter::next`] sleeps after exhausting a tick.
    pub const fn backoff(&self) -> Duration {
        self.backoff
    }

    /// The most recently issued pair, or `(0, 0)` before the first one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockPoisoned`] if the lock is poisoned (std mutex
    /// only).
    pub fn last_issued(&self) -> Result<(u64, u16)> {
        let state = self.lock()?;
        Ok((state.timestamp, state.iteration))
    }

    /// Reserves the next pair, blocking while the current tick is exhausted.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] if the clock is behind the last issued
    ///   tick
    /// - [`Error::TimestampOverflow`] if the tick does not fit 42 bits
    /// - any error reported by the clock
    /// - [`Error::LockPoisoned`] if the lock is poisoned (std mutex only)
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next(&self) -> Result<(u64, u16)> {
        loop {
            match self.try_next()? {
                SequenceStatus::Ready {
                    timestamp,
                    iteration,
                } => return Ok((timestamp, iteration)),
                SequenceStatus::Pending { timestamp: _ts } => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(
                        timestamp = _ts,
                        max_sequence = self.max_sequence,
                        backoff_us = self.backoff.as_micros() as u64,
                        "tick exhausted, backing off"
                    );
                    std::thread::sleep(self.backoff);
                }
            }
        }
    }

    /// Attempts to reserve the next pair without waiting.
    ///
    /// Returns [`SequenceStatus::Pending`] instead of sleeping when the
    /// current tick is exhausted.
    ///
    /// # Errors
    ///
    /// Same as [`Self::next`].
    pub fn try_next(&self) -> Result<SequenceStatus> {
        let mut state = self.lock()?;
        let now = self.clock.current_ticks()?;

        if now > SnowflakeId::MAX_TIMESTAMP {
            return Err(Self::cold_timestamp_overflow(now));
        }

        match now.cmp(&state.timestamp) {
            Ordering::Less => return Err(Self::cold_clock_behind(now, state.timestamp)),
            Ordering::Greater => {
                state.timestamp = now;
                state.iteration = 0;
            }
            Ordering::Equal => {}
        }

        if state.iteration >= self.max_sequence {
            return Ok(SequenceStatus::Pending {
                timestamp: state.timestamp,
            });
        }

        state.iteration += 1;
        Ok(SequenceStatus::Ready {
            timestamp: state.timestamp,
            iteration: state.iteration,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, CounterState>> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.state.lock())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            Ok(self.state.lock()?)
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, last: u64) -> Error {
        #[cfg(feature = "tracing")]
        tracing::warn!(now, last, behind = last - now, "clock moved backwards");
        Error::ClockRegression { now, last }
    }

    #[cold]
    #[inline(never)]
    fn cold_timestamp_overflow(tick: u64) -> Error {
        #[cfg(feature = "tracing")]
        tracing::error!(tick, max = SnowflakeId::MAX_TIMESTAMP, "tick exceeds timestamp field");
        Error::TimestampOverflow {
            tick,
            max: SnowflakeId::MAX_TIMESTAMP,
        }
    }
}
