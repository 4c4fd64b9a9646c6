use core::time::Duration;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::Result,
    generator::{DEFAULT_BACKOFF, GeneratorBuilder, IdGenStatus, SequenceCounter, SequenceStatus},
    id::SnowflakeId,
    time::{Granularity, SystemClock, TimeSource},
};

/// A thread-safe Snowflake ID generator.
///
/// Combines a [`SequenceCounter`] with the node ID resolved when the
/// generator was built. The counter sits behind an [`Arc`], so clones are
/// cheap and share one sequence: hand a clone to every thread that needs IDs.
///
/// ## Guarantees
/// - IDs from one generator (and its clones) are strictly increasing, in the
///   order callers acquire the counter lock.
/// - IDs from generators with different node IDs never collide.
///
/// ## Not guaranteed
/// - Ordering across generators on different nodes.
/// - Anything across restarts: the counter is not persisted, so restarting
///   with a clock set back in time can reissue IDs.
pub struct Generator<T = SystemClock> {
    counter: Arc<SequenceCounter<T>>,
    node_id: u8,
}

impl<T> Clone for Generator<T> {
    fn clone(&self) -> Self {
        Self {
            counter: Arc::clone(&self.counter),
            node_id: self.node_id,
        }
    }
}

impl<T> core::fmt::Debug for Generator<T>
where
    T: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Generator")
            .field("node_id", &self.node_id)
            .field("counter", &self.counter)
            .finish()
    }
}

impl Generator<SystemClock> {
    /// Starts building a generator. See [`GeneratorBuilder`] for the
    /// defaults.
    pub fn builder() -> GeneratorBuilder<SystemClock> {
        GeneratorBuilder::new()
    }
}

impl<T> Generator<T>
where
    T: TimeSource,
{
    /// Creates a generator with the full 16383 iterations per tick and the
    /// default back-off.
    ///
    /// # Parameters
    ///
    /// - `node_id`: A unique identifier for the node or instance generating
    ///   IDs. This value will be encoded into every generated ID.
    /// - `clock`: A [`TimeSource`] implementation (e.g., [`SystemClock`])
    ///   that determines how timestamps are generated.
    ///
    /// # Example
    /// ```
    /// use nodeflake::{Generator, MonotonicClock};
    ///
    /// let generator = Generator::new(3, MonotonicClock::default());
    /// let a = generator.next_id().unwrap();
    /// let b = generator.next_id().unwrap();
    /// assert!(a < b);
    /// assert_eq!(b.node_id(), 3);
    /// ```
    pub fn new(node_id: u8, clock: T) -> Self {
        let counter =
            SequenceCounter::from_parts(clock, SnowflakeId::MAX_ITERATION, DEFAULT_BACKOFF);
        Self::from_counter(node_id, counter)
    }

    /// Creates a generator around an existing counter.
    pub fn from_counter(node_id: u8, counter: SequenceCounter<T>) -> Self {
        Self {
            counter: Arc::new(counter),
            node_id,
        }
    }

    /// Generates the next ID, blocking while the current tick is exhausted.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] if the clock went backwards. The
    ///   generator stays usable; retrying once the clock has caught up is the
    ///   caller's decision.
    /// - [`Error::TimestampOverflow`] once the clock outgrows 42 bits.
    /// - Any error reported by the clock.
    /// - `Error::LockPoisoned` if another thread panicked inside the counter
    ///   (std mutex only).
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    /// [`Error::TimestampOverflow`]: crate::Error::TimestampOverflow
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), fields(node_id = self.node_id)))]
    pub fn next_id(&self) -> Result<SnowflakeId> {
        let (timestamp, iteration) = self.counter.next()?;
        Ok(SnowflakeId::from_components(timestamp, self.node_id, iteration))
    }

    /// Attempts to generate the next ID without blocking.
    ///
    /// Returns [`IdGenStatus::Pending`] if the current tick is exhausted.
    ///
    /// # Errors
    ///
    /// Same as [`Self::next_id`].
    pub fn try_next_id(&self) -> Result<IdGenStatus> {
        Ok(match self.counter.try_next()? {
            SequenceStatus::Ready {
                timestamp,
                iteration,
            } => IdGenStatus::Ready {
                id: SnowflakeId::from_components(timestamp, self.node_id, iteration),
            },
            SequenceStatus::Pending { .. } => IdGenStatus::Pending {
                yield_for: self.counter.backoff(),
            },
        })
    }

    /// The node ID stamped into every ID.
    pub const fn node_id(&self) -> u8 {
        self.node_id
    }

    /// Maximum iterations issued per tick.
    pub fn max_sequence(&self) -> u16 {
        self.counter.max_sequence()
    }

    /// Sleep between retries on an exhausted tick.
    pub fn backoff(&self) -> Duration {
        self.counter.backoff()
    }

    /// Tick length of the underlying clock, needed to turn an ID's
    /// timestamp back into calendar units.
    pub fn granularity(&self) -> Granularity {
        self.counter.clock().granularity()
    }

    /// The generator's time source.
    pub fn clock(&self) -> &T {
        self.counter.clock()
    }

    /// The shared counter, e.g. to inspect [`SequenceCounter::last_issued`].
    pub fn counter(&self) -> &SequenceCounter<T> {
        &self.counter
    }
}
