use core::time::Duration;

use crate::id::SnowflakeId;

/// Represents the result of a single, non-blocking attempt to generate an ID.
///
/// - [`IdGenStatus::Ready`] indicates a new ID was successfully generated.
/// - [`IdGenStatus::Pending`] means every iteration of the current tick has
///   been handed out and the clock has not advanced yet.
///
/// [`Generator::next_id`] loops over this for you; match on it directly when
/// you want to control the back-off yourself.
///
/// ```
/// use nodeflake::{Generator, IdGenStatus, ManualClock};
///
/// let generator = Generator::builder()
///     .clock(ManualClock::new(1))
///     .max_sequence(1)
///     .build()
///     .unwrap();
///
/// assert!(matches!(generator.try_next_id(), Ok(IdGenStatus::Ready { .. })));
/// match generator.try_next_id().unwrap() {
///     IdGenStatus::Ready { id } => println!("ID: {id}"),
///     IdGenStatus::Pending { yield_for } => println!("Back off for {yield_for:?}"),
/// }
/// ```
///
/// [`Generator::next_id`]: crate::Generator::next_id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated ID.
        id: SnowflakeId,
    },
    /// The current tick is exhausted.
    Pending {
        /// The generator's configured back-off, a reasonable time to wait
        /// before retrying.
        yield_for: Duration,
    },
}

/// Outcome of one pass of [`SequenceCounter::try_next`].
///
/// [`SequenceCounter::try_next`]: crate::SequenceCounter::try_next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStatus {
    /// The pair was reserved and will never be handed out again.
    Ready { timestamp: u64, iteration: u16 },
    /// `timestamp` has no iterations left.
    Pending { timestamp: u64 },
}
