/// A result type defaulting to the crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `nodeflake` can emit.
///
/// Construction failures ([`Error::is_construction`]) are reported by the
/// builder or the environment constructor before any ID is produced. Runtime
/// failures come from [`Generator::next_id`]; of these,
/// [`Error::ClockRegression`] is the one operators usually want to alert on.
///
/// Sequence exhaustion is never an error: the generator absorbs it by waiting
/// for the clock to advance.
///
/// [`Generator::next_id`]: crate::Generator::next_id
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The requested max sequence does not fit the 14-bit iteration field.
    #[error("max sequence {requested} is out of range (must be 1..={max})")]
    SequenceRange {
        /// The rejected value.
        requested: u16,
        /// The largest accepted value.
        max: u16,
    },

    /// The node identity could not be resolved.
    #[error("failed to resolve node identity: {reason}")]
    NodeIdentity {
        /// Why resolution failed.
        reason: String,
    },

    /// An environment variable required for construction is missing or
    /// malformed.
    #[error("invalid environment variable `{var}`: {reason}")]
    EnvironmentConfig {
        /// The offending variable.
        var: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// The clock reported a tick lower than one already used by the
    /// generator. The counter state is left untouched, so a later call can
    /// succeed once the clock catches up.
    #[error("clock moved backwards: now {now}, last issued tick {last}")]
    ClockRegression {
        /// The tick just read.
        now: u64,
        /// The tick of the last issued ID.
        last: u64,
    },

    /// The clock reported a tick that does not fit the 42-bit timestamp
    /// field.
    #[error("tick {tick} exceeds the timestamp field (max {max})")]
    TimestampOverflow {
        /// The tick just read.
        tick: u64,
        /// The largest representable timestamp.
        max: u64,
    },

    /// The time source could not produce a reading.
    #[error("clock unavailable: {reason}")]
    ClockUnavailable {
        /// Why the reading failed.
        reason: String,
    },

    /// A string could not be parsed as a decimal ID.
    #[error("invalid ID `{input}`: {reason}")]
    InvalidId {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The counter lock was poisoned by a panicking thread. Not available
    /// with the `parking-lot` feature, whose mutexes do not poison.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("sequence counter lock poisoned")]
    LockPoisoned,
}

impl Error {
    /// Returns `true` for errors that can only occur while building a
    /// generator.
    pub const fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::SequenceRange { .. } | Self::NodeIdentity { .. } | Self::EnvironmentConfig { .. }
        )
    }

    /// Returns `true` if the clock was observed moving backwards.
    pub const fn is_clock_regression(&self) -> bool {
        matches!(self, Self::ClockRegression { .. })
    }
}

#[cfg(not(feature = "parking-lot"))]
use std::sync::{MutexGuard, PoisonError};

// Convert all poisoned lock errors to a simplified `LockPoisoned`
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
