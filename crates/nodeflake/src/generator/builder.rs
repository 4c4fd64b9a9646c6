use core::{fmt, time::Duration};

use crate::{
    error::Result,
    generator::{DEFAULT_BACKOFF, Generator, SequenceCounter},
    id::SnowflakeId,
    node::{FixedNode, NodeIdentity},
    time::{SystemClock, TimeSource},
};

/// Configures and validates a [`Generator`].
///
/// Defaults:
/// - clock: [`SystemClock`] counting milliseconds from the Unix epoch
/// - node identity: [`FixedNode`] with ID 1
/// - max sequence: 16383, the full capacity of the iteration field
/// - back-off: [`DEFAULT_BACKOFF`]
///
/// All validation happens in [`Self::build`], so a misconfiguration is
/// reported before any ID is produced.
///
/// ```
/// use std::time::Duration;
/// use nodeflake::{CUSTOM_EPOCH, Error, Generator, SystemClock};
///
/// let generator = Generator::builder()
///     .clock(SystemClock::with_epoch(CUSTOM_EPOCH))
///     .node_id(42)
///     .max_sequence(4096)
///     .backoff(Duration::from_micros(250))
///     .build()
///     .unwrap();
/// assert_eq!(generator.max_sequence(), 4096);
///
/// let err = Generator::builder().max_sequence(16384).build().unwrap_err();
/// assert!(matches!(err, Error::SequenceRange { requested: 16384, .. }));
/// ```
pub struct GeneratorBuilder<T = SystemClock> {
    clock: T,
    node: Box<dyn NodeIdentity>,
    max_sequence: u16,
    backoff: Duration,
}

impl Default for GeneratorBuilder<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl GeneratorBuilder<SystemClock> {
    /// A builder with the defaults: [`SystemClock::new`], node 1, the full
    /// iteration range and [`DEFAULT_BACKOFF`].
    pub fn new() -> Self {
        Self {
            clock: SystemClock::new(),
            node: Box::new(FixedNode::default()),
            max_sequence: SnowflakeId::MAX_ITERATION,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl<T> GeneratorBuilder<T> {
    /// Replaces the clock.
    pub fn clock<C>(self, clock: C) -> GeneratorBuilder<C>
    where
        C: TimeSource,
    {
        GeneratorBuilder {
            clock,
            node: self.node,
            max_sequence: self.max_sequence,
            backoff: self.backoff,
        }
    }

    /// Uses a fixed node ID.
    #[must_use]
    pub fn node_id(self, node_id: u8) -> Self {
        self.node_identity(FixedNode(node_id))
    }

    /// Uses a pluggable node identity, resolved once by [`Self::build`].
    #[must_use]
    pub fn node_identity<N>(mut self, node: N) -> Self
    where
        N: NodeIdentity + 'static,
    {
        self.node = Box::new(node);
        self
    }

    /// Caps the iterations issued per tick. Must be in `1..=16383`.
    #[must_use]
    pub fn max_sequence(mut self, max_sequence: u16) -> Self {
        self.max_sequence = max_sequence;
        self
    }

    /// Sets how long a caller sleeps before retrying an exhausted tick.
    #[must_use]
    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }
}

impl<T> GeneratorBuilder<T>
where
    T: TimeSource,
{
    /// Validates the configuration, resolves the node identity and builds
    /// the generator.
    ///
    /// # Errors
    ///
    /// - [`Error::SequenceRange`] if the max sequence is outside `1..=16383`
    /// - [`Error::NodeIdentity`] if the node identity cannot be resolved
    ///
    /// [`Error::SequenceRange`]: crate::Error::SequenceRange
    /// [`Error::NodeIdentity`]: crate::Error::NodeIdentity
    pub fn build(self) -> Result<Generator<T>> {
        let counter = SequenceCounter::new(self.clock, self.max_sequence)?.with_backoff(self.backoff);
        let node_id = self.node.resolve()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            node_id,
            max_sequence = self.max_sequence,
            backoff_us = self.backoff.as_micros() as u64,
            granularity = ?counter.clock().granularity(),
            "built generator"
        );

        Ok(Generator::from_counter(node_id, counter))
    }
}

impl<T> fmt::Debug for GeneratorBuilder<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorBuilder")
            .field("clock", &self.clock)
            .field("max_sequence", &self.max_sequence)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}
