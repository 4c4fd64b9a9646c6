use core::time::Duration;
use std::{
    sync::OnceLock,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{
    error::{Error, Result},
    generator::Generator,
    id::SnowflakeId,
    time::{Granularity, SystemClock},
};

/// Variable holding the node ID, a decimal in `0..=255`. Required.
pub const NODE_ID_VAR: &str = "NODE_ID";

/// Variable holding the genesis epoch in whole seconds since the Unix epoch.
/// Optional; defaults to the current time.
pub const EPOCH_VAR: &str = "GENESIS_EPOCH_SECONDS";

/// Generator settings read from the process environment.
///
/// Generators built from an [`EnvConfig`] count whole seconds from the
/// configured epoch, so IDs stay sortable across restarts as long as every
/// process shares the same `GENESIS_EPOCH_SECONDS`.
///
/// ```
/// use nodeflake::{EnvConfig, Granularity};
///
/// let config = EnvConfig::from_lookup(|var| match var {
///     "NODE_ID" => Some("23".to_owned()),
///     "GENESIS_EPOCH_SECONDS" => Some("1735689600".to_owned()),
///     _ => None,
/// })
/// .unwrap();
///
/// assert_eq!(config.node_id(), 23);
/// assert_eq!(config.epoch().as_secs(), 1_735_689_600);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvConfig {
    node_id: u8,
    epoch: Duration,
}

impl EnvConfig {
    /// Tick length of generators configured from the environment.
    pub const GRANULARITY: Granularity = Granularity::Seconds;

    /// Reads [`NODE_ID_VAR`] and [`EPOCH_VAR`] from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Self::from_lookup`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the settings through `lookup` instead of the process
    /// environment.
    ///
    /// # Errors
    ///
    /// - [`Error::EnvironmentConfig`] if the node ID is missing or not a
    ///   `u8`, or if the epoch is not a whole number of seconds or lies in the
    ///   future
    /// - [`Error::ClockUnavailable`] if the system clock reads before 1970
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = lookup(NODE_ID_VAR).ok_or_else(|| Error::EnvironmentConfig {
            var: NODE_ID_VAR,
            reason: "not set".into(),
        })?;
        let node_id = raw.trim().parse::<u8>().map_err(|e| Error::EnvironmentConfig {
            var: NODE_ID_VAR,
            reason: format!("`{raw}` is not a node ID in 0..=255: {e}"),
        })?;

        let epoch = lookup(EPOCH_VAR)
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|e| Error::EnvironmentConfig {
                    var: EPOCH_VAR,
                    reason: format!("`{raw}` is not a number of seconds: {e}"),
                })
            })
            .transpose()?;
        let epoch = Self::resolve_epoch(epoch)?;

        Ok(Self { node_id, epoch })
    }

    /// Turns an optional genesis epoch in seconds into the epoch a generator
    /// counts from: `secs` itself, or the current time truncated to whole
    /// seconds when absent.
    ///
    /// # Errors
    ///
    /// - [`Error::EnvironmentConfig`] if `secs` lies in the future
    /// - [`Error::ClockUnavailable`] if the system clock reads before 1970
    pub fn resolve_epoch(secs: Option<u64>) -> Result<Duration> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| Error::ClockUnavailable {
                reason: e.to_string(),
            })?;
        let now = Duration::from_secs(now.as_secs());

        match secs.map(Duration::from_secs) {
            Some(epoch) if epoch > now => Err(Error::EnvironmentConfig {
                var: EPOCH_VAR,
                reason: format!(
                    "epoch {} is in the future (now {})",
                    epoch.as_secs(),
                    now.as_secs()
                ),
            }),
            Some(epoch) => Ok(epoch),
            None => Ok(now),
        }
    }

    /// The node ID read from [`NODE_ID_VAR`].
    pub const fn node_id(&self) -> u8 {
        self.node_id
    }

    /// Offset from the Unix epoch, truncated to whole seconds.
    pub const fn epoch(&self) -> Duration {
        self.epoch
    }

    /// A [`Self::GRANULARITY`] clock counting from [`Self::epoch`].
    pub const fn clock(&self) -> SystemClock {
        SystemClock::with_epoch(self.epoch).with_granularity(Self::GRANULARITY)
    }

    /// Builds a generator with the full 16383 iterations per second.
    pub fn build(&self) -> Generator<SystemClock> {
        #[cfg(feature = "tracing")]
        tracing::info!(
            node_id = self.node_id,
            epoch_secs = self.epoch.as_secs(),
            max_sequence = SnowflakeId::MAX_ITERATION,
            "configured generator from environment"
        );
        Generator::new(self.node_id, self.clock())
    }
}

impl Generator<SystemClock> {
    /// Builds a generator from [`NODE_ID_VAR`] and [`EPOCH_VAR`].
    ///
    /// # Errors
    ///
    /// See [`EnvConfig::from_lookup`].
    pub fn from_env() -> Result<Self> {
        Ok(EnvConfig::from_env()?.build())
    }
}

static DEFAULT: OnceLock<Generator> = OnceLock::new();

/// The process-wide generator, built from the environment on first use.
///
/// The environment is read once. A failed attempt is not cached, so a later
/// call retries; once a generator has been built every caller shares it.
///
/// # Errors
///
/// See [`EnvConfig::from_lookup`].
pub fn default_generator() -> Result<&'static Generator> {
    if let Some(generator) = DEFAULT.get() {
        return Ok(generator);
    }
    let generator = Generator::from_env()?;
    // A racing thread may have won; its generator is kept and ours dropped.
    Ok(DEFAULT.get_or_init(|| generator))
}

/// Generates an ID from the [`default_generator`].
///
/// # Errors
///
/// Construction errors on first use, then anything
/// [`Generator::next_id`] returns.
pub fn next_id() -> Result<SnowflakeId> {
    default_generator()?.next_id()
}
