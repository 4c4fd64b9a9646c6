use std::time::Duration;

use anyhow::bail;
use clap::{Args, Parser, Subcommand, ValueEnum};
use nodeflake::{EnvConfig, Generator, Granularity, SnowflakeId, SystemClock};

/// Command-line arguments for the `nodeflake` binary.
///
/// Generator settings fall back to environment variables (and a `.env` file
/// in the working directory). Without flags the clock matches
/// [`EnvConfig::clock`]: second ticks from `GENESIS_EPOCH_SECONDS`, or from
/// the current second when it is unset.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "nodeflake",
    version,
    about = "Generate and decode 64-bit Snowflake-style IDs"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate IDs, one per line.
    Generate(GenerateArgs),
    /// Split IDs into their fields.
    Decode(DecodeArgs),
}

/// Tick length of the generator clock.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    #[value(name = "ms")]
    Milliseconds,
    #[value(name = "s")]
    Seconds,
}

impl From<Unit> for Granularity {
    fn from(unit: Unit) -> Self {
        match unit {
            Unit::Milliseconds => Self::Milliseconds,
            Unit::Seconds => Self::Seconds,
        }
    }
}

/// Settings shared by both subcommands: they decide how a timestamp maps
/// back to wall-clock time.
#[derive(Args, Debug, Clone)]
pub struct ClockArgs {
    /// Genesis epoch in whole seconds since the Unix epoch. Defaults to the
    /// current second.
    ///
    /// Environment variable: `GENESIS_EPOCH_SECONDS`
    #[arg(long, env = "GENESIS_EPOCH_SECONDS")]
    pub epoch_seconds: Option<u64>,

    /// Length of one timestamp tick.
    ///
    /// Environment variable: `GRANULARITY`
    #[arg(long, env = "GRANULARITY", value_enum, default_value_t = Unit::Seconds)]
    pub granularity: Unit,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Number of IDs to generate.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: u64,

    /// Node ID stamped into every ID. Must be unique per running generator.
    ///
    /// Environment variable: `NODE_ID`
    #[arg(long, env = "NODE_ID")]
    pub node_id: u8,

    /// Maximum IDs issued per tick, at most 16383.
    ///
    /// Environment variable: `MAX_SEQUENCE`
    #[arg(long, env = "MAX_SEQUENCE", default_value_t = SnowflakeId::MAX_ITERATION)]
    pub max_sequence: u16,

    /// Print IDs zero-padded to 20 digits so they sort as strings.
    #[arg(long, default_value_t = false)]
    pub padded: bool,

    #[command(flatten)]
    pub clock: ClockArgs,
}

#[derive(Args, Debug, Clone)]
pub struct DecodeArgs {
    /// Decimal IDs to decode.
    #[arg(required = true)]
    pub ids: Vec<String>,

    #[command(flatten)]
    pub clock: ClockArgs,
}

/// Validated clock settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockConfig {
    pub epoch: Duration,
    pub granularity: Granularity,
}

impl ClockConfig {
    /// A system clock with these settings.
    pub fn clock(&self) -> SystemClock {
        SystemClock::with_epoch(self.epoch).with_granularity(self.granularity)
    }
}

impl TryFrom<ClockArgs> for ClockConfig {
    type Error = anyhow::Error;

    fn try_from(args: ClockArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            epoch: EnvConfig::resolve_epoch(args.epoch_seconds)?,
            granularity: args.granularity.into(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub count: u64,
    pub node_id: u8,
    pub max_sequence: u16,
    pub padded: bool,
    pub clock: ClockConfig,
}

impl TryFrom<GenerateArgs> for GenerateConfig {
    type Error = anyhow::Error;

    fn try_from(args: GenerateArgs) -> Result<Self, Self::Error> {
        if args.count == 0 {
            bail!("--count must be greater than 0");
        }

        Ok(Self {
            count: args.count,
            node_id: args.node_id,
            max_sequence: args.max_sequence,
            padded: args.padded,
            clock: args.clock.try_into()?,
        })
    }
}

impl GenerateConfig {
    /// Builds the generator; the builder validates the max sequence.
    pub fn generator(&self) -> nodeflake::Result<Generator> {
        Generator::builder()
            .clock(self.clock.clock())
            .node_id(self.node_id)
            .max_sequence(self.max_sequence)
            .build()
    }
}

#[derive(Debug, Clone)]
pub struct DecodeConfig {
    pub ids: Vec<SnowflakeId>,
    pub clock: ClockConfig,
}

impl TryFrom<DecodeArgs> for DecodeConfig {
    type Error = anyhow::Error;

    fn try_from(args: DecodeArgs) -> Result<Self, Self::Error> {
        let ids = args
            .ids
            .iter()
            .map(|raw| raw.trim().parse::<SnowflakeId>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            ids,
            clock: args.clock.try_into()?,
        })
    }
}
